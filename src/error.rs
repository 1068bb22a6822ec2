//! Frame graph error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced by [`FrameGraph::execute`](crate::FrameGraph::execute).
///
/// Structural mistakes (stale handles, undeclared accesses, ...) are not
/// represented here: they panic while the frame is being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameGraphError {
    /// The allocator could not provide a texture for a resource.
    #[error("pass \"{pass}\": failed to allocate \"{resource}\": {source}")]
    AllocationFailed {
        pass: String,
        resource: String,
        #[source]
        source: BackendError,
    },
    /// The allocator could not create a render target for a render pass.
    #[error("pass \"{pass}\": failed to create render target \"{target}\": {source}")]
    RenderTargetCreationFailed {
        pass: String,
        target: String,
        #[source]
        source: BackendError,
    },
}

/// Result type for frame graph execution.
pub type FrameGraphResult<T> = Result<T, FrameGraphError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = FrameGraphError::AllocationFailed {
            pass: "gbuffer".to_string(),
            resource: "albedo".to_string(),
            source: BackendError::OutOfMemory,
        };
        assert_eq!(
            err.to_string(),
            "pass \"gbuffer\": failed to allocate \"albedo\": Out of memory"
        );
        assert_eq!(err.source().unwrap().to_string(), "Out of memory");
    }
}
