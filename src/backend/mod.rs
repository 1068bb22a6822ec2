//! Backend abstraction layer
//!
//! Provides the driver trait the frame graph devirtualizes resources through,
//! plus a dummy driver for tests and headless tools.

pub mod dummy;
pub mod traits;

pub use dummy::{DriverCommand, DummyDriver};
pub use traits::*;
