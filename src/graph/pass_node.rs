//! Pass nodes and render pass declarations.

use std::collections::BTreeSet;

use crate::backend::{DriverApi, RenderTargetHandle, MAX_COLOR_ATTACHMENTS};
use crate::types::{ClearColor, TargetBufferFlags, TextureUsage, Viewport};

use super::dependency_graph::{DependencyGraph, NodeId};
use super::handle::FrameGraphHandle;
use super::resource::{TextureId, VirtualResource};
use super::resource_node::ResourceNode;
use super::resources::FrameGraphResources;

/// Color attachments, then depth, then stencil.
pub(crate) const ATTACHMENT_COUNT: usize = MAX_COLOR_ATTACHMENTS + 2;
const DEPTH_SLOT: usize = MAX_COLOR_ATTACHMENTS;
const STENCIL_SLOT: usize = MAX_COLOR_ATTACHMENTS + 1;

/// Handle to a pass in a [`FrameGraph`](super::FrameGraph).
///
/// Pass ids grow in declaration order, which is also execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u32);

impl PassId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the pass in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Attachments of a render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPassAttachments {
    pub color: [Option<TextureId>; MAX_COLOR_ATTACHMENTS],
    pub depth: Option<TextureId>,
    pub stencil: Option<TextureId>,
}

impl RenderPassAttachments {
    pub(crate) fn get(&self, slot: usize) -> Option<TextureId> {
        match slot {
            DEPTH_SLOT => self.depth,
            STENCIL_SLOT => self.stencil,
            color => self.color[color],
        }
    }

    /// Returns true if no attachment is set.
    pub fn is_empty(&self) -> bool {
        (0..ATTACHMENT_COUNT).all(|slot| self.get(slot).is_none())
    }
}

fn slot_flag(slot: usize) -> TargetBufferFlags {
    match slot {
        DEPTH_SLOT => TargetBufferFlags::DEPTH,
        STENCIL_SLOT => TargetBufferFlags::STENCIL,
        color => TargetBufferFlags::color(color),
    }
}

/// Describes the render target a pass draws into.
///
/// Declaring a render pass does not access its attachments: the pass must
/// read or write each of them through the [`Builder`](super::Builder) first.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDescriptor {
    pub attachments: RenderPassAttachments,
    /// Leave empty to cover the largest attachment.
    pub viewport: Viewport,
    pub clear_color: ClearColor,
    pub samples: u32,
    pub clear_flags: TargetBufferFlags,
}

impl Default for RenderPassDescriptor {
    fn default() -> Self {
        Self {
            attachments: RenderPassAttachments::default(),
            viewport: Viewport::default(),
            clear_color: ClearColor::default(),
            samples: 1,
            clear_flags: TargetBufferFlags::empty(),
        }
    }
}

impl RenderPassDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, index: usize, texture: TextureId) -> Self {
        assert!(
            index < MAX_COLOR_ATTACHMENTS,
            "Color attachment index {index} out of range"
        );
        self.attachments.color[index] = Some(texture);
        self
    }

    pub fn with_depth(mut self, texture: TextureId) -> Self {
        self.attachments.depth = Some(texture);
        self
    }

    pub fn with_stencil(mut self, texture: TextureId) -> Self {
        self.attachments.stencil = Some(texture);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_clear(mut self, flags: TargetBufferFlags, color: ClearColor) -> Self {
        self.clear_flags = flags;
        self.clear_color = color;
        self
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }
}

/// Load/store behavior of a render pass, per buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPassFlags {
    /// Buffers cleared at the start of the pass.
    pub clear: TargetBufferFlags,
    /// Buffers whose previous contents need not be loaded.
    pub discard_start: TargetBufferFlags,
    /// Buffers whose contents need not be stored.
    pub discard_end: TargetBufferFlags,
}

/// Parameters resolved for a render pass at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderPassParams {
    pub flags: RenderPassFlags,
    pub viewport: Viewport,
    pub clear_color: ClearColor,
    pub samples: u32,
    /// Depth/stencil buffers the pass only reads.
    pub read_only_depth_stencil: TargetBufferFlags,
}

/// What a pass executor gets for one of its render passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassInfo {
    pub target: RenderTargetHandle,
    pub params: RenderPassParams,
}

#[derive(Debug)]
pub(crate) struct RenderTargetData {
    pub name: String,
    pub descriptor: RenderPassDescriptor,
    /// Resource node each attachment is read from, if any.
    pub incoming: [Option<usize>; ATTACHMENT_COUNT],
    /// Resource node each attachment is written to, if any.
    pub outgoing: [Option<usize>; ATTACHMENT_COUNT],
    pub target_flags: TargetBufferFlags,
    pub width: u32,
    pub height: u32,
    pub params: RenderPassParams,
    pub imported: Option<RenderTargetHandle>,
    pub target: Option<RenderTargetHandle>,
}

impl RenderTargetData {
    pub fn new(
        name: &str,
        descriptor: RenderPassDescriptor,
        incoming: [Option<usize>; ATTACHMENT_COUNT],
        outgoing: [Option<usize>; ATTACHMENT_COUNT],
    ) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            incoming,
            outgoing,
            target_flags: TargetBufferFlags::empty(),
            width: 0,
            height: 0,
            params: RenderPassParams::default(),
            imported: None,
            target: None,
        }
    }

    /// Compute discard flags, viewport and samples of the render pass.
    ///
    /// `resource_of` maps an attachment handle to its resource index.
    pub fn resolve(
        &mut self,
        graph: &DependencyGraph,
        nodes: &[ResourceNode],
        resources: &mut [VirtualResource],
        resource_of: impl Fn(FrameGraphHandle) -> usize,
    ) {
        let mut flags = RenderPassFlags::default();
        let mut read_only = TargetBufferFlags::empty();
        let mut imported = None;
        self.target_flags = TargetBufferFlags::empty();
        self.width = 0;
        self.height = 0;

        for slot in 0..ATTACHMENT_COUNT {
            let Some(attachment) = self.descriptor.attachments.get(slot) else {
                continue;
            };
            let target = slot_flag(slot);
            self.target_flags |= target;

            let written_before = self.incoming[slot]
                .is_some_and(|node| nodes[node].has_active_writers(graph));
            if !written_before {
                flags.discard_start |= target;
            }
            match self.outgoing[slot] {
                Some(node) if !nodes[node].has_active_readers(graph) => {
                    flags.discard_end |= target;
                }
                Some(_) => {}
                None if slot >= DEPTH_SLOT => read_only |= target,
                None => {}
            }

            let rid = resource_of(attachment.handle());
            let resource = &mut resources[rid];
            if imported.is_none() && resource.imported_render_target().is_some() {
                imported = Some(rid);
            }
            if resource.descriptor.sample_count == 0
                && !resource.usage.contains(TextureUsage::TEXTURE_BINDING)
            {
                resource.descriptor.sample_count = self.descriptor.samples;
            }
            self.width = self.width.max(resource.descriptor.size.width);
            self.height = self.height.max(resource.descriptor.size.height);
        }

        flags.clear = self.descriptor.clear_flags & self.target_flags;
        flags.discard_start |= flags.clear;

        let mut params = RenderPassParams {
            flags,
            viewport: if self.descriptor.viewport.is_empty() {
                Viewport::from_size(self.width, self.height)
            } else {
                self.descriptor.viewport
            },
            clear_color: self.descriptor.clear_color,
            samples: self.descriptor.samples,
            read_only_depth_stencil: read_only,
        };

        self.imported = None;
        if let Some(rid) = imported {
            if let Some((target, descriptor)) = resources[rid].imported_render_target() {
                params.flags.discard_start &= !descriptor.keep_override_start;
                params.flags.discard_end &= !descriptor.keep_override_end;
                params.flags.clear |= descriptor.clear_flags;
                params.flags.discard_start |= descriptor.clear_flags;
                params.viewport = descriptor.viewport;
                params.clear_color = descriptor.clear_color;
                params.samples = descriptor.samples;
                self.width = descriptor.viewport.width;
                self.height = descriptor.viewport.height;
                self.imported = Some(target);
            }
            resources[rid].take_imported_clear_flags();
        }

        self.params = params;
    }
}

/// Callback run when a pass executes.
pub(crate) type PassExecutor = Box<dyn FnOnce(&FrameGraphResources<'_>, &mut dyn DriverApi)>;

pub(crate) enum PassKind {
    /// A pass with user code and optional render passes.
    Render {
        render_targets: Vec<RenderTargetData>,
        executor: Option<PassExecutor>,
    },
    /// Terminal pass keeping a resource alive; runs nothing.
    Present,
}

pub(crate) struct PassNode {
    pub name: String,
    pub node: NodeId,
    pub kind: PassKind,
    /// Slot indices of every resource the pass touches.
    pub declared: BTreeSet<u32>,
    /// Resources devirtualized right before the pass runs.
    pub devirtualize: Vec<usize>,
    /// Resources destroyed right after the pass runs.
    pub destroy: Vec<usize>,
}

impl PassNode {
    pub fn new_render(name: &str, node: NodeId) -> Self {
        Self::new(
            name,
            node,
            PassKind::Render {
                render_targets: Vec::new(),
                executor: None,
            },
        )
    }

    pub fn new_present(node: NodeId) -> Self {
        Self::new("Present", node, PassKind::Present)
    }

    fn new(name: &str, node: NodeId, kind: PassKind) -> Self {
        Self {
            name: name.to_string(),
            node,
            kind,
            declared: BTreeSet::new(),
            devirtualize: Vec::new(),
            destroy: Vec::new(),
        }
    }

    pub fn render_targets(&self) -> &[RenderTargetData] {
        match &self.kind {
            PassKind::Render { render_targets, .. } => render_targets,
            PassKind::Present => &[],
        }
    }

    pub fn render_targets_mut(&mut self) -> &mut [RenderTargetData] {
        match &mut self.kind {
            PassKind::Render { render_targets, .. } => render_targets,
            PassKind::Present => &mut [],
        }
    }

    pub fn is_declared(&self, handle: FrameGraphHandle) -> bool {
        self.declared.contains(&handle.index())
    }
}
