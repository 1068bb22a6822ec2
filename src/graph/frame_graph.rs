//! The frame graph.
//!
//! # Lifecycle
//!
//! ```text
//! add_pass / import / present   (setup, Builder calls only)
//!            │
//!         compile()              cull, lifetimes, usages, render passes
//!            │
//!         execute()              per pass: devirtualize → run → destroy
//! ```
//!
//! A `FrameGraph` lives for a single frame. It cannot be recompiled or
//! executed twice; build a new one next frame.

use std::fmt;
use std::ops::Deref;

use crate::allocator::ResourceAllocator;
use crate::backend::{
    DriverApi, RenderTargetDescriptor, RenderTargetHandle, TargetAttachment, TextureHandle,
    MAX_COLOR_ATTACHMENTS,
};
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::types::{SubResourceDescriptor, TextureDescriptor, TextureFormat, TextureUsage};

use super::blackboard::Blackboard;
use super::builder::Builder;
use super::dependency_graph::{DependencyGraph, NodeId};
use super::handle::FrameGraphHandle;
use super::pass_node::{
    PassExecutor, PassId, PassKind, PassNode, RenderPassDescriptor, RenderTargetData,
    ATTACHMENT_COUNT,
};
use super::resource::{
    Backing, ImportedRenderTargetDescriptor, ResourceLifetime, TextureId, VirtualResource,
};
use super::resource_node::ResourceNode;
use super::resources::FrameGraphResources;

/// Indirection from a handle index to the resource and its active node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceSlot {
    /// Index into `resources`.
    pub rid: usize,
    /// Index of the active node in `resource_nodes`.
    pub nid: usize,
    /// Node parents are read from after a sub-resource write, until the next read.
    pub sid: Option<usize>,
    pub version: u32,
    /// Set once the slot was forwarded; handles to it never validate again.
    pub forwarded: bool,
}

#[derive(Debug, Clone, Copy)]
enum NodeRef {
    Pass(usize),
    Resource(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Building,
    Compiled,
    Executed,
}

/// A pass added to a [`FrameGraph`], with the data its setup produced.
///
/// Dereferences to the pass data, so handles written by the setup closure
/// can be used directly by later passes.
#[derive(Debug, Clone)]
pub struct FrameGraphPass<D> {
    id: PassId,
    data: D,
}

impl<D> FrameGraphPass<D> {
    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }
}

impl<D> Deref for FrameGraphPass<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.data
    }
}

/// Per-frame scheduler of passes and the resources they use.
///
/// # Example
///
/// ```ignore
/// let mut fg = FrameGraph::new();
/// let backbuffer = fg.import("backbuffer", desc, TextureUsage::COLOR_ATTACHMENT, swapchain);
///
/// #[derive(Clone, Default)]
/// struct Data { color: TextureId }
///
/// let pass = fg.add_pass::<Data, _, _>(
///     "main",
///     |builder, data| {
///         data.color = builder.write(backbuffer, TextureUsage::COLOR_ATTACHMENT);
///         builder.declare_render_pass("main", RenderPassDescriptor::new().with_color(0, data.color));
///     },
///     |resources, _data, driver| {
///         let info = resources.get_render_pass_info(0);
///         // record commands into info.target
///     },
/// );
/// fg.present(pass.color);
/// fg.compile();
/// fg.execute(&mut allocator, &mut driver)?;
/// ```
pub struct FrameGraph {
    graph: DependencyGraph,
    nodes: Vec<NodeRef>,
    slots: Vec<ResourceSlot>,
    resources: Vec<VirtualResource>,
    resource_nodes: Vec<ResourceNode>,
    passes: Vec<PassNode>,
    blackboard: Blackboard,
    state: State,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    /// Create an empty frame graph.
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
            nodes: Vec::new(),
            slots: Vec::new(),
            resources: Vec::new(),
            resource_nodes: Vec::new(),
            passes: Vec::new(),
            blackboard: Blackboard::new(),
            state: State::Building,
        }
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    /// Add a pass whose data starts from `D::default()`.
    ///
    /// `setup` runs immediately and declares the resources the pass uses.
    /// `execute` runs during [`execute`](Self::execute), unless the pass is
    /// culled, with a copy of the data `setup` produced.
    pub fn add_pass<D, S, E>(&mut self, name: &str, setup: S, execute: E) -> FrameGraphPass<D>
    where
        D: Default + Clone + 'static,
        S: FnOnce(&mut Builder<'_>, &mut D),
        E: FnOnce(&FrameGraphResources<'_>, &D, &mut dyn DriverApi) + 'static,
    {
        self.add_pass_with_data(name, D::default(), setup, execute)
    }

    /// Add a pass whose data starts from `data`.
    pub fn add_pass_with_data<D, S, E>(
        &mut self,
        name: &str,
        mut data: D,
        setup: S,
        execute: E,
    ) -> FrameGraphPass<D>
    where
        D: Clone + 'static,
        S: FnOnce(&mut Builder<'_>, &mut D),
        E: FnOnce(&FrameGraphResources<'_>, &D, &mut dyn DriverApi) + 'static,
    {
        self.assert_building();
        let id = self.push_pass(|node| PassNode::new_render(name, node));

        let mut builder = Builder::new(self, id);
        setup(&mut builder, &mut data);

        let captured = data.clone();
        let executor: PassExecutor = Box::new(
            move |resources: &FrameGraphResources<'_>, driver: &mut dyn DriverApi| {
                execute(resources, &captured, driver)
            },
        );
        if let PassKind::Render { executor: slot, .. } = &mut self.passes[id.index()].kind {
            *slot = Some(executor);
        }
        FrameGraphPass { id, data }
    }

    /// Add a pass that uses no resources and is never culled.
    pub fn add_trivial_side_effect_pass<E>(&mut self, name: &str, execute: E) -> PassId
    where
        E: FnOnce(&mut dyn DriverApi) + 'static,
    {
        self.add_pass::<(), _, _>(
            name,
            |builder, _| builder.side_effect(),
            move |_, _, driver| execute(driver),
        )
        .id()
    }

    /// Keep `input` and everything it depends on alive.
    pub fn present(&mut self, input: TextureId) -> PassId {
        self.assert_building();
        let id = self.push_pass(PassNode::new_present);
        self.read(id, input.handle(), TextureUsage::empty());
        self.side_effect(id);
        id
    }

    /// Import a texture owned by the caller.
    ///
    /// Passes may only request usages contained in `usage`. The graph never
    /// creates or destroys the texture; a pass writing it is never culled.
    pub fn import(
        &mut self,
        name: &str,
        descriptor: TextureDescriptor,
        usage: TextureUsage,
        texture: TextureHandle,
    ) -> TextureId {
        self.assert_building();
        let resource = VirtualResource::new_imported(name, descriptor, usage, texture);
        TextureId::from_handle(self.add_resource(resource, None))
    }

    /// Import a render target owned by the caller, such as the swap chain.
    ///
    /// Render passes with this resource as an attachment render directly
    /// into `target` with the imported viewport and clear color. The
    /// imported clear flags apply to the first such pass only.
    pub fn import_render_target(
        &mut self,
        name: &str,
        descriptor: ImportedRenderTargetDescriptor,
        target: RenderTargetHandle,
    ) -> TextureId {
        self.assert_building();
        let texture_descriptor = TextureDescriptor::new_2d(
            descriptor.viewport.width,
            descriptor.viewport.height,
            TextureFormat::default(),
        )
        .with_sample_count(descriptor.samples);
        let resource = VirtualResource::new(
            name,
            texture_descriptor,
            Backing::ImportedRenderTarget { target, descriptor },
        );
        TextureId::from_handle(self.add_resource(resource, None))
    }

    /// Make `replaced` refer to `resource` for the rest of the frame.
    ///
    /// Passes that already wrote or read `replaced` use the concrete texture
    /// of `resource` instead, and whatever keeps the current version of
    /// `resource` alive also keeps the producers of `replaced`. `replaced`
    /// can no longer be used.
    pub fn forward_resource(&mut self, resource: TextureId, replaced: TextureId) -> TextureId {
        self.assert_building();
        self.check_handle(resource.handle(), "forward_resource");
        self.check_handle(replaced.handle(), "forward_resource");
        assert_ne!(
            resource.handle().index(),
            replaced.handle().index(),
            "cannot forward \"{}\" onto itself",
            self.resource(resource.handle()).name
        );

        let source = self.slots[resource.handle().slot()];
        let replaced_nid = self.slots[replaced.handle().slot()].nid;
        let replaced_node = self.resource_nodes[replaced_nid].node;
        self.resource_nodes[source.nid].set_forward_edge(&mut self.graph, replaced_node);

        let slot = &mut self.slots[replaced.handle().slot()];
        slot.rid = source.rid;
        slot.forwarded = true;
        resource
    }

    /// Returns true if `handle` names the current version of a resource.
    pub fn is_valid(&self, handle: impl Into<FrameGraphHandle>) -> bool {
        let handle = handle.into();
        handle.is_initialized()
            && self
                .slots
                .get(handle.slot())
                .is_some_and(|slot| !slot.forwarded && slot.version == handle.version())
    }

    // ------------------------------------------------------------------------
    // Compile and execute
    // ------------------------------------------------------------------------

    /// Cull unused passes and resources, then resolve lifetimes, usages and
    /// render pass parameters.
    pub fn compile(&mut self) -> &mut Self {
        assert!(
            self.state == State::Building,
            "FrameGraph::compile() called twice"
        );

        self.graph.cull();

        for index in 0..self.passes.len() {
            let node = self.passes[index].node;
            if self.graph.is_culled(node) {
                continue;
            }
            let touched: Vec<FrameGraphHandle> = self
                .graph
                .incoming_edges(node)
                .iter()
                .map(|&edge| self.graph.edge(edge).from)
                .chain(
                    self.graph
                        .outgoing_edges(node)
                        .iter()
                        .map(|&edge| self.graph.edge(edge).to),
                )
                .filter_map(|n| match self.nodes[n.index()] {
                    NodeRef::Resource(r) => Some(self.resource_nodes[r].handle),
                    NodeRef::Pass(_) => None,
                })
                .collect();
            for handle in touched {
                self.register_resource(PassId::new(index as u32), handle);
            }
        }

        for node in &self.resource_nodes {
            let rid = self.slots[node.handle.slot()].rid;
            if self.resources[rid].refcount == 0 {
                continue;
            }
            let usage = node.resolve_usage(&self.graph);
            let mut current = Some(rid);
            while let Some(r) = current {
                self.resources[r].usage |= usage;
                current = self.resources[r].parent;
            }
        }

        let slots = &self.slots;
        for pass in &mut self.passes {
            if self.graph.is_culled(pass.node) {
                continue;
            }
            for target in pass.render_targets_mut() {
                target.resolve(
                    &self.graph,
                    &self.resource_nodes,
                    &mut self.resources,
                    |handle| slots[handle.slot()].rid,
                );
            }
        }

        for (rid, resource) in self.resources.iter_mut().enumerate() {
            if resource.descriptor.sample_count == 0 {
                resource.descriptor.sample_count = 1;
            }
            if let Some(lifetime) = resource.lifetime() {
                self.passes[lifetime.first.index()].devirtualize.push(rid);
                self.passes[lifetime.last.index()].destroy.push(rid);
            }
        }

        log::debug!(
            "FrameGraph compiled: {} passes ({} culled), {} resources ({} live)",
            self.passes.len(),
            self.passes
                .iter()
                .filter(|p| self.graph.is_culled(p.node))
                .count(),
            self.resources.len(),
            self.resources.iter().filter(|r| r.refcount > 0).count()
        );

        self.state = State::Compiled;
        self
    }

    /// Run every surviving pass in declaration order.
    ///
    /// Resources are created right before their first pass and destroyed
    /// right after their last one. If the allocator fails, every resource
    /// created so far is released and the error is returned.
    pub fn execute(
        &mut self,
        allocator: &mut dyn ResourceAllocator,
        driver: &mut dyn DriverApi,
    ) -> FrameGraphResult<()> {
        match self.state {
            State::Building => panic!("FrameGraph::execute() called before compile()"),
            State::Executed => panic!("FrameGraph::execute() called twice"),
            State::Compiled => {}
        }
        self.state = State::Executed;

        for index in 0..self.passes.len() {
            if self.graph.is_culled(self.passes[index].node) {
                continue;
            }
            if let Err(err) = self.execute_pass(index, allocator, driver) {
                log::warn!("FrameGraph: aborting frame: {err}");
                self.release_all(allocator, driver);
                return Err(err);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn pass_name(&self, pass: PassId) -> &str {
        &self.pass(pass).name
    }

    /// Returns true if `pass` was culled. Panics before [`compile`](Self::compile).
    pub fn is_culled(&self, pass: PassId) -> bool {
        assert!(
            self.state != State::Building,
            "culling is only known after compile()"
        );
        self.graph.is_culled(self.pass(pass).node)
    }

    /// Returns true if the dependency graph has no cycle.
    pub fn is_acyclic(&self) -> bool {
        self.graph.is_acyclic()
    }

    /// First and last pass using the resource, or `None` if it is unused.
    pub fn lifetime(&self, id: TextureId) -> Option<ResourceLifetime> {
        self.resource(id.handle()).lifetime()
    }

    pub fn descriptor(&self, id: TextureId) -> &TextureDescriptor {
        &self.resource(id.handle()).descriptor
    }

    pub fn sub_resource_descriptor(&self, id: TextureId) -> &SubResourceDescriptor {
        &self.resource(id.handle()).sub_descriptor
    }

    /// Union of the usages of the surviving edges. Empty before compile.
    pub fn usage(&self, id: TextureId) -> TextureUsage {
        self.resource(id.handle()).usage
    }

    pub fn resource_name(&self, id: TextureId) -> &str {
        &self.resource(id.handle()).name
    }

    pub fn is_imported(&self, id: TextureId) -> bool {
        self.resource(id.handle()).is_imported()
    }

    /// Dump the graph in graphviz DOT format. Culled nodes are darker.
    pub fn export_graphviz(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let compiled = self.state != State::Building;
        self.graph.export_graphviz(out, "frame graph", |node| {
            let culled = compiled && self.graph.is_culled(node);
            match self.nodes[node.index()] {
                NodeRef::Pass(index) => format!(
                    "label=\"{}\\nrefs: {}, seq: {}\", style=filled, fillcolor={}",
                    self.passes[index].name,
                    self.graph.ref_count(node),
                    index,
                    if culled { "darkorange4" } else { "darkorange" }
                ),
                NodeRef::Resource(index) => {
                    let resource_node = &self.resource_nodes[index];
                    let resource = self.resource(resource_node.handle);
                    let color = match (culled, resource.is_imported()) {
                        (true, _) => "skyblue4",
                        (false, true) => "lightcoral",
                        (false, false) => "skyblue",
                    };
                    format!(
                        "label=\"{}\\nrefs: {}, version: {}\", style=filled, fillcolor={}",
                        resource.name,
                        self.graph.ref_count(node),
                        resource_node.handle.version(),
                        color
                    )
                }
            }
        })
    }

    // ------------------------------------------------------------------------
    // Builder support
    // ------------------------------------------------------------------------

    pub(crate) fn pass(&self, pass: PassId) -> &PassNode {
        self.passes
            .get(pass.index())
            .unwrap_or_else(|| panic!("unknown pass {pass:?}"))
    }

    pub(crate) fn resource(&self, handle: FrameGraphHandle) -> &VirtualResource {
        assert!(
            handle.is_initialized() && handle.slot() < self.slots.len(),
            "unknown resource handle {handle:?}"
        );
        &self.resources[self.slots[handle.slot()].rid]
    }

    pub(crate) fn create_resource(
        &mut self,
        name: &str,
        descriptor: TextureDescriptor,
    ) -> FrameGraphHandle {
        self.add_resource(
            VirtualResource::new(name, descriptor, Backing::Transient),
            None,
        )
    }

    pub(crate) fn create_sub_resource(
        &mut self,
        parent: FrameGraphHandle,
        name: &str,
        sub_descriptor: SubResourceDescriptor,
    ) -> FrameGraphHandle {
        self.check_handle(parent, name);
        let rid = self.slots[parent.slot()].rid;
        assert!(
            self.resources[rid].imported_render_target().is_none(),
            "cannot create sub-resource \"{name}\" of imported render target \"{}\"",
            self.resources[rid].name
        );
        let resource =
            VirtualResource::new_sub_resource(rid, &self.resources[rid], name, sub_descriptor);
        self.add_resource(resource, Some(parent))
    }

    pub(crate) fn read(
        &mut self,
        pass: PassId,
        handle: FrameGraphHandle,
        usage: TextureUsage,
    ) -> FrameGraphHandle {
        let pass_name = &self.passes[pass.index()].name;
        self.check_handle(handle, pass_name);
        let slot = self.slots[handle.slot()];
        let resource = &self.resources[slot.rid];
        assert!(
            !self.resource_nodes[slot.nid].has_writer_pass(pass),
            "Pass \"{pass_name}\" already writes to \"{}\"",
            resource.name
        );
        resource.assert_connect(pass_name, usage);
        let is_sub_resource = resource.is_sub_resource();

        let pass_node = self.passes[pass.index()].node;
        self.resource_nodes[slot.nid].add_reader(&mut self.graph, pass, pass_node, usage);

        // Reads depend on the parent version the last sub-resource write started from.
        let parent_node = if is_sub_resource {
            self.resource_nodes[slot.nid].parent.map(|parent| {
                let parent_slot = self.slots[parent.slot()];
                parent_slot.sid.unwrap_or(parent_slot.nid)
            })
        } else {
            slot.sid
        };
        if let Some(parent_nid) = parent_node {
            let parent_node = self.resource_nodes[parent_nid].node;
            self.resource_nodes[slot.nid].set_parent_read_dependency(&mut self.graph, parent_node);
        }
        self.slots[handle.slot()].sid = None;
        handle
    }

    pub(crate) fn write(
        &mut self,
        pass: PassId,
        handle: FrameGraphHandle,
        usage: TextureUsage,
    ) -> FrameGraphHandle {
        let pass_name = &self.passes[pass.index()].name;
        self.check_handle(handle, pass_name);
        let slot = self.slots[handle.slot()];
        self.resources[slot.rid].assert_connect(pass_name, usage);
        let pass_node = self.passes[pass.index()].node;

        if self.resource_nodes[slot.nid].has_writer_pass(pass) {
            self.resource_nodes[slot.nid].set_writer(&mut self.graph, pass, pass_node, usage);
            return handle;
        }

        let nid = self.create_new_version(handle);
        self.resource_nodes[nid].set_writer(&mut self.graph, pass, pass_node, usage);

        if self.resources[slot.rid].is_sub_resource() {
            if let Some(parent) = self.resource_nodes[nid].parent {
                let parent_nid = self.create_new_version_for_sub_resource_if_needed(parent);
                let parent_node = self.resource_nodes[parent_nid].node;
                self.resource_nodes[nid].set_parent_write_dependency(&mut self.graph, parent_node);
            }
        }
        if self.resources[slot.rid].is_imported() {
            self.graph.make_target(pass_node);
        }
        self.resource_nodes[nid].handle
    }

    pub(crate) fn declare_render_pass(
        &mut self,
        pass: PassId,
        name: &str,
        descriptor: RenderPassDescriptor,
    ) -> u32 {
        let pass_name = &self.passes[pass.index()].name;
        assert!(
            !descriptor.attachments.is_empty(),
            "Pass \"{pass_name}\" declares render pass \"{name}\" without attachments"
        );
        let pass_node = self.passes[pass.index()].node;

        let mut incoming = [None; ATTACHMENT_COUNT];
        let mut outgoing = [None; ATTACHMENT_COUNT];
        for slot in 0..ATTACHMENT_COUNT {
            let Some(attachment) = descriptor.attachments.get(slot) else {
                continue;
            };
            let handle = attachment.handle();
            assert!(
                handle.is_initialized() && handle.slot() < self.slots.len(),
                "Pass \"{pass_name}\" declares an unknown attachment {handle:?} in render pass \"{name}\""
            );

            incoming[slot] = self
                .graph
                .incoming_edges(pass_node)
                .iter()
                .find_map(|&edge| match self.nodes[self.graph.edge(edge).from.index()] {
                    NodeRef::Resource(n) if self.resource_nodes[n].handle.index() == handle.index() => {
                        Some(n)
                    }
                    _ => None,
                });
            let active = self.slots[handle.slot()].nid;
            if self.resource_nodes[active].has_writer_pass(pass) {
                outgoing[slot] = Some(active);
            }

            assert!(
                incoming[slot].is_some() || outgoing[slot].is_some(),
                "Pass \"{pass_name}\" uses \"{}\" as an attachment of render pass \"{name}\" without reading or writing it",
                self.resource(handle).name
            );
        }

        match &mut self.passes[pass.index()].kind {
            PassKind::Render { render_targets, .. } => {
                render_targets.push(RenderTargetData::new(name, descriptor, incoming, outgoing));
                (render_targets.len() - 1) as u32
            }
            PassKind::Present => panic!("present passes cannot declare render passes"),
        }
    }

    pub(crate) fn side_effect(&mut self, pass: PassId) {
        let node = self.passes[pass.index()].node;
        self.graph.make_target(node);
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn assert_building(&self) {
        assert!(
            self.state == State::Building,
            "FrameGraph: passes and resources can only be added before compile()"
        );
    }

    fn check_handle(&self, handle: FrameGraphHandle, user: &str) {
        assert!(
            handle.is_initialized(),
            "\"{user}\" uses an uninitialized resource handle"
        );
        let Some(slot) = self.slots.get(handle.slot()) else {
            panic!("\"{user}\" uses unknown resource handle {handle:?}");
        };
        let name = &self.resources[slot.rid].name;
        assert!(
            !slot.forwarded,
            "\"{user}\" uses \"{name}\" ({handle:?}) after it was forwarded"
        );
        assert!(
            slot.version == handle.version(),
            "\"{user}\" uses stale handle {handle:?} to \"{name}\" (current version is {})",
            slot.version
        );
    }

    fn push_pass(&mut self, make: impl FnOnce(NodeId) -> PassNode) -> PassId {
        let node = self.graph.add_node();
        let index = self.passes.len();
        self.nodes.push(NodeRef::Pass(index));
        self.passes.push(make(node));
        PassId::new(index as u32)
    }

    fn add_resource(
        &mut self,
        resource: VirtualResource,
        parent: Option<FrameGraphHandle>,
    ) -> FrameGraphHandle {
        let handle = FrameGraphHandle::new(self.slots.len() as u32, 0);
        let rid = self.resources.len();
        self.resources.push(resource);
        let nid = self.add_resource_node(handle, parent);
        self.slots.push(ResourceSlot {
            rid,
            nid,
            sid: None,
            version: 0,
            forwarded: false,
        });
        handle
    }

    fn add_resource_node(
        &mut self,
        handle: FrameGraphHandle,
        parent: Option<FrameGraphHandle>,
    ) -> usize {
        let node = self.graph.add_node();
        let index = self.resource_nodes.len();
        self.nodes.push(NodeRef::Resource(index));
        self.resource_nodes
            .push(ResourceNode::new(node, handle, parent));
        index
    }

    fn create_new_version(&mut self, handle: FrameGraphHandle) -> usize {
        let parent = self.resource_nodes[self.slots[handle.slot()].nid].parent;
        let version = handle.version() + 1;
        let nid = self.add_resource_node(FrameGraphHandle::new(handle.index(), version), parent);
        let slot = &mut self.slots[handle.slot()];
        slot.version = version;
        slot.nid = nid;
        nid
    }

    /// A parent written through a sub-resource gets a new node, but keeps its
    /// version: handles to the parent stay valid. The previous node is kept
    /// in `sid` so the next read of the parent also depends on it.
    fn create_new_version_for_sub_resource_if_needed(&mut self, parent: FrameGraphHandle) -> usize {
        let slot = self.slots[parent.slot()];
        if slot.sid.is_none() {
            let current = &self.resource_nodes[slot.nid];
            let (handle, grandparent) = (current.handle, current.parent);
            let nid = self.add_resource_node(handle, grandparent);
            let slot = &mut self.slots[parent.slot()];
            slot.sid = Some(slot.nid);
            slot.nid = nid;
        }
        self.slots[parent.slot()].nid
    }

    fn register_resource(&mut self, pass: PassId, handle: FrameGraphHandle) {
        let mut current = Some(self.slots[handle.slot()].rid);
        while let Some(rid) = current {
            self.resources[rid].needed_by_pass(pass);
            current = self.resources[rid].parent;
        }
        self.passes[pass.index()].declared.insert(handle.index());
    }

    fn execute_pass(
        &mut self,
        index: usize,
        allocator: &mut dyn ResourceAllocator,
        driver: &mut dyn DriverApi,
    ) -> FrameGraphResult<()> {
        let id = PassId::new(index as u32);
        log::trace!("FrameGraph: executing pass \"{}\"", self.passes[index].name);

        for i in 0..self.passes[index].devirtualize.len() {
            let rid = self.passes[index].devirtualize[i];
            let parent_texture = self.resources[rid]
                .parent
                .and_then(|parent| self.resources[parent].resource.handle);
            if let Err(source) = self.resources[rid].devirtualize(parent_texture, allocator, driver) {
                return Err(FrameGraphError::AllocationFailed {
                    pass: self.passes[index].name.clone(),
                    resource: self.resources[rid].name.clone(),
                    source,
                });
            }
        }

        self.devirtualize_render_targets(index, allocator, driver)?;

        let executor = match &mut self.passes[index].kind {
            PassKind::Render { executor, .. } => executor.take(),
            PassKind::Present => None,
        };
        if let Some(executor) = executor {
            let resources = FrameGraphResources::new(self, id);
            executor(&resources, &mut *driver);
        }

        for target in self.passes[index].render_targets_mut() {
            if let Some(handle) = target.target.take() {
                if target.imported.is_none() {
                    allocator.destroy_render_target(driver, handle);
                }
            }
        }

        for i in 0..self.passes[index].destroy.len() {
            let rid = self.passes[index].destroy[i];
            self.resources[rid].destroy(allocator, driver);
        }
        Ok(())
    }

    fn devirtualize_render_targets(
        &mut self,
        index: usize,
        allocator: &mut dyn ResourceAllocator,
        driver: &mut dyn DriverApi,
    ) -> FrameGraphResult<()> {
        for t in 0..self.passes[index].render_targets().len() {
            let data = &self.passes[index].render_targets()[t];
            let target = match data.imported {
                Some(imported) => imported,
                None => {
                    let name = data.name.clone();
                    let descriptor = self.render_target_descriptor(data);
                    match allocator.create_render_target(driver, &name, &descriptor) {
                        Ok(target) => {
                            log::trace!("FrameGraph: created render target \"{name}\" -> {target:?}");
                            target
                        }
                        Err(source) => {
                            return Err(FrameGraphError::RenderTargetCreationFailed {
                                pass: self.passes[index].name.clone(),
                                target: name,
                                source,
                            })
                        }
                    }
                }
            };
            self.passes[index].render_targets_mut()[t].target = Some(target);
        }
        Ok(())
    }

    fn render_target_descriptor(&self, data: &RenderTargetData) -> RenderTargetDescriptor {
        let attachment = |slot: usize| {
            data.descriptor.attachments.get(slot).map(|id| {
                let resource = self.resource(id.handle());
                TargetAttachment {
                    texture: resource.resource.handle.unwrap_or_else(|| {
                        panic!(
                            "attachment \"{}\" of render pass \"{}\" has no texture",
                            resource.name, data.name
                        )
                    }),
                    level: resource.sub_descriptor.level,
                    layer: resource.sub_descriptor.layer,
                }
            })
        };
        RenderTargetDescriptor {
            attachments: data.target_flags,
            width: data.width,
            height: data.height,
            samples: data.params.samples,
            color: std::array::from_fn(&attachment),
            depth: attachment(MAX_COLOR_ATTACHMENTS),
            stencil: attachment(MAX_COLOR_ATTACHMENTS + 1),
        }
    }

    fn release_all(&mut self, allocator: &mut dyn ResourceAllocator, driver: &mut dyn DriverApi) {
        for pass in &mut self.passes {
            for target in pass.render_targets_mut() {
                if let Some(handle) = target.target.take() {
                    if target.imported.is_none() {
                        allocator.destroy_render_target(driver, handle);
                    }
                }
            }
        }
        for resource in self.resources.iter_mut().rev() {
            if resource.owns_texture() || resource.is_sub_resource() {
                resource.destroy(allocator, driver);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureFormat;

    fn desc() -> TextureDescriptor {
        TextureDescriptor::new_2d(64, 64, TextureFormat::Rgba8Unorm)
    }

    #[test]
    fn test_write_mints_new_version() {
        let mut fg = FrameGraph::new();
        let pass = fg.add_pass::<(TextureId, TextureId), _, _>(
            "p",
            |builder, data| {
                data.0 = builder.create("t", desc());
                data.1 = builder.write(data.0, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );

        let (created, written) = *pass.data();
        assert_eq!(created.handle().index(), written.handle().index());
        assert_eq!(written.handle().version(), 1);
        assert!(!fg.is_valid(created));
        assert!(fg.is_valid(written));
        assert_eq!(fg.resource_nodes.len(), 2);
    }

    #[test]
    fn test_second_write_in_same_pass_merges_usage() {
        let mut fg = FrameGraph::new();
        let pass = fg.add_pass::<(TextureId, TextureId), _, _>(
            "p",
            |builder, data| {
                let t = builder.create("t", desc());
                data.0 = builder.write(t, TextureUsage::COLOR_ATTACHMENT);
                data.1 = builder.write(data.0, TextureUsage::COPY_DST);
                builder.side_effect();
            },
            |_, _, _| {},
        );
        assert_eq!(pass.0, pass.1);
        fg.compile();
        assert_eq!(
            fg.usage(pass.1),
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::COPY_DST
        );
    }

    #[test]
    fn test_read_keeps_version() {
        let mut fg = FrameGraph::new();
        let producer = fg.add_pass::<TextureId, _, _>(
            "producer",
            |builder, data| {
                let t = builder.create("t", desc());
                *data = builder.write(t, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );
        let color = *producer;
        let consumer = fg.add_pass::<TextureId, _, _>(
            "consumer",
            |builder, data| *data = builder.read(color, TextureUsage::TEXTURE_BINDING),
            |_, _, _| {},
        );
        assert_eq!(*consumer, color);
        assert!(fg.is_valid(color));
    }

    #[test]
    fn test_sub_resource_write_adds_parent_node() {
        let mut fg = FrameGraph::new();
        let parent = fg.add_pass::<TextureId, _, _>(
            "init",
            |builder, data| {
                let t = builder.create("pyramid", desc().with_mip_levels(3));
                *data = builder.write(t, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );
        let pyramid = *parent;
        let nodes_before = fg.resource_nodes.len();

        fg.add_pass::<(), _, _>(
            "downsample",
            |builder, _| {
                let mip1 = builder.create_subresource(
                    pyramid,
                    "pyramid.mip1",
                    SubResourceDescriptor::level(1),
                );
                builder.write(mip1, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );

        // sub-resource v0 + v1, parent write node
        assert_eq!(fg.resource_nodes.len(), nodes_before + 3);
        let slot = fg.slots[pyramid.handle().slot()];
        assert!(slot.sid.is_some());
        assert!(fg.is_valid(pyramid));

        fg.present(pyramid);
        assert!(fg.slots[pyramid.handle().slot()].sid.is_none());
        assert!(fg.is_acyclic());
    }

    #[test]
    fn test_forward_resource_redirects_slot() {
        let mut fg = FrameGraph::new();
        let a = fg.add_pass::<TextureId, _, _>(
            "a",
            |builder, data| {
                let t = builder.create("a", desc());
                *data = builder.write(t, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );
        let b = fg.add_pass::<TextureId, _, _>(
            "b",
            |builder, data| {
                let t = builder.create("b", desc());
                *data = builder.write(t, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );

        let forwarded = fg.forward_resource(*b, *a);
        assert_eq!(forwarded, *b);
        assert!(!fg.is_valid(*a));
        assert!(fg.is_valid(*b));
        assert_eq!(fg.resource_name(*a), "b");
    }

    #[test]
    #[should_panic(expected = "called before compile()")]
    fn test_execute_requires_compile() {
        let mut fg = FrameGraph::new();
        let mut allocator = crate::allocator::CachingAllocator::new();
        let mut driver = crate::backend::DummyDriver::new();
        let _ = fg.execute(&mut allocator, &mut driver);
    }

    #[test]
    #[should_panic(expected = "only be added before compile()")]
    fn test_no_passes_after_compile() {
        let mut fg = FrameGraph::new();
        fg.compile();
        fg.add_trivial_side_effect_pass("late", |_| {});
    }
}
