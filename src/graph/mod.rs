//! Declarative per-frame graph of passes and queues.
//!
//! Application code redeclares the whole graph every frame through the
//! fluent builder API and the graph is dropped after encoding. Pass
//! registration dedups by name, so conditional code paths can re-issue a
//! declaration without creating duplicates.
//!
//! Nodes live in dense arenas (vertex = small integer, children = index
//! lists); execution order is strictly declaration order and no
//! cross-pass edges exist.

use std::collections::HashMap;

use crate::backend::{BufferDescriptor, BufferUsage, DescriptorKind};
use crate::resource::{Residency, ResourceGraph};
use crate::types::{ClearValue, Extent3d, LoadOp, ResourceAccess, StoreOp, Viewport};

/// Index of a pass in the frame graph.
pub type PassIndex = u32;

/// Index of a render queue in the frame graph.
pub type QueueIndex = u32;

/// Role of an attachment within a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Color render target.
    Color,
    /// Depth/stencil target.
    DepthStencil,
    /// Input attachment (read from a previous subpass or pass).
    Input,
    /// Shading-rate attachment.
    ShadingRate,
}

/// One declared attachment of a render pass.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Resource name.
    pub resource: String,
    /// Attachment role.
    pub kind: AttachmentKind,
    /// Load operation.
    pub load_op: LoadOp,
    /// Store operation.
    pub store_op: StoreOp,
    /// Clear value applied when `load_op` is `Clear`.
    pub clear: ClearValue,
    /// Declared direction of the touch.
    pub direction: ResourceAccess,
}

/// One declared resource binding of a queue or compute pass.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Resource name.
    pub resource: String,
    /// Binding name as it appears in shader metadata.
    pub binding: String,
    /// Kind of descriptor this binds as.
    pub kind: DescriptorKind,
    /// Declared direction of the touch.
    pub access: ResourceAccess,
}

/// A batch of draw calls sharing one camera, viewport and binding set.
///
/// Always a child of exactly one render pass, named `"<pass>/<queue>"`.
#[derive(Debug)]
pub struct RenderQueueNode {
    pub(crate) name: String,
    pub(crate) parent: PassIndex,
    pub(crate) phase: String,
    pub(crate) camera: Option<String>,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) bindings: Vec<Binding>,
}

impl RenderQueueNode {
    /// Full queue name, `"<pass>/<queue>"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the owning render pass.
    pub fn parent(&self) -> PassIndex {
        self.parent
    }

    /// Scene phase this queue draws.
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Name of the camera driving this queue, if any.
    pub fn camera(&self) -> Option<&str> {
        self.camera.as_deref()
    }

    /// Explicit viewport, if set.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Declared resource bindings.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

/// A render pass: ordered attachments plus child queues.
#[derive(Debug)]
pub struct RenderPassNode {
    pub(crate) name: String,
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) queues: Vec<QueueIndex>,
}

impl RenderPassNode {
    /// Pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered attachment list.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Child queue indices, in declaration order.
    pub fn queues(&self) -> &[QueueIndex] {
        &self.queues
    }
}

/// A compute pass: bound resources plus a dispatch size.
#[derive(Debug)]
pub struct ComputePassNode {
    pub(crate) name: String,
    pub(crate) program: String,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) dispatch: (u32, u32, u32),
}

impl ComputePassNode {
    /// Pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shader program id.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Declared resource bindings.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Work-group counts.
    pub fn dispatch(&self) -> (u32, u32, u32) {
        self.dispatch
    }
}

/// A region copied by a copy pass.
#[derive(Debug, Clone)]
pub enum CopyRegion {
    /// Buffer-to-buffer copy.
    Buffer {
        /// Source buffer name.
        src: String,
        /// Destination buffer name.
        dst: String,
        /// Byte offset into the source.
        src_offset: u64,
        /// Byte offset into the destination.
        dst_offset: u64,
        /// Size in bytes.
        size: u64,
    },
    /// Image-to-image copy.
    Image {
        /// Source image name.
        src: String,
        /// Destination image name.
        dst: String,
        /// Copied extent.
        extent: Extent3d,
    },
}

/// One recorded operation of a copy pass.
#[derive(Debug, Clone)]
pub enum CopyOp {
    /// Copy a declared region.
    Pair(CopyRegion),
    /// Fill a buffer range with a repeated value.
    Fill {
        /// Destination buffer name.
        dst: String,
        /// Byte offset.
        offset: u64,
        /// Size in bytes.
        size: u64,
        /// Fill value.
        value: u32,
    },
    /// Upload CPU bytes through a transient staging buffer.
    Upload {
        /// Name of the auto-registered staging buffer.
        staging: String,
        /// Bytes to upload.
        data: Vec<u8>,
        /// Destination buffer name.
        dst: String,
        /// Byte offset into the destination.
        offset: u64,
    },
}

/// A copy pass: an ordered list of transfer operations.
#[derive(Debug)]
pub struct CopyPassNode {
    pub(crate) name: String,
    pub(crate) ops: Vec<CopyOp>,
    pub(crate) staging_counter: u32,
}

impl CopyPassNode {
    /// Pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded transfer operations, in declaration order.
    pub fn ops(&self) -> &[CopyOp] {
        &self.ops
    }
}

/// One pass of the frame graph.
#[derive(Debug)]
pub enum PassNode {
    /// A render pass.
    Render(RenderPassNode),
    /// A compute pass.
    Compute(ComputePassNode),
    /// A copy pass.
    Copy(CopyPassNode),
}

impl PassNode {
    /// Pass name.
    pub fn name(&self) -> &str {
        match self {
            PassNode::Render(pass) => pass.name(),
            PassNode::Compute(pass) => pass.name(),
            PassNode::Copy(pass) => pass.name(),
        }
    }
}

/// The per-frame pass graph.
#[derive(Debug, Default)]
pub struct RenderGraph {
    /// Root passes, in declaration order.
    passes: Vec<PassNode>,
    /// Pass name to index.
    pass_names: HashMap<String, PassIndex>,
    /// Render queues (children of render passes).
    queues: Vec<RenderQueueNode>,
    /// Queue name to index.
    queue_names: HashMap<String, QueueIndex>,
}

impl RenderGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root passes in declaration order.
    pub fn passes(&self) -> &[PassNode] {
        &self.passes
    }

    /// A pass by index.
    pub fn pass(&self, index: PassIndex) -> &PassNode {
        &self.passes[index as usize]
    }

    /// A queue by index.
    pub fn queue(&self, index: QueueIndex) -> &RenderQueueNode {
        &self.queues[index as usize]
    }

    /// All render queues.
    pub fn queues(&self) -> &[RenderQueueNode] {
        &self.queues
    }

    /// Check if no passes are declared.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Register-or-return a render pass and open its builder.
    pub fn add_render_pass(&mut self, name: &str) -> RenderPassBuilder<'_> {
        let index = match self.pass_names.get(name) {
            Some(&index) => index,
            None => {
                let index = self.passes.len() as PassIndex;
                self.passes.push(PassNode::Render(RenderPassNode {
                    name: name.to_string(),
                    attachments: Vec::new(),
                    queues: Vec::new(),
                }));
                self.pass_names.insert(name.to_string(), index);
                index
            }
        };
        match self.passes[index as usize] {
            PassNode::Render(_) => RenderPassBuilder { graph: self, index },
            _ => panic!("pass '{name}' is already declared with a different kind"),
        }
    }

    /// Register-or-return a compute pass and open its builder.
    pub fn add_compute_pass(&mut self, name: &str) -> ComputePassBuilder<'_> {
        let index = match self.pass_names.get(name) {
            Some(&index) => index,
            None => {
                let index = self.passes.len() as PassIndex;
                self.passes.push(PassNode::Compute(ComputePassNode {
                    name: name.to_string(),
                    program: name.to_string(),
                    bindings: Vec::new(),
                    dispatch: (1, 1, 1),
                }));
                self.pass_names.insert(name.to_string(), index);
                index
            }
        };
        match self.passes[index as usize] {
            PassNode::Compute(_) => ComputePassBuilder { graph: self, index },
            _ => panic!("pass '{name}' is already declared with a different kind"),
        }
    }

    /// Register-or-return a copy pass and open its builder.
    pub fn add_copy_pass(&mut self, name: &str) -> CopyPassBuilder<'_> {
        let index = match self.pass_names.get(name) {
            Some(&index) => index,
            None => {
                let index = self.passes.len() as PassIndex;
                self.passes.push(PassNode::Copy(CopyPassNode {
                    name: name.to_string(),
                    ops: Vec::new(),
                    staging_counter: 0,
                }));
                self.pass_names.insert(name.to_string(), index);
                index
            }
        };
        match self.passes[index as usize] {
            PassNode::Copy(_) => CopyPassBuilder { graph: self, index },
            _ => panic!("pass '{name}' is already declared with a different kind"),
        }
    }

    /// Drop every pass and queue node for the next frame.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.pass_names.clear();
        self.queues.clear();
        self.queue_names.clear();
    }

    fn render_pass_mut(&mut self, index: PassIndex) -> &mut RenderPassNode {
        match &mut self.passes[index as usize] {
            PassNode::Render(pass) => pass,
            _ => unreachable!("builder index always points at a render pass"),
        }
    }

    fn compute_pass_mut(&mut self, index: PassIndex) -> &mut ComputePassNode {
        match &mut self.passes[index as usize] {
            PassNode::Compute(pass) => pass,
            _ => unreachable!("builder index always points at a compute pass"),
        }
    }

    fn copy_pass_mut(&mut self, index: PassIndex) -> &mut CopyPassNode {
        match &mut self.passes[index as usize] {
            PassNode::Copy(pass) => pass,
            _ => unreachable!("builder index always points at a copy pass"),
        }
    }
}

/// Fluent builder for a render pass.
pub struct RenderPassBuilder<'a> {
    graph: &'a mut RenderGraph,
    index: PassIndex,
}

impl<'a> RenderPassBuilder<'a> {
    /// Index of the pass being built.
    pub fn index(&self) -> PassIndex {
        self.index
    }

    fn push_attachment(self, attachment: Attachment) -> Self {
        self.graph
            .render_pass_mut(self.index)
            .attachments
            .push(attachment);
        self
    }

    /// Append a color attachment (written by the pass).
    pub fn add_color(
        self,
        resource: &str,
        load_op: LoadOp,
        store_op: StoreOp,
        clear: ClearValue,
    ) -> Self {
        self.push_attachment(Attachment {
            resource: resource.to_string(),
            kind: AttachmentKind::Color,
            load_op,
            store_op,
            clear,
            direction: ResourceAccess::Write,
        })
    }

    /// Append a depth/stencil attachment (written by the pass).
    pub fn add_depth_stencil(
        self,
        resource: &str,
        load_op: LoadOp,
        store_op: StoreOp,
        clear: ClearValue,
    ) -> Self {
        self.push_attachment(Attachment {
            resource: resource.to_string(),
            kind: AttachmentKind::DepthStencil,
            load_op,
            store_op,
            clear,
            direction: ResourceAccess::Write,
        })
    }

    /// Append an input attachment with an explicit direction.
    pub fn add_input(self, resource: &str, direction: ResourceAccess) -> Self {
        self.push_attachment(Attachment {
            resource: resource.to_string(),
            kind: AttachmentKind::Input,
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            clear: ClearValue::default(),
            direction,
        })
    }

    /// Append a shading-rate attachment (read by the pass).
    pub fn add_shading_rate(
        self,
        resource: &str,
        load_op: LoadOp,
        store_op: StoreOp,
        clear: ClearValue,
    ) -> Self {
        self.push_attachment(Attachment {
            resource: resource.to_string(),
            kind: AttachmentKind::ShadingRate,
            load_op,
            store_op,
            clear,
            direction: ResourceAccess::Read,
        })
    }

    /// Register-or-return a child render queue named `"<pass>/<queue>"`.
    pub fn add_queue(&mut self, name: &str) -> RenderQueueBuilder<'_> {
        let pass_name = self.graph.render_pass_mut(self.index).name.clone();
        let full_name = format!("{pass_name}/{name}");
        let queue_index = match self.graph.queue_names.get(&full_name) {
            Some(&index) => index,
            None => {
                let index = self.graph.queues.len() as QueueIndex;
                self.graph.queues.push(RenderQueueNode {
                    name: full_name.clone(),
                    parent: self.index,
                    phase: name.to_string(),
                    camera: None,
                    viewport: None,
                    bindings: Vec::new(),
                });
                self.graph.queue_names.insert(full_name, index);
                self.graph.render_pass_mut(self.index).queues.push(index);
                index
            }
        };
        RenderQueueBuilder {
            graph: &mut *self.graph,
            index: queue_index,
        }
    }
}

/// Fluent builder for a render queue.
pub struct RenderQueueBuilder<'a> {
    graph: &'a mut RenderGraph,
    index: QueueIndex,
}

impl<'a> RenderQueueBuilder<'a> {
    /// Index of the queue being built.
    pub fn index(&self) -> QueueIndex {
        self.index
    }

    fn node(&mut self) -> &mut RenderQueueNode {
        &mut self.graph.queues[self.index as usize]
    }

    /// Set the camera driving this queue.
    pub fn add_camera(mut self, camera: &str) -> Self {
        self.node().camera = Some(camera.to_string());
        self
    }

    /// Set the scene phase this queue draws (defaults to the queue name).
    pub fn set_phase(mut self, phase: &str) -> Self {
        self.node().phase = phase.to_string();
        self
    }

    /// Set an explicit viewport.
    pub fn set_viewport(mut self, viewport: Viewport) -> Self {
        self.node().viewport = Some(viewport);
        self
    }

    fn push_binding(mut self, binding: Binding) -> Self {
        self.node().bindings.push(binding);
        self
    }

    /// Bind a uniform buffer (read-only).
    pub fn add_uniform_buffer(self, resource: &str, binding: &str) -> Self {
        self.push_binding(Binding {
            resource: resource.to_string(),
            binding: binding.to_string(),
            kind: DescriptorKind::UniformBuffer,
            access: ResourceAccess::Read,
        })
    }

    /// Bind a sampled image (read-only).
    pub fn add_sampled_image(self, resource: &str, binding: &str) -> Self {
        self.push_binding(Binding {
            resource: resource.to_string(),
            binding: binding.to_string(),
            kind: DescriptorKind::SampledImage,
            access: ResourceAccess::Read,
        })
    }

    /// Bind a sampler.
    pub fn add_sampler(self, resource: &str, binding: &str) -> Self {
        self.push_binding(Binding {
            resource: resource.to_string(),
            binding: binding.to_string(),
            kind: DescriptorKind::Sampler,
            access: ResourceAccess::Read,
        })
    }
}

/// Fluent builder for a compute pass.
pub struct ComputePassBuilder<'a> {
    graph: &'a mut RenderGraph,
    index: PassIndex,
}

impl<'a> ComputePassBuilder<'a> {
    /// Index of the pass being built.
    pub fn index(&self) -> PassIndex {
        self.index
    }

    /// Set the shader program id (defaults to the pass name).
    pub fn set_program_name(self, program: &str) -> Self {
        self.graph.compute_pass_mut(self.index).program = program.to_string();
        self
    }

    /// Bind a resource with an explicit access direction.
    pub fn add_resource(self, resource: &str, binding: &str, access: ResourceAccess) -> Self {
        let kind = if access.writes() {
            DescriptorKind::StorageBuffer
        } else {
            DescriptorKind::UniformBuffer
        };
        self.add_resource_as(resource, binding, kind, access)
    }

    /// Bind a resource with an explicit descriptor kind and direction.
    pub fn add_resource_as(
        self,
        resource: &str,
        binding: &str,
        kind: DescriptorKind,
        access: ResourceAccess,
    ) -> Self {
        self.graph.compute_pass_mut(self.index).bindings.push(Binding {
            resource: resource.to_string(),
            binding: binding.to_string(),
            kind,
            access,
        });
        self
    }

    /// Set the work-group counts.
    pub fn set_dispatch(self, x: u32, y: u32, z: u32) -> Self {
        self.graph.compute_pass_mut(self.index).dispatch = (x, y, z);
        self
    }
}

/// Fluent builder for a copy pass.
pub struct CopyPassBuilder<'a> {
    graph: &'a mut RenderGraph,
    index: PassIndex,
}

impl<'a> CopyPassBuilder<'a> {
    /// Index of the pass being built.
    pub fn index(&self) -> PassIndex {
        self.index
    }

    /// Record a region copy.
    pub fn add_pair(self, region: CopyRegion) -> Self {
        self.graph.copy_pass_mut(self.index).ops.push(CopyOp::Pair(region));
        self
    }

    /// Record a buffer fill.
    pub fn fill(self, value: u32, size: u64, name: &str, offset: u64) -> Self {
        self.graph.copy_pass_mut(self.index).ops.push(CopyOp::Fill {
            dst: name.to_string(),
            offset,
            size,
            value,
        });
        self
    }

    /// Record a CPU-to-buffer upload through a transient staging buffer.
    ///
    /// The staging buffer is registered in the resource graph as
    /// `"<pass>/staging/<n>/<size>"` so that access analysis sees it before
    /// it is mounted. The payload size is part of the name: a grown payload
    /// lands in a fresh slot instead of reusing a smaller backing buffer,
    /// and stale slots are reaped like any other transient.
    pub fn upload_buffer(
        self,
        resources: &mut ResourceGraph,
        data: &[u8],
        name: &str,
        offset: u64,
    ) -> Self {
        let pass = self.graph.copy_pass_mut(self.index);
        let staging = format!(
            "{}/staging/{}/{}",
            pass.name,
            pass.staging_counter,
            data.len()
        );
        pass.staging_counter += 1;
        resources.add_buffer(
            &staging,
            BufferDescriptor::new(data.len() as u64, BufferUsage::COPY_SRC),
            Residency::Transient,
        );
        pass.ops.push(CopyOp::Upload {
            staging,
            data: data.to_vec(),
            dst: name.to_string(),
            offset,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceInfo;

    #[test]
    fn test_pass_dedup_by_name() {
        let mut graph = RenderGraph::new();
        let first = graph.add_render_pass("main").index();
        let second = graph.add_render_pass("main").index();
        assert_eq!(first, second);
        assert_eq!(graph.passes().len(), 1);
    }

    #[test]
    #[should_panic(expected = "different kind")]
    fn test_pass_kind_mismatch_panics() {
        let mut graph = RenderGraph::new();
        graph.add_render_pass("main");
        graph.add_compute_pass("main");
    }

    #[test]
    fn test_queue_naming_and_parent() {
        let mut graph = RenderGraph::new();
        let mut pass = graph.add_render_pass("main");
        let pass_index = pass.index();
        let queue_index = pass.add_queue("opaque").index();

        let queue = graph.queue(queue_index);
        assert_eq!(queue.name(), "main/opaque");
        assert_eq!(queue.parent(), pass_index);
        // Phase defaults to the short queue name.
        assert_eq!(queue.phase(), "opaque");
    }

    #[test]
    fn test_queue_dedup() {
        let mut graph = RenderGraph::new();
        let mut pass = graph.add_render_pass("main");
        let first = pass.add_queue("opaque").index();
        let second = pass.add_queue("opaque").index();
        assert_eq!(first, second);
        assert_eq!(graph.queues().len(), 1);
    }

    #[test]
    fn test_render_pass_fluent_chain() {
        let mut graph = RenderGraph::new();
        let mut pass = graph
            .add_render_pass("main")
            .add_color(
                "backbuffer",
                LoadOp::Clear,
                StoreOp::Store,
                ClearValue::Color([0.0; 4]),
            )
            .add_depth_stencil(
                "main/depth",
                LoadOp::Clear,
                StoreOp::Discard,
                ClearValue::DepthStencil {
                    depth: 1.0,
                    stencil: 0,
                },
            );
        pass.add_queue("opaque")
            .add_camera("camera/main")
            .add_uniform_buffer("scene/uniforms", "u_scene");

        let PassNode::Render(node) = graph.pass(0) else {
            panic!("expected a render pass");
        };
        assert_eq!(node.attachments().len(), 2);
        assert_eq!(node.attachments()[0].kind, AttachmentKind::Color);
        assert_eq!(node.attachments()[1].kind, AttachmentKind::DepthStencil);
        assert_eq!(node.queues().len(), 1);

        let queue = graph.queue(node.queues()[0]);
        assert_eq!(queue.camera(), Some("camera/main"));
        assert_eq!(queue.bindings().len(), 1);
        assert_eq!(queue.bindings()[0].kind, DescriptorKind::UniformBuffer);
    }

    #[test]
    fn test_upload_registers_staging_buffer() {
        let mut graph = RenderGraph::new();
        let mut resources = ResourceGraph::new();
        graph
            .add_copy_pass("uploads")
            .upload_buffer(&mut resources, &[0u8; 16], "mesh/vertices", 0)
            .upload_buffer(&mut resources, &[0u8; 32], "mesh/indices", 0);

        assert!(resources.contains("uploads/staging/0/16"));
        assert!(resources.contains("uploads/staging/1/32"));

        let PassNode::Copy(node) = graph.pass(0) else {
            panic!("expected a copy pass");
        };
        assert_eq!(node.ops().len(), 2);
    }

    #[test]
    fn test_staging_slot_tracks_payload_size() {
        let mut graph = RenderGraph::new();
        let mut resources = ResourceGraph::new();
        graph
            .add_copy_pass("uploads")
            .upload_buffer(&mut resources, &[0u8; 16], "mesh/vertices", 0);
        graph.clear();

        // Same slot, larger payload: must not reuse the 16-byte buffer.
        graph
            .add_copy_pass("uploads")
            .upload_buffer(&mut resources, &[0u8; 64], "mesh/vertices", 0);

        let PassNode::Copy(node) = graph.pass(0) else {
            panic!("expected a copy pass");
        };
        let CopyOp::Upload { staging, .. } = &node.ops()[0] else {
            panic!("expected an upload");
        };
        let ResourceInfo::Buffer(desc) = resources.node(staging).info() else {
            panic!("expected a staging buffer");
        };
        assert_eq!(desc.size, 64);
    }

    #[test]
    fn test_shading_rate_attachment_carries_ops() {
        let mut graph = RenderGraph::new();
        graph.add_render_pass("main").add_shading_rate(
            "vrs/map",
            LoadOp::Load,
            StoreOp::Discard,
            ClearValue::default(),
        );

        let PassNode::Render(node) = graph.pass(0) else {
            panic!("expected a render pass");
        };
        let attachment = &node.attachments()[0];
        assert_eq!(attachment.kind, AttachmentKind::ShadingRate);
        assert_eq!(attachment.load_op, LoadOp::Load);
        assert_eq!(attachment.store_op, StoreOp::Discard);
        assert_eq!(attachment.direction, ResourceAccess::Read);
    }

    #[test]
    fn test_clear_empties_graph() {
        let mut graph = RenderGraph::new();
        let mut pass = graph.add_render_pass("main");
        pass.add_queue("opaque");
        graph.add_copy_pass("uploads");
        assert!(!graph.is_empty());

        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.queues().is_empty());

        // Names can be re-registered after a clear.
        let index = graph.add_render_pass("main").index();
        assert_eq!(index, 0);
    }
}
