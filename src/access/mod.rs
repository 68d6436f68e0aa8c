//! Access derivation and barrier synthesis.
//!
//! [`AccessGraph::analyze`] walks the frame's pass graph in declaration
//! order and derives, for every resource touch, an access record: owning
//! pass, access flags, pipeline stages, and image layout where applicable.
//! Records append to an ordered per-resource list keyed by the view-erased
//! origin name, seeded with the state the previous frame left the resource
//! in.
//!
//! A second walk over the completed lists synthesizes barriers between
//! consecutive records. Buffers skip read-after-read; images skip
//! transitions whose layout is unchanged. Each barrier attaches to the pass
//! owning the later record (a queue's owner is its parent render pass).
//! Swapchain resources receive one trailing present transition after their
//! last access, and their tracked state resets so the next frame starts
//! clean.
//!
//! Discovery order equals declaration order because passes carry no
//! cross-edges; every pass is an independent root and queues are always
//! children. Barrier synthesis depends on that ordering.

use std::collections::HashMap;

use crate::backend::{DescriptorKind, RenderPassAttachment, RenderPassDescriptor};
use crate::graph::{
    Attachment, AttachmentKind, Binding, CopyOp, CopyRegion, PassIndex, PassNode, RenderGraph,
};
use crate::resource::{AccessState, ResourceGraph};
use crate::types::{
    AccessFlags, ClearValue, Extent3d, ImageAspects, ImageLayout, PipelineStages, ResourceAccess,
    SyncScope,
};

/// One derived touch of a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessRecord {
    /// Pass owning the touch (a queue's owner is its parent render pass).
    pub pass: PassIndex,
    /// Derived stages and access flags.
    pub scope: SyncScope,
    /// Derived layout (`Undefined` for buffers).
    pub layout: ImageLayout,
}

/// A synthesized buffer memory barrier.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferBarrier {
    /// Origin resource name.
    pub resource: String,
    /// Scope of the earlier access.
    pub src: SyncScope,
    /// Scope of the later access.
    pub dst: SyncScope,
}

/// A synthesized image layout transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBarrier {
    /// Origin resource name.
    pub resource: String,
    /// Layout before the transition.
    pub old_layout: ImageLayout,
    /// Layout after the transition.
    pub new_layout: ImageLayout,
    /// Scope of the earlier access.
    pub src: SyncScope,
    /// Scope of the later access.
    pub dst: SyncScope,
    /// Subresource range of the transition.
    pub aspects: ImageAspects,
}

/// Derived render pass description, the memoization key for the backend
/// render pass object.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassInfo {
    /// Attachment formats, ops and layouts in declaration order.
    pub desc: RenderPassDescriptor,
    /// Clear values in attachment order.
    pub clears: Vec<ClearValue>,
}

/// Derived framebuffer description.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferInfo {
    /// Attachment resource names in declaration order.
    pub attachments: Vec<String>,
    /// Component-wise minimum of the attachment image extents.
    pub extent: Extent3d,
    /// Slice count shared by the attachments.
    pub layers: u32,
}

/// Ordered access history of one origin resource within a frame.
#[derive(Debug)]
struct AccessList {
    origin: String,
    is_buffer: bool,
    is_swapchain: bool,
    records: Vec<AccessRecord>,
}

/// Per-frame derived synchronization state.
#[derive(Debug, Default)]
pub struct AccessGraph {
    /// Access lists in first-touch order.
    lists: Vec<AccessList>,
    /// Origin name to list index.
    list_index: HashMap<String, usize>,
    /// Synthesized buffer barriers per pass.
    buffer_barriers: HashMap<PassIndex, Vec<BufferBarrier>>,
    /// Synthesized image barriers per pass.
    image_barriers: HashMap<PassIndex, Vec<ImageBarrier>>,
    /// Derived render pass descriptions per render pass.
    render_pass_infos: HashMap<PassIndex, RenderPassInfo>,
    /// Derived framebuffer descriptions per render pass.
    framebuffer_infos: HashMap<PassIndex, FramebufferInfo>,
    /// Trailing present transitions, recorded once at the end of the frame.
    present_barriers: Vec<ImageBarrier>,
}

impl AccessGraph {
    /// Create an empty access graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive access records and synthesize barriers for this frame's graph.
    ///
    /// Updates the tracked access state of every touched resource in
    /// `resources`; swapchain resources reset to "none" after their present
    /// transition.
    pub fn analyze(&mut self, graph: &RenderGraph, resources: &mut ResourceGraph) {
        for (index, pass) in graph.passes().iter().enumerate() {
            let pass_index = index as PassIndex;
            match pass {
                PassNode::Render(node) => {
                    self.discover_render_pass(pass_index, node.attachments(), resources);
                    for &queue_index in node.queues() {
                        let queue = graph.queue(queue_index);
                        for binding in queue.bindings() {
                            self.discover_binding(
                                pass_index,
                                binding,
                                PipelineStages::VERTEX_SHADER | PipelineStages::FRAGMENT_SHADER,
                                resources,
                            );
                        }
                    }
                }
                PassNode::Compute(node) => {
                    for binding in node.bindings() {
                        self.discover_binding(
                            pass_index,
                            binding,
                            PipelineStages::COMPUTE_SHADER,
                            resources,
                        );
                    }
                }
                PassNode::Copy(node) => {
                    for op in node.ops() {
                        self.discover_copy_op(pass_index, op, resources);
                    }
                }
            }
        }
        self.synthesize_barriers(resources);
    }

    /// Derive attachment accesses and the render pass / framebuffer
    /// descriptions.
    fn discover_render_pass(
        &mut self,
        pass: PassIndex,
        attachments: &[Attachment],
        resources: &mut ResourceGraph,
    ) {
        let mut desc = RenderPassDescriptor::default();
        let mut clears = Vec::with_capacity(attachments.len());
        let mut names = Vec::with_capacity(attachments.len());
        let mut extent: Option<Extent3d> = None;
        let mut layers = u32::MAX;

        for attachment in attachments {
            let name = attachment.resource.as_str();
            let (scope, layout) = derive_attachment(attachment);
            self.record(pass, name, scope, layout, resources);

            let format = match resources.format_of(name) {
                Some(format) => format,
                None => panic!("attachment '{name}' is not an image resource"),
            };
            desc.attachments.push(RenderPassAttachment {
                format,
                load_op: attachment.load_op,
                store_op: attachment.store_op,
                layout,
            });
            clears.push(attachment.clear);
            names.push(name.to_string());

            if let Some(attachment_extent) = resources.extent_of(name) {
                extent = Some(match extent {
                    Some(current) => current.min(attachment_extent),
                    None => attachment_extent,
                });
            }
            layers = layers.min(resources.layers_of(name));
        }

        self.render_pass_infos
            .insert(pass, RenderPassInfo { desc, clears });
        self.framebuffer_infos.insert(
            pass,
            FramebufferInfo {
                attachments: names,
                extent: extent.unwrap_or(Extent3d::new_2d(0, 0)),
                layers: if layers == u32::MAX { 1 } else { layers },
            },
        );
    }

    /// Derive the access of one shader binding.
    fn discover_binding(
        &mut self,
        pass: PassIndex,
        binding: &Binding,
        stages: PipelineStages,
        resources: &mut ResourceGraph,
    ) {
        // Samplers carry no synchronization state.
        if binding.kind == DescriptorKind::Sampler {
            return;
        }
        let name = binding.resource.as_str();
        let is_image = resources.format_of(name).is_some();
        let (access, layout) = match binding.access {
            ResourceAccess::Read => {
                if binding.kind == DescriptorKind::UniformBuffer {
                    (AccessFlags::UNIFORM_READ, ImageLayout::Undefined)
                } else if is_image {
                    let aspects = resources.aspects_of(name);
                    let layout = if aspects
                        .intersects(ImageAspects::DEPTH | ImageAspects::STENCIL)
                    {
                        ImageLayout::DepthStencilReadOnly
                    } else {
                        ImageLayout::ShaderReadOnly
                    };
                    (AccessFlags::SHADER_READ, layout)
                } else {
                    (AccessFlags::SHADER_READ, ImageLayout::Undefined)
                }
            }
            ResourceAccess::ReadWrite => {
                let layout = if is_image {
                    ImageLayout::General
                } else {
                    ImageLayout::Undefined
                };
                (AccessFlags::SHADER_READ | AccessFlags::SHADER_WRITE, layout)
            }
            ResourceAccess::Write => {
                let layout = if is_image {
                    ImageLayout::General
                } else {
                    ImageLayout::Undefined
                };
                (AccessFlags::SHADER_WRITE, layout)
            }
        };
        self.record(pass, name, SyncScope::new(stages, access), layout, resources);
    }

    /// Derive the accesses of one copy-pass operation.
    fn discover_copy_op(&mut self, pass: PassIndex, op: &CopyOp, resources: &mut ResourceGraph) {
        let transfer = PipelineStages::TRANSFER;
        match op {
            CopyOp::Pair(CopyRegion::Buffer { src, dst, .. }) => {
                self.record(
                    pass,
                    src,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_READ),
                    ImageLayout::Undefined,
                    resources,
                );
                self.record(
                    pass,
                    dst,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_WRITE),
                    ImageLayout::Undefined,
                    resources,
                );
            }
            CopyOp::Pair(CopyRegion::Image { src, dst, .. }) => {
                self.record(
                    pass,
                    src,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_READ),
                    ImageLayout::TransferSrc,
                    resources,
                );
                self.record(
                    pass,
                    dst,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_WRITE),
                    ImageLayout::TransferDst,
                    resources,
                );
            }
            CopyOp::Fill { dst, .. } => {
                self.record(
                    pass,
                    dst,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_WRITE),
                    ImageLayout::Undefined,
                    resources,
                );
            }
            CopyOp::Upload { staging, dst, .. } => {
                self.record(
                    pass,
                    staging,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_READ),
                    ImageLayout::Undefined,
                    resources,
                );
                self.record(
                    pass,
                    dst,
                    SyncScope::new(transfer, AccessFlags::TRANSFER_WRITE),
                    ImageLayout::Undefined,
                    resources,
                );
            }
        }
    }

    /// Append a record to the touched resource's origin list.
    fn record(
        &mut self,
        pass: PassIndex,
        name: &str,
        scope: SyncScope,
        layout: ImageLayout,
        resources: &ResourceGraph,
    ) {
        let origin = resources.origin_of(name).to_string();
        let list = match self.list_index.get(&origin) {
            Some(&index) => &mut self.lists[index],
            None => {
                let index = self.lists.len();
                self.lists.push(AccessList {
                    is_buffer: resources.format_of(&origin).is_none(),
                    is_swapchain: resources.is_swapchain(&origin),
                    origin: origin.clone(),
                    records: Vec::new(),
                });
                self.list_index.insert(origin, index);
                &mut self.lists[index]
            }
        };
        list.records.push(AccessRecord { pass, scope, layout });
    }

    /// Walk the completed access lists and emit barriers between
    /// consecutive records whose state differs.
    fn synthesize_barriers(&mut self, resources: &mut ResourceGraph) {
        for list in &self.lists {
            let carried = resources.access_state(&list.origin);
            let mut prev_scope = if carried.scope == SyncScope::default() {
                SyncScope::none()
            } else {
                carried.scope
            };
            let mut prev_layout = carried.layout;

            for record in &list.records {
                if list.is_buffer {
                    // Read-after-read needs no synchronization.
                    let both_read =
                        prev_scope.access.is_read_only() && record.scope.access.is_read_only();
                    if !both_read {
                        self.buffer_barriers
                            .entry(record.pass)
                            .or_default()
                            .push(BufferBarrier {
                                resource: list.origin.clone(),
                                src: prev_scope,
                                dst: record.scope,
                            });
                    }
                } else if prev_layout != record.layout {
                    let aspects = resources
                        .format_of(&list.origin)
                        .map(|format| format.aspects())
                        .unwrap_or(ImageAspects::COLOR);
                    self.image_barriers
                        .entry(record.pass)
                        .or_default()
                        .push(ImageBarrier {
                            resource: list.origin.clone(),
                            old_layout: prev_layout,
                            new_layout: record.layout,
                            src: prev_scope,
                            dst: record.scope,
                            aspects,
                        });
                }
                prev_scope = record.scope;
                prev_layout = record.layout;
            }

            if list.is_swapchain {
                // One terminal present transition per frame, then the
                // tracked state forgets this frame entirely.
                self.present_barriers.push(ImageBarrier {
                    resource: list.origin.clone(),
                    old_layout: prev_layout,
                    new_layout: ImageLayout::Present,
                    src: prev_scope,
                    dst: SyncScope::new(PipelineStages::BOTTOM_OF_PIPE, AccessFlags::empty()),
                    aspects: ImageAspects::COLOR,
                });
                resources.reset_access_state(&list.origin);
            } else {
                resources.set_access_state(
                    &list.origin,
                    AccessState {
                        scope: prev_scope,
                        layout: prev_layout,
                    },
                );
            }
        }
    }

    /// Ordered access records of a resource (resolved to its origin).
    pub fn accesses(&self, resources: &ResourceGraph, name: &str) -> &[AccessRecord] {
        let origin = resources.origin_of(name);
        match self.list_index.get(origin) {
            Some(&index) => &self.lists[index].records,
            None => &[],
        }
    }

    /// Buffer barriers to apply before a pass's commands.
    pub fn buffer_barriers(&self, pass: PassIndex) -> &[BufferBarrier] {
        self.buffer_barriers
            .get(&pass)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Image barriers to apply before a pass's commands.
    pub fn image_barriers(&self, pass: PassIndex) -> &[ImageBarrier] {
        self.image_barriers
            .get(&pass)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Derived render pass description of a render pass.
    pub fn render_pass_info(&self, pass: PassIndex) -> Option<&RenderPassInfo> {
        self.render_pass_infos.get(&pass)
    }

    /// Derived framebuffer description of a render pass.
    pub fn framebuffer_info(&self, pass: PassIndex) -> Option<&FramebufferInfo> {
        self.framebuffer_infos.get(&pass)
    }

    /// Trailing present transitions, recorded once after the last pass.
    pub fn present_barriers(&self) -> &[ImageBarrier] {
        &self.present_barriers
    }

    /// Drop all derived state; called at the end of every frame.
    pub fn clear(&mut self) {
        self.lists.clear();
        self.list_index.clear();
        self.buffer_barriers.clear();
        self.image_barriers.clear();
        self.render_pass_infos.clear();
        self.framebuffer_infos.clear();
        self.present_barriers.clear();
    }
}

/// Access flags, stages and layout of one attachment touch.
fn derive_attachment(attachment: &Attachment) -> (SyncScope, ImageLayout) {
    match attachment.kind {
        AttachmentKind::DepthStencil => (
            SyncScope::new(
                PipelineStages::LATE_FRAGMENT_TESTS,
                AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ),
            ImageLayout::DepthStencilAttachment,
        ),
        AttachmentKind::Color => (
            SyncScope::new(
                PipelineStages::COLOR_ATTACHMENT_OUTPUT,
                AccessFlags::COLOR_ATTACHMENT_WRITE,
            ),
            ImageLayout::ColorAttachment,
        ),
        AttachmentKind::Input => {
            if attachment.direction == ResourceAccess::Read {
                (
                    SyncScope::new(
                        PipelineStages::FRAGMENT_SHADER,
                        AccessFlags::INPUT_ATTACHMENT_READ,
                    ),
                    ImageLayout::ShaderReadOnly,
                )
            } else {
                // Promoted to a full write when the declared direction is
                // not pure read.
                (
                    SyncScope::new(
                        PipelineStages::FRAGMENT_SHADER,
                        AccessFlags::INPUT_ATTACHMENT_READ | AccessFlags::SHADER_WRITE,
                    ),
                    ImageLayout::General,
                )
            }
        }
        AttachmentKind::ShadingRate => {
            if attachment.direction == ResourceAccess::Read {
                (
                    SyncScope::new(
                        PipelineStages::FRAGMENT_SHADER,
                        AccessFlags::SHADING_RATE_READ,
                    ),
                    ImageLayout::ShadingRate,
                )
            } else {
                (
                    SyncScope::new(
                        PipelineStages::FRAGMENT_SHADER,
                        AccessFlags::SHADING_RATE_READ | AccessFlags::SHADER_WRITE,
                    ),
                    ImageLayout::General,
                )
            }
        }
    }
}
