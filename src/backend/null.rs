//! No-op backend for testing and development.
//!
//! [`NullDevice`] hands out fresh ids without touching a GPU, and
//! [`NullRecorder`] records every command into an ordered op log so tests
//! can assert on recording order (barriers before commands, trailing
//! present transition, queue draw order).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FrameGraphError;
use crate::types::{
    BindingRate, ClearValue, Extent3d, ImageAspects, ImageLayout, Rect2d, SyncScope, Viewport,
};

use super::{
    BindGroupEntry, BufferDescriptor, BufferViewDescriptor, CommandRecorder,
    ComputePipelineDescriptor, DescriptorLayoutDescriptor, FramebufferDescriptor, GpuBindGroup,
    GpuBuffer, GpuBufferView, GpuDescriptorLayout, GpuFramebuffer, GpuImage, GpuImageView,
    GpuPipeline, GpuPipelineLayout, GpuRenderPass, GpuSampler, GraphicsPipelineDescriptor,
    ImageDescriptor, ImageViewDescriptor, PipelineLayoutDescriptor, RenderDevice,
    RenderPassDescriptor, SamplerDescriptor, SwapchainDescriptor,
};

/// Device that creates no GPU objects, only unique ids.
#[derive(Debug, Default)]
pub struct NullDevice {
    next_id: AtomicU64,
}

impl NullDevice {
    /// Create a new null device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Null"
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl RenderDevice for NullDevice {
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<GpuBuffer, FrameGraphError> {
        log::trace!(
            "NullDevice: creating buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        Ok(GpuBuffer::from_raw(self.next()))
    }

    fn create_image(&self, desc: &ImageDescriptor) -> Result<GpuImage, FrameGraphError> {
        log::trace!(
            "NullDevice: creating image {:?} ({}x{}, {:?})",
            desc.label,
            desc.extent.width,
            desc.extent.height,
            desc.format
        );
        Ok(GpuImage::from_raw(self.next()))
    }

    fn create_image_view(
        &self,
        image: GpuImage,
        desc: &ImageViewDescriptor,
    ) -> Result<GpuImageView, FrameGraphError> {
        log::trace!(
            "NullDevice: creating view of image {} ({:?})",
            image.id(),
            desc.aspects
        );
        Ok(GpuImageView::from_raw(self.next()))
    }

    fn create_buffer_view(
        &self,
        buffer: GpuBuffer,
        desc: &BufferViewDescriptor,
    ) -> Result<GpuBufferView, FrameGraphError> {
        log::trace!(
            "NullDevice: creating view of buffer {} (offset {}, size {})",
            buffer.id(),
            desc.offset,
            desc.size
        );
        Ok(GpuBufferView::from_raw(self.next()))
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<GpuSampler, FrameGraphError> {
        log::trace!("NullDevice: creating sampler {:?}", desc.label);
        Ok(GpuSampler::from_raw(self.next()))
    }

    fn swapchain_images(
        &self,
        desc: &SwapchainDescriptor,
    ) -> Result<Vec<GpuImage>, FrameGraphError> {
        log::trace!(
            "NullDevice: fetching {} swapchain images {:?}",
            desc.image_count,
            desc.label
        );
        Ok((0..desc.image_count)
            .map(|_| GpuImage::from_raw(self.next()))
            .collect())
    }

    fn create_render_pass(
        &self,
        desc: &RenderPassDescriptor,
    ) -> Result<GpuRenderPass, FrameGraphError> {
        log::trace!(
            "NullDevice: creating render pass ({} attachments)",
            desc.attachments.len()
        );
        Ok(GpuRenderPass::from_raw(self.next()))
    }

    fn create_framebuffer(
        &self,
        desc: &FramebufferDescriptor,
    ) -> Result<GpuFramebuffer, FrameGraphError> {
        log::trace!(
            "NullDevice: creating framebuffer {}x{} ({} attachments)",
            desc.extent.width,
            desc.extent.height,
            desc.attachments.len()
        );
        Ok(GpuFramebuffer::from_raw(self.next()))
    }

    fn create_descriptor_layout(
        &self,
        desc: &DescriptorLayoutDescriptor,
    ) -> Result<GpuDescriptorLayout, FrameGraphError> {
        log::trace!(
            "NullDevice: creating descriptor layout ({} bindings)",
            desc.bindings.len()
        );
        Ok(GpuDescriptorLayout::from_raw(self.next()))
    }

    fn create_pipeline_layout(
        &self,
        desc: &PipelineLayoutDescriptor,
    ) -> Result<GpuPipelineLayout, FrameGraphError> {
        log::trace!(
            "NullDevice: creating pipeline layout ({} sets)",
            desc.set_layouts.len()
        );
        Ok(GpuPipelineLayout::from_raw(self.next()))
    }

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDescriptor,
    ) -> Result<GpuPipeline, FrameGraphError> {
        log::trace!("NullDevice: creating graphics pipeline '{}'", desc.program);
        Ok(GpuPipeline::from_raw(self.next()))
    }

    fn create_compute_pipeline(
        &self,
        desc: &ComputePipelineDescriptor,
    ) -> Result<GpuPipeline, FrameGraphError> {
        log::trace!("NullDevice: creating compute pipeline '{}'", desc.program);
        Ok(GpuPipeline::from_raw(self.next()))
    }

    fn create_bind_group(
        &self,
        layout: GpuDescriptorLayout,
    ) -> Result<GpuBindGroup, FrameGraphError> {
        log::trace!("NullDevice: allocating bind group (layout {})", layout.id());
        Ok(GpuBindGroup::from_raw(self.next()))
    }

    fn update_bind_group(&self, group: GpuBindGroup, entries: &[BindGroupEntry]) {
        log::trace!(
            "NullDevice: updating bind group {} ({} entries)",
            group.id(),
            entries.len()
        );
    }

    fn destroy_buffer(&self, buffer: GpuBuffer) {
        log::trace!("NullDevice: destroying buffer {}", buffer.id());
    }

    fn destroy_image(&self, image: GpuImage) {
        log::trace!("NullDevice: destroying image {}", image.id());
    }

    fn destroy_image_view(&self, view: GpuImageView) {
        log::trace!("NullDevice: destroying image view {}", view.id());
    }

    fn destroy_buffer_view(&self, view: GpuBufferView) {
        log::trace!("NullDevice: destroying buffer view {}", view.id());
    }

    fn destroy_sampler(&self, sampler: GpuSampler) {
        log::trace!("NullDevice: destroying sampler {}", sampler.id());
    }
}

/// One recorded command, in recording order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    /// Buffer barrier appended.
    BufferBarrier {
        /// Buffer id.
        buffer: u64,
        /// Source scope.
        src: SyncScope,
        /// Destination scope.
        dst: SyncScope,
    },
    /// Image barrier appended.
    ImageBarrier {
        /// Image id.
        image: u64,
        /// Layout before the transition.
        old_layout: ImageLayout,
        /// Layout after the transition.
        new_layout: ImageLayout,
        /// Source scope.
        src: SyncScope,
        /// Destination scope.
        dst: SyncScope,
        /// Aspects covered.
        aspects: ImageAspects,
    },
    /// Pending barriers flushed.
    ApplyBarriers,
    /// Render pass begun.
    BeginRenderPass {
        /// Render pass id.
        render_pass: u64,
        /// Framebuffer id.
        framebuffer: u64,
        /// Render area.
        area: Rect2d,
    },
    /// Render pass ended.
    EndRenderPass,
    /// Viewport set.
    SetViewport(Viewport),
    /// Graphics pipeline bound.
    BindGraphicsPipeline(u64),
    /// Compute pipeline bound.
    BindComputePipeline(u64),
    /// Descriptor set bound.
    BindDescriptorSet {
        /// Update-frequency slot.
        rate: BindingRate,
        /// Bind group id.
        group: u64,
    },
    /// Constants pushed.
    PushConstants {
        /// Number of bytes pushed.
        size: usize,
    },
    /// Vertex buffer bound.
    BindVertexBuffer(u64),
    /// Index buffer bound.
    BindIndexBuffer(u64),
    /// Non-indexed draw issued.
    Draw {
        /// Vertex count.
        vertex_count: u32,
        /// Instance count.
        instance_count: u32,
    },
    /// Indexed draw issued.
    DrawIndexed {
        /// Index count.
        index_count: u32,
        /// Instance count.
        instance_count: u32,
    },
    /// Compute dispatch issued.
    Dispatch {
        /// Work groups in x.
        x: u32,
        /// Work groups in y.
        y: u32,
        /// Work groups in z.
        z: u32,
    },
    /// Buffer copy recorded.
    CopyBuffer {
        /// Source buffer id.
        src: u64,
        /// Destination buffer id.
        dst: u64,
        /// Copied size in bytes.
        size: u64,
    },
    /// Image copy recorded.
    CopyImage {
        /// Source image id.
        src: u64,
        /// Destination image id.
        dst: u64,
    },
    /// Buffer fill recorded.
    FillBuffer {
        /// Destination buffer id.
        dst: u64,
        /// Filled size in bytes.
        size: u64,
        /// Fill value.
        value: u32,
    },
    /// Staged upload recorded.
    UploadBuffer {
        /// Staging buffer id.
        staging: u64,
        /// Destination buffer id.
        dst: u64,
        /// Uploaded size in bytes.
        size: u64,
    },
}

impl RecordedOp {
    /// Check whether this op is part of a barrier batch.
    pub fn is_barrier(&self) -> bool {
        matches!(
            self,
            Self::BufferBarrier { .. } | Self::ImageBarrier { .. } | Self::ApplyBarriers
        )
    }
}

/// Recorder that logs commands instead of encoding them.
#[derive(Debug, Default)]
pub struct NullRecorder {
    ops: Vec<RecordedOp>,
}

impl NullRecorder {
    /// Create a new empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded ops in recording order.
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Drop all recorded ops.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl CommandRecorder for NullRecorder {
    fn append_buffer_barrier(&mut self, buffer: GpuBuffer, src: SyncScope, dst: SyncScope) {
        self.ops.push(RecordedOp::BufferBarrier {
            buffer: buffer.id(),
            src,
            dst,
        });
    }

    fn append_image_barrier(
        &mut self,
        image: GpuImage,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
        src: SyncScope,
        dst: SyncScope,
        aspects: ImageAspects,
    ) {
        self.ops.push(RecordedOp::ImageBarrier {
            image: image.id(),
            old_layout,
            new_layout,
            src,
            dst,
            aspects,
        });
    }

    fn apply_barriers(&mut self) {
        self.ops.push(RecordedOp::ApplyBarriers);
    }

    fn begin_render_pass(
        &mut self,
        render_pass: GpuRenderPass,
        framebuffer: GpuFramebuffer,
        area: Rect2d,
        _clears: &[ClearValue],
    ) {
        self.ops.push(RecordedOp::BeginRenderPass {
            render_pass: render_pass.id(),
            framebuffer: framebuffer.id(),
            area,
        });
    }

    fn end_render_pass(&mut self) {
        self.ops.push(RecordedOp::EndRenderPass);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.ops.push(RecordedOp::SetViewport(viewport));
    }

    fn bind_graphics_pipeline(&mut self, pipeline: GpuPipeline) {
        self.ops.push(RecordedOp::BindGraphicsPipeline(pipeline.id()));
    }

    fn bind_compute_pipeline(&mut self, pipeline: GpuPipeline) {
        self.ops.push(RecordedOp::BindComputePipeline(pipeline.id()));
    }

    fn bind_descriptor_set(&mut self, rate: BindingRate, group: GpuBindGroup) {
        self.ops.push(RecordedOp::BindDescriptorSet {
            rate,
            group: group.id(),
        });
    }

    fn push_constants(&mut self, data: &[u8]) {
        self.ops.push(RecordedOp::PushConstants { size: data.len() });
    }

    fn bind_vertex_buffer(&mut self, buffer: GpuBuffer) {
        self.ops.push(RecordedOp::BindVertexBuffer(buffer.id()));
    }

    fn bind_index_buffer(&mut self, buffer: GpuBuffer) {
        self.ops.push(RecordedOp::BindIndexBuffer(buffer.id()));
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.ops.push(RecordedOp::Draw {
            vertex_count,
            instance_count,
        });
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32) {
        self.ops.push(RecordedOp::DrawIndexed {
            index_count,
            instance_count,
        });
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.ops.push(RecordedOp::Dispatch { x, y, z });
    }

    fn copy_buffer(
        &mut self,
        src: GpuBuffer,
        dst: GpuBuffer,
        _src_offset: u64,
        _dst_offset: u64,
        size: u64,
    ) {
        self.ops.push(RecordedOp::CopyBuffer {
            src: src.id(),
            dst: dst.id(),
            size,
        });
    }

    fn copy_image(&mut self, src: GpuImage, dst: GpuImage, _extent: Extent3d) {
        self.ops.push(RecordedOp::CopyImage {
            src: src.id(),
            dst: dst.id(),
        });
    }

    fn fill_buffer(&mut self, dst: GpuBuffer, _offset: u64, size: u64, value: u32) {
        self.ops.push(RecordedOp::FillBuffer {
            dst: dst.id(),
            size,
            value,
        });
    }

    fn upload_buffer(&mut self, staging: GpuBuffer, data: &[u8], dst: GpuBuffer, _offset: u64) {
        self.ops.push(RecordedOp::UploadBuffer {
            staging: staging.id(),
            dst: dst.id(),
            size: data.len() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_hands_out_unique_ids() {
        let device = NullDevice::new();
        let a = device
            .create_buffer(&BufferDescriptor::new(64, super::super::BufferUsage::UNIFORM))
            .unwrap();
        let b = device
            .create_buffer(&BufferDescriptor::new(64, super::super::BufferUsage::UNIFORM))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_recorder_keeps_order() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();

        let buffer = device
            .create_buffer(&BufferDescriptor::new(64, super::super::BufferUsage::UNIFORM))
            .unwrap();
        recorder.append_buffer_barrier(buffer, SyncScope::none(), SyncScope::none());
        recorder.apply_barriers();
        recorder.draw(3, 1);

        let ops = recorder.ops();
        assert_eq!(ops.len(), 3);
        assert!(ops[0].is_barrier());
        assert_eq!(ops[1], RecordedOp::ApplyBarriers);
        assert_eq!(
            ops[2],
            RecordedOp::Draw {
                vertex_count: 3,
                instance_count: 1
            }
        );
    }

    #[test]
    fn test_image_barrier_records_scopes() {
        use crate::types::{AccessFlags, Format, PipelineStages};

        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let image = device
            .create_image(&ImageDescriptor::new_2d(
                4,
                4,
                Format::Rgba8Unorm,
                super::super::ImageUsage::COLOR_ATTACHMENT,
            ))
            .unwrap();

        let src = SyncScope::none();
        let dst = SyncScope::new(
            PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            AccessFlags::COLOR_ATTACHMENT_WRITE,
        );
        recorder.append_image_barrier(
            image,
            ImageLayout::Undefined,
            ImageLayout::ColorAttachment,
            src,
            dst,
            ImageAspects::COLOR,
        );

        assert_eq!(
            recorder.ops()[0],
            RecordedOp::ImageBarrier {
                image: image.id(),
                old_layout: ImageLayout::Undefined,
                new_layout: ImageLayout::ColorAttachment,
                src,
                dst,
                aspects: ImageAspects::COLOR,
            }
        );
    }

    #[test]
    fn test_swapchain_image_count() {
        let device = NullDevice::new();
        let images = device
            .swapchain_images(&SwapchainDescriptor {
                label: Some("swapchain".into()),
                extent: crate::types::Extent3d::new_2d(1920, 1080),
                format: crate::types::Format::Bgra8Unorm,
                image_count: 3,
            })
            .unwrap();
        assert_eq!(images.len(), 3);
    }
}
