//! GPU backend abstraction layer.
//!
//! The frame graph never talks to a graphics API directly. Object creation
//! goes through the [`RenderDevice`] trait and command recording through the
//! [`CommandRecorder`] trait; a real renderer implements both on top of its
//! graphics API of choice.
//!
//! The built-in [`NullDevice`]/[`NullRecorder`] pair performs no GPU work.
//! The recorder keeps an ordered log of every operation, which the test
//! suite uses to verify barrier and encode ordering.

mod descriptors;
mod null;

pub use descriptors::{
    BindGroupEntry, BoundResource, BufferDescriptor, BufferUsage, BufferViewDescriptor,
    ComputePipelineDescriptor, DescriptorBinding, DescriptorKind, DescriptorLayoutDescriptor,
    FilterMode, FramebufferDescriptor, GraphicsPipelineDescriptor, ImageDescriptor, ImageUsage,
    ImageViewDescriptor, PipelineLayoutDescriptor, RenderPassAttachment, RenderPassDescriptor,
    SamplerDescriptor, SwapchainDescriptor,
};
pub use null::{NullDevice, NullRecorder, RecordedOp};

use crate::error::FrameGraphError;
use crate::types::{
    BindingRate, ClearValue, Extent3d, ImageAspects, ImageLayout, Rect2d, SyncScope, Viewport,
};

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend-assigned id.
            pub fn from_raw(id: u64) -> Self {
                Self(id)
            }

            /// The backend-assigned id of this object.
            pub fn id(self) -> u64 {
                self.0
            }
        }
    };
}

gpu_handle!(
    /// Handle to a GPU buffer.
    GpuBuffer
);
gpu_handle!(
    /// Handle to a GPU image.
    GpuImage
);
gpu_handle!(
    /// Handle to a GPU image view.
    GpuImageView
);
gpu_handle!(
    /// Handle to a GPU buffer view.
    GpuBufferView
);
gpu_handle!(
    /// Handle to a GPU sampler.
    GpuSampler
);
gpu_handle!(
    /// Handle to a baked render pass object.
    GpuRenderPass
);
gpu_handle!(
    /// Handle to a baked framebuffer object.
    GpuFramebuffer
);
gpu_handle!(
    /// Handle to a descriptor-set layout.
    GpuDescriptorLayout
);
gpu_handle!(
    /// Handle to a pipeline layout.
    GpuPipelineLayout
);
gpu_handle!(
    /// Handle to a graphics or compute pipeline.
    GpuPipeline
);
gpu_handle!(
    /// Handle to a descriptor set (bind group).
    GpuBindGroup
);

/// Object-creation interface of the graphics device.
///
/// Creation failures are fatal for the frame: the scheduler propagates them
/// without retrying (there is no partial-frame rollback).
pub trait RenderDevice {
    /// Create a buffer.
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<GpuBuffer, FrameGraphError>;
    /// Create an image.
    fn create_image(&self, desc: &ImageDescriptor) -> Result<GpuImage, FrameGraphError>;
    /// Create a view over an image.
    fn create_image_view(
        &self,
        image: GpuImage,
        desc: &ImageViewDescriptor,
    ) -> Result<GpuImageView, FrameGraphError>;
    /// Create a view over a buffer range.
    fn create_buffer_view(
        &self,
        buffer: GpuBuffer,
        desc: &BufferViewDescriptor,
    ) -> Result<GpuBufferView, FrameGraphError>;
    /// Create a sampler.
    fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<GpuSampler, FrameGraphError>;
    /// Fetch the presentable images of a swapchain.
    fn swapchain_images(
        &self,
        desc: &SwapchainDescriptor,
    ) -> Result<Vec<GpuImage>, FrameGraphError>;
    /// Create a render pass object.
    fn create_render_pass(
        &self,
        desc: &RenderPassDescriptor,
    ) -> Result<GpuRenderPass, FrameGraphError>;
    /// Create a framebuffer object.
    fn create_framebuffer(
        &self,
        desc: &FramebufferDescriptor,
    ) -> Result<GpuFramebuffer, FrameGraphError>;
    /// Create a descriptor-set layout.
    fn create_descriptor_layout(
        &self,
        desc: &DescriptorLayoutDescriptor,
    ) -> Result<GpuDescriptorLayout, FrameGraphError>;
    /// Create a pipeline layout.
    fn create_pipeline_layout(
        &self,
        desc: &PipelineLayoutDescriptor,
    ) -> Result<GpuPipelineLayout, FrameGraphError>;
    /// Create a graphics pipeline.
    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDescriptor,
    ) -> Result<GpuPipeline, FrameGraphError>;
    /// Create a compute pipeline.
    fn create_compute_pipeline(
        &self,
        desc: &ComputePipelineDescriptor,
    ) -> Result<GpuPipeline, FrameGraphError>;
    /// Allocate a descriptor set from a layout.
    fn create_bind_group(
        &self,
        layout: GpuDescriptorLayout,
    ) -> Result<GpuBindGroup, FrameGraphError>;
    /// Push updated resource handles into a descriptor set.
    fn update_bind_group(&self, group: GpuBindGroup, entries: &[BindGroupEntry]);

    /// Release a buffer.
    fn destroy_buffer(&self, buffer: GpuBuffer);
    /// Release an image.
    fn destroy_image(&self, image: GpuImage);
    /// Release an image view.
    fn destroy_image_view(&self, view: GpuImageView);
    /// Release a buffer view.
    fn destroy_buffer_view(&self, view: GpuBufferView);
    /// Release a sampler.
    fn destroy_sampler(&self, sampler: GpuSampler);
}

/// Command-recording interface of the graphics device.
///
/// Barriers are appended and then applied as one batch; the frame graph
/// always applies a pass's barriers before encoding that pass's commands.
pub trait CommandRecorder {
    /// Append a buffer memory barrier to the pending batch.
    fn append_buffer_barrier(&mut self, buffer: GpuBuffer, src: SyncScope, dst: SyncScope);
    /// Append an image layout transition to the pending batch.
    fn append_image_barrier(
        &mut self,
        image: GpuImage,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
        src: SyncScope,
        dst: SyncScope,
        aspects: ImageAspects,
    );
    /// Flush the pending barrier batch into the command stream.
    fn apply_barriers(&mut self);

    /// Begin a render pass.
    fn begin_render_pass(
        &mut self,
        render_pass: GpuRenderPass,
        framebuffer: GpuFramebuffer,
        area: Rect2d,
        clears: &[ClearValue],
    );
    /// End the current render pass.
    fn end_render_pass(&mut self);
    /// Set the viewport for subsequent draws.
    fn set_viewport(&mut self, viewport: Viewport);
    /// Bind a graphics pipeline.
    fn bind_graphics_pipeline(&mut self, pipeline: GpuPipeline);
    /// Bind a compute pipeline.
    fn bind_compute_pipeline(&mut self, pipeline: GpuPipeline);
    /// Bind a descriptor set at its update-frequency slot.
    fn bind_descriptor_set(&mut self, rate: BindingRate, group: GpuBindGroup);
    /// Push per-draw constant bytes.
    fn push_constants(&mut self, data: &[u8]);
    /// Bind a vertex buffer.
    fn bind_vertex_buffer(&mut self, buffer: GpuBuffer);
    /// Bind an index buffer.
    fn bind_index_buffer(&mut self, buffer: GpuBuffer);
    /// Issue a non-indexed draw.
    fn draw(&mut self, vertex_count: u32, instance_count: u32);
    /// Issue an indexed draw.
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32);
    /// Dispatch compute work groups.
    fn dispatch(&mut self, x: u32, y: u32, z: u32);

    /// Copy a buffer range.
    fn copy_buffer(
        &mut self,
        src: GpuBuffer,
        dst: GpuBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    );
    /// Copy between images.
    fn copy_image(&mut self, src: GpuImage, dst: GpuImage, extent: Extent3d);
    /// Fill a buffer range with a repeated value.
    fn fill_buffer(&mut self, dst: GpuBuffer, offset: u64, size: u64, value: u32);
    /// Upload CPU bytes through a staging buffer.
    fn upload_buffer(&mut self, staging: GpuBuffer, data: &[u8], dst: GpuBuffer, offset: u64);
}
