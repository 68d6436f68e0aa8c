//! Descriptive (not yet allocated) information for backend objects.

use bitflags::bitflags;

use crate::types::{
    BindingRate, Extent3d, Format, ImageAspects, ImageLayout, LoadOp, StoreOp,
};

use super::{
    GpuBuffer, GpuBufferView, GpuDescriptorLayout, GpuImageView, GpuPipelineLayout, GpuRenderPass,
    GpuSampler,
};

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 0;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 1;
        /// Buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be bound as a storage buffer.
        const STORAGE = 1 << 3;
        /// Buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 4;
        /// Buffer can be bound as an index buffer.
        const INDEX = 1 << 5;
    }
}

bitflags! {
    /// Usage flags for images.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        /// Image can be copied from.
        const COPY_SRC = 1 << 0;
        /// Image can be copied to.
        const COPY_DST = 1 << 1;
        /// Image can be sampled in a shader.
        const SAMPLED = 1 << 2;
        /// Image can be used as a storage image.
        const STORAGE = 1 << 3;
        /// Image can be used as a color attachment.
        const COLOR_ATTACHMENT = 1 << 4;
        /// Image can be used as a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
        /// Image can be used as a shading-rate attachment.
        const SHADING_RATE = 1 << 6;
    }
}

/// Descriptive information for a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Attach a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Descriptive information for an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Image extent.
    pub extent: Extent3d,
    /// Pixel format.
    pub format: Format,
    /// Number of array layers (slices).
    pub layers: u32,
    /// Allowed usages.
    pub usage: ImageUsage,
}

impl ImageDescriptor {
    /// Create a 2D single-layer image descriptor.
    pub fn new_2d(width: u32, height: u32, format: Format, usage: ImageUsage) -> Self {
        Self {
            label: None,
            extent: Extent3d::new_2d(width, height),
            format,
            layers: 1,
            usage,
        }
    }

    /// Attach a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the number of array layers.
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }
}

/// Descriptive information for an image view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageViewDescriptor {
    /// Aspects covered by the view.
    pub aspects: ImageAspects,
    /// First array layer.
    pub base_layer: u32,
    /// Number of array layers.
    pub layer_count: u32,
}

impl ImageViewDescriptor {
    /// View covering the given aspects of the first layer.
    pub fn new(aspects: ImageAspects) -> Self {
        Self {
            aspects,
            base_layer: 0,
            layer_count: 1,
        }
    }

    /// Set the array layer range.
    pub fn with_layers(mut self, base: u32, count: u32) -> Self {
        self.base_layer = base;
        self.layer_count = count;
        self
    }
}

/// Descriptive information for a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferViewDescriptor {
    /// Byte offset into the origin buffer.
    pub offset: u64,
    /// Size of the viewed range in bytes.
    pub size: u64,
}

/// Filtering mode for samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest-neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// Descriptive information for a sampler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SamplerDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Magnification/minification filter.
    pub filter: FilterMode,
}

/// Descriptive information for an imported swapchain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwapchainDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Extent of the presentable images.
    pub extent: Extent3d,
    /// Format of the presentable images.
    pub format: Format,
    /// Number of images in the swapchain.
    pub image_count: u32,
}

/// One attachment of a render pass descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPassAttachment {
    /// Attachment format.
    pub format: Format,
    /// Load operation.
    pub load_op: LoadOp,
    /// Store operation.
    pub store_op: StoreOp,
    /// Layout the attachment is in while the pass executes.
    pub layout: ImageLayout,
}

/// Descriptive information for a render pass object.
///
/// This is the content-hash key for render-pass memoization: two passes
/// with identical attachment lists share one backend object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RenderPassDescriptor {
    /// Ordered attachment list.
    pub attachments: Vec<RenderPassAttachment>,
}

/// Descriptive information for a framebuffer object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferDescriptor {
    /// The render pass this framebuffer is compatible with.
    pub render_pass: GpuRenderPass,
    /// Attachment views, in render pass attachment order.
    pub attachments: Vec<GpuImageView>,
    /// Framebuffer extent.
    pub extent: Extent3d,
    /// Number of layers.
    pub layers: u32,
}

/// Kind of a descriptor binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Uniform buffer.
    UniformBuffer,
    /// Sampled image.
    SampledImage,
    /// Separate sampler.
    Sampler,
    /// Storage buffer.
    StorageBuffer,
    /// Storage image.
    StorageImage,
}

/// One binding of a descriptor-set layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// Binding name as it appears in shader metadata.
    pub name: String,
    /// Kind of resource bound here.
    pub kind: DescriptorKind,
    /// Update-frequency class.
    pub rate: BindingRate,
}

/// Descriptive information for a descriptor-set layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DescriptorLayoutDescriptor {
    /// Bindings, sorted by name before baking so that merged layouts hash
    /// identically regardless of declaration order.
    pub bindings: Vec<DescriptorBinding>,
}

/// Descriptive information for a pipeline layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PipelineLayoutDescriptor {
    /// Descriptor-set layouts, indexed by set.
    pub set_layouts: Vec<GpuDescriptorLayout>,
}

/// Descriptive information for a graphics pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineDescriptor {
    /// Shader program id.
    pub program: String,
    /// Pipeline layout.
    pub layout: GpuPipelineLayout,
    /// Render pass the pipeline executes in.
    pub render_pass: GpuRenderPass,
    /// Update-frequency class the per-material set is bound at.
    pub rate: BindingRate,
}

/// Descriptive information for a compute pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComputePipelineDescriptor {
    /// Shader program id.
    pub program: String,
    /// Pipeline layout.
    pub layout: GpuPipelineLayout,
}

/// A resource bound into a descriptor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundResource {
    /// A whole buffer.
    Buffer(GpuBuffer),
    /// A buffer view.
    BufferView(GpuBufferView),
    /// An image view together with the layout it will be in when read.
    ImageView {
        /// The view handle.
        view: GpuImageView,
        /// Layout at access time.
        layout: ImageLayout,
    },
    /// A sampler.
    Sampler(GpuSampler),
}

/// One entry of a descriptor-set update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindGroupEntry {
    /// Binding name.
    pub name: String,
    /// Resolved resource handle.
    pub resource: BoundResource,
}
