//! Named registry of GPU resources and their views.
//!
//! The [`ResourceGraph`] owns every resource the frame graph can touch,
//! keyed by a unique hierarchical name (`"shadow/map"`, `"gbuffer/albedo"`).
//! Declarations are re-issued every frame and are idempotent; backing
//! handles mount lazily on first touch and persist until explicit
//! invalidation or teardown, so the per-frame rebuild never reallocates.
//!
//! View nodes reference their origin through an edge list. Depth/stencil
//! images auto-spawn `<name>/depth` and `<name>/stencil` aspect views, and
//! releases walk views in post-order so a view never outlives its origin.

use std::collections::HashMap;

use crate::backend::{
    BufferDescriptor, BufferViewDescriptor, GpuBuffer, GpuBufferView, GpuImage, GpuImageView,
    GpuSampler, ImageDescriptor, ImageViewDescriptor, RenderDevice, SamplerDescriptor,
    SwapchainDescriptor,
};
use crate::error::FrameGraphError;
use crate::types::{Extent3d, Format, ImageAspects, ImageLayout, SyncScope};

/// Handle to a node in the resource graph.
///
/// Dense index into the node arena; only valid for the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(u32);

impl ResourceHandle {
    fn new(index: u32) -> Self {
        Self(index)
    }
}

/// Where a resource's backing memory comes from and how long it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Residency {
    /// Allocated by the graph, eligible for release when its life expires.
    Transient,
    /// Allocated by the graph, kept across frames.
    Persistent,
    /// Backing supplied from outside the graph.
    External,
    /// Presentable image owned by the swapchain.
    Swapchain,
}

/// Descriptive (not yet allocated) information of a resource node.
#[derive(Debug, Clone)]
pub enum ResourceInfo {
    /// A buffer.
    Buffer(BufferDescriptor),
    /// An image.
    Image(ImageDescriptor),
    /// A view over a buffer range.
    BufferView {
        /// Name of the origin buffer.
        origin: String,
        /// View description.
        desc: BufferViewDescriptor,
    },
    /// A view over an image.
    ImageView {
        /// Name of the origin image.
        origin: String,
        /// View description.
        desc: ImageViewDescriptor,
    },
    /// A sampler.
    Sampler(SamplerDescriptor),
    /// An imported swapchain.
    Swapchain(SwapchainDescriptor),
}

/// Backing handles created on mount.
#[derive(Debug, Clone, Default)]
enum Backing {
    /// Not mounted.
    #[default]
    None,
    Buffer(GpuBuffer),
    Image {
        image: GpuImage,
        view: GpuImageView,
    },
    BufferView(GpuBufferView),
    ImageView(GpuImageView),
    Sampler(GpuSampler),
    Swapchain {
        images: Vec<GpuImage>,
        views: Vec<GpuImageView>,
    },
}

/// Last recorded access state of a resource, carried across frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccessState {
    /// Stages and access flags of the most recent touch.
    pub scope: SyncScope,
    /// Layout the image was left in (`Undefined` for buffers and untouched
    /// images).
    pub layout: ImageLayout,
}

/// One node of the resource graph.
#[derive(Debug)]
pub struct ResourceNode {
    name: String,
    info: ResourceInfo,
    residency: Residency,
    backing: Backing,
    state: AccessState,
    life: u64,
}

impl ResourceNode {
    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node residency.
    pub fn residency(&self) -> Residency {
        self.residency
    }

    /// Descriptive information.
    pub fn info(&self) -> &ResourceInfo {
        &self.info
    }

    /// Life counter value of the most recent mount (0 = never mounted).
    pub fn life(&self) -> u64 {
        self.life
    }

    /// Check if a backing handle exists.
    pub fn is_mounted(&self) -> bool {
        !matches!(self.backing, Backing::None)
    }

    /// Check if this node is a view of another node.
    pub fn is_view(&self) -> bool {
        matches!(
            self.info,
            ResourceInfo::BufferView { .. } | ResourceInfo::ImageView { .. }
        )
    }

    /// Name of the origin node, for views.
    pub fn origin(&self) -> Option<&str> {
        match &self.info {
            ResourceInfo::BufferView { origin, .. } | ResourceInfo::ImageView { origin, .. } => {
                Some(origin)
            }
            _ => None,
        }
    }
}

/// Named registry of GPU resources with lazy allocation.
#[derive(Debug)]
pub struct ResourceGraph {
    /// All nodes (direct storage, no pointers).
    nodes: Vec<ResourceNode>,
    /// Name to node index.
    names: HashMap<String, u32>,
    /// View edges stored as (origin, view) index pairs.
    view_edges: Vec<(u32, u32)>,
    /// Index of the currently acquired swapchain image.
    frame_index: u32,
    /// Monotonically increasing mount counter.
    life_counter: u64,
}

impl Default for ResourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceGraph {
    /// Create a new empty resource graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            names: HashMap::new(),
            view_edges: Vec::new(),
            frame_index: 0,
            life_counter: 1,
        }
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Current value of the life counter.
    ///
    /// Mounts performed after reading this value compare `>=` against it,
    /// which makes it a usable threshold for [`unmount`](Self::unmount).
    pub fn frame_life(&self) -> u64 {
        self.life_counter
    }

    /// Set the index of the currently acquired swapchain image.
    pub fn set_frame_index(&mut self, index: u32) {
        self.frame_index = index;
    }

    fn index_of(&self, name: &str) -> usize {
        match self.names.get(name) {
            Some(&index) => index as usize,
            None => panic!("resource '{name}' was never declared"),
        }
    }

    fn insert(&mut self, name: &str, info: ResourceInfo, residency: Residency) -> ResourceHandle {
        if let Some(&index) = self.names.get(name) {
            // Re-declaration is a no-op; the frame rebuild hits this path
            // for every persistent resource.
            return ResourceHandle::new(index);
        }
        let index = self.nodes.len() as u32;
        self.nodes.push(ResourceNode {
            name: name.to_string(),
            info,
            residency,
            backing: Backing::None,
            state: AccessState::default(),
            life: 0,
        });
        self.names.insert(name.to_string(), index);
        ResourceHandle::new(index)
    }

    fn add_view_edge(&mut self, origin: &str, view: ResourceHandle) {
        let origin_index = self.index_of(origin) as u32;
        let edge = (origin_index, view.0);
        if !self.view_edges.contains(&edge) {
            self.view_edges.push(edge);
        }
    }

    /// Register a buffer.
    pub fn add_buffer(
        &mut self,
        name: &str,
        desc: BufferDescriptor,
        residency: Residency,
    ) -> ResourceHandle {
        self.insert(name, ResourceInfo::Buffer(desc), residency)
    }

    /// Register an image.
    ///
    /// Depth/stencil formats auto-spawn `<name>/depth` (and `<name>/stencil`
    /// for combined formats) aspect view children.
    pub fn add_image(
        &mut self,
        name: &str,
        desc: ImageDescriptor,
        residency: Residency,
    ) -> ResourceHandle {
        let format = desc.format;
        let handle = self.insert(name, ResourceInfo::Image(desc), residency);
        if format.is_depth_stencil() {
            let depth = format!("{name}/depth");
            self.add_image_view(
                &depth,
                name,
                ImageViewDescriptor::new(ImageAspects::DEPTH),
            );
            if format.has_stencil() {
                let stencil = format!("{name}/stencil");
                self.add_image_view(
                    &stencil,
                    name,
                    ImageViewDescriptor::new(ImageAspects::STENCIL),
                );
            }
        }
        handle
    }

    /// Register a view over a buffer range.
    pub fn add_buffer_view(
        &mut self,
        name: &str,
        origin: &str,
        desc: BufferViewDescriptor,
    ) -> ResourceHandle {
        if self.contains(name) {
            return ResourceHandle::new(self.names[name]);
        }
        let handle = self.insert(
            name,
            ResourceInfo::BufferView {
                origin: origin.to_string(),
                desc,
            },
            Residency::Transient,
        );
        self.add_view_edge(origin, handle);
        handle
    }

    /// Register a view over an image.
    pub fn add_image_view(
        &mut self,
        name: &str,
        origin: &str,
        desc: ImageViewDescriptor,
    ) -> ResourceHandle {
        if self.contains(name) {
            return ResourceHandle::new(self.names[name]);
        }
        let handle = self.insert(
            name,
            ResourceInfo::ImageView {
                origin: origin.to_string(),
                desc,
            },
            Residency::Transient,
        );
        self.add_view_edge(origin, handle);
        handle
    }

    /// Register a sampler.
    pub fn add_sampler(&mut self, name: &str, desc: SamplerDescriptor) -> ResourceHandle {
        self.insert(name, ResourceInfo::Sampler(desc), Residency::Persistent)
    }

    /// Import a swapchain as a presentable resource.
    pub fn import_swapchain(&mut self, name: &str, desc: SwapchainDescriptor) -> ResourceHandle {
        self.insert(name, ResourceInfo::Swapchain(desc), Residency::Swapchain)
    }

    /// Ensure a backing handle exists for `name` and bump its life.
    ///
    /// Mounting is idempotent within a frame: repeated mounts return the
    /// same backing handle. Depth/stencil images also mount their aspect
    /// view children. Swapchain resources fetch per-image handles and views
    /// on first use.
    ///
    /// # Panics
    ///
    /// Panics if `name` was never declared, or if `name` is a view whose
    /// origin is not mounted yet.
    pub fn mount(
        &mut self,
        name: &str,
        device: &dyn RenderDevice,
    ) -> Result<(), FrameGraphError> {
        let index = self.index_of(name);
        if !self.nodes[index].is_mounted() {
            let backing = match self.nodes[index].info.clone() {
                ResourceInfo::Buffer(desc) => {
                    log::trace!("mounting buffer '{name}'");
                    Backing::Buffer(device.create_buffer(&desc)?)
                }
                ResourceInfo::Image(desc) => {
                    log::trace!("mounting image '{name}'");
                    let image = device.create_image(&desc)?;
                    let view = device.create_image_view(
                        image,
                        &ImageViewDescriptor::new(desc.format.aspects())
                            .with_layers(0, desc.layers),
                    )?;
                    Backing::Image { image, view }
                }
                ResourceInfo::BufferView { origin, desc } => {
                    let buffer = match self.backing_of(&origin) {
                        Backing::Buffer(buffer) => *buffer,
                        Backing::None => {
                            panic!("view '{name}' mounted before its origin '{origin}'")
                        }
                        _ => panic!("buffer view '{name}' declared over non-buffer '{origin}'"),
                    };
                    log::trace!("mounting buffer view '{name}'");
                    Backing::BufferView(device.create_buffer_view(buffer, &desc)?)
                }
                ResourceInfo::ImageView { origin, desc } => {
                    let image = match self.backing_of(&origin) {
                        Backing::Image { image, .. } => *image,
                        Backing::None => {
                            panic!("view '{name}' mounted before its origin '{origin}'")
                        }
                        _ => panic!("image view '{name}' declared over non-image '{origin}'"),
                    };
                    log::trace!("mounting image view '{name}'");
                    Backing::ImageView(device.create_image_view(image, &desc)?)
                }
                ResourceInfo::Sampler(desc) => {
                    log::trace!("mounting sampler '{name}'");
                    Backing::Sampler(device.create_sampler(&desc)?)
                }
                ResourceInfo::Swapchain(desc) => {
                    log::trace!("mounting swapchain '{name}' ({} images)", desc.image_count);
                    let images = device.swapchain_images(&desc)?;
                    let mut views = Vec::with_capacity(images.len());
                    for &image in &images {
                        views.push(device.create_image_view(
                            image,
                            &ImageViewDescriptor::new(ImageAspects::COLOR),
                        )?);
                    }
                    Backing::Swapchain { images, views }
                }
            };
            self.nodes[index].backing = backing;
        }
        self.nodes[index].life = self.life_counter;
        self.life_counter += 1;

        // Aspect views of a depth/stencil image ride along with it.
        if matches!(self.nodes[index].info, ResourceInfo::Image(ref desc) if desc.format.is_depth_stencil())
        {
            let children: Vec<String> = self
                .view_edges
                .iter()
                .filter(|&&(origin, _)| origin as usize == index)
                .map(|&(_, view)| self.nodes[view as usize].name.clone())
                .collect();
            for child in children {
                self.mount(&child, device)?;
            }
        }
        Ok(())
    }

    fn backing_of(&self, name: &str) -> &Backing {
        &self.nodes[self.index_of(name)].backing
    }

    /// Visit `name` and its view children in post-order (views first).
    pub fn visit_post_order(&self, name: &str, visitor: &mut dyn FnMut(&str)) {
        let index = self.index_of(name) as u32;
        for &(origin, view) in &self.view_edges {
            if origin == index {
                self.visit_post_order(&self.nodes[view as usize].name.clone(), visitor);
            }
        }
        visitor(&self.nodes[index as usize].name);
    }

    /// Release `name` and its views if its life predates `life_threshold`.
    ///
    /// Views are released strictly before the origin. Resources mounted at
    /// or after the threshold are kept.
    pub fn unmount(&mut self, name: &str, life_threshold: u64, device: &dyn RenderDevice) {
        let index = self.index_of(name);
        if self.nodes[index].life >= life_threshold {
            return;
        }
        let mut order = Vec::new();
        self.visit_post_order(name, &mut |node| order.push(node.to_string()));
        for node in order {
            self.release(&node, device);
        }
    }

    /// Unconditionally release `name` and its views (views first).
    ///
    /// Used for explicit invalidation, e.g. a swapchain resize.
    pub fn invalidate(&mut self, name: &str, device: &dyn RenderDevice) {
        let mut order = Vec::new();
        self.visit_post_order(name, &mut |node| order.push(node.to_string()));
        for node in order {
            self.release(&node, device);
        }
    }

    /// Release every mounted backing handle.
    pub fn teardown(&mut self, device: &dyn RenderDevice) {
        // Views first: post-order over every root.
        let roots: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| !node.is_view())
            .map(|node| node.name.clone())
            .collect();
        for root in roots {
            self.invalidate(&root, device);
        }
    }

    fn release(&mut self, name: &str, device: &dyn RenderDevice) {
        let index = self.index_of(name);
        let backing = std::mem::take(&mut self.nodes[index].backing);
        match backing {
            Backing::None => {}
            Backing::Buffer(buffer) => {
                log::trace!("releasing buffer '{name}'");
                device.destroy_buffer(buffer);
            }
            Backing::Image { image, view } => {
                log::trace!("releasing image '{name}'");
                device.destroy_image_view(view);
                device.destroy_image(image);
            }
            Backing::BufferView(view) => {
                log::trace!("releasing buffer view '{name}'");
                device.destroy_buffer_view(view);
            }
            Backing::ImageView(view) => {
                log::trace!("releasing image view '{name}'");
                device.destroy_image_view(view);
            }
            Backing::Sampler(sampler) => {
                log::trace!("releasing sampler '{name}'");
                device.destroy_sampler(sampler);
            }
            Backing::Swapchain { images, views } => {
                log::trace!("releasing swapchain '{name}'");
                for view in views {
                    device.destroy_image_view(view);
                }
                // Presentable images are owned by the swapchain itself.
                let _ = images;
            }
        }
        self.nodes[index].life = 0;
        self.nodes[index].state = AccessState::default();
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    /// Get the backing buffer handle.
    pub fn buffer(&self, name: &str) -> GpuBuffer {
        match self.backing_of(name) {
            Backing::Buffer(buffer) => *buffer,
            Backing::None => panic!("resource '{name}' is not mounted"),
            _ => panic!("resource '{name}' is not a buffer"),
        }
    }

    /// Get the backing image handle; swapchain resources resolve through the
    /// current frame index.
    pub fn image(&self, name: &str) -> GpuImage {
        match self.backing_of(name) {
            Backing::Image { image, .. } => *image,
            Backing::Swapchain { images, .. } => {
                images[self.frame_index as usize % images.len()]
            }
            Backing::None => panic!("resource '{name}' is not mounted"),
            _ => panic!("resource '{name}' is not an image"),
        }
    }

    /// Get an image view handle: the default view for image nodes, the view
    /// itself for image-view nodes, and the current frame's view for
    /// swapchain resources.
    pub fn image_view(&self, name: &str) -> GpuImageView {
        match self.backing_of(name) {
            Backing::Image { view, .. } => *view,
            Backing::ImageView(view) => *view,
            Backing::Swapchain { views, .. } => views[self.frame_index as usize % views.len()],
            Backing::None => panic!("resource '{name}' is not mounted"),
            _ => panic!("resource '{name}' has no image view"),
        }
    }

    /// Get the backing buffer view handle.
    pub fn buffer_view(&self, name: &str) -> GpuBufferView {
        match self.backing_of(name) {
            Backing::BufferView(view) => *view,
            Backing::None => panic!("resource '{name}' is not mounted"),
            _ => panic!("resource '{name}' is not a buffer view"),
        }
    }

    /// Get the backing sampler handle.
    pub fn sampler(&self, name: &str) -> GpuSampler {
        match self.backing_of(name) {
            Backing::Sampler(sampler) => *sampler,
            Backing::None => panic!("resource '{name}' is not mounted"),
            _ => panic!("resource '{name}' is not a sampler"),
        }
    }

    // ========================================================================
    // Metadata queries used by access derivation
    // ========================================================================

    /// Get a node by name.
    pub fn node(&self, name: &str) -> &ResourceNode {
        &self.nodes[self.index_of(name)]
    }

    /// Resolve a (possibly view) name to its origin resource name.
    pub fn origin_of<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        loop {
            match self.node(current).origin() {
                Some(origin) => current = origin,
                None => return current,
            }
        }
    }

    /// Format of a resource, resolving views to their origin.
    pub fn format_of(&self, name: &str) -> Option<Format> {
        match &self.node(self.origin_of(name)).info {
            ResourceInfo::Image(desc) => Some(desc.format),
            ResourceInfo::Swapchain(desc) => Some(desc.format),
            _ => None,
        }
    }

    /// Aspects touched through a name: the view's declared aspects for
    /// image-view nodes, otherwise the full format aspects.
    pub fn aspects_of(&self, name: &str) -> ImageAspects {
        match &self.node(name).info {
            ResourceInfo::ImageView { desc, .. } => desc.aspects,
            _ => self
                .format_of(name)
                .map(|format| format.aspects())
                .unwrap_or(ImageAspects::empty()),
        }
    }

    /// Extent of an image resource, resolving views to their origin.
    pub fn extent_of(&self, name: &str) -> Option<Extent3d> {
        match &self.node(self.origin_of(name)).info {
            ResourceInfo::Image(desc) => Some(desc.extent),
            ResourceInfo::Swapchain(desc) => Some(desc.extent),
            _ => None,
        }
    }

    /// Layer (slice) count visible through a name.
    pub fn layers_of(&self, name: &str) -> u32 {
        match &self.node(name).info {
            ResourceInfo::ImageView { desc, .. } => desc.layer_count,
            ResourceInfo::Image(desc) => desc.layers,
            _ => 1,
        }
    }

    /// Check whether a name resolves to a swapchain resource.
    pub fn is_swapchain(&self, name: &str) -> bool {
        matches!(
            self.node(self.origin_of(name)).info,
            ResourceInfo::Swapchain(_)
        )
    }

    /// Last recorded access state of a resource's origin.
    pub fn access_state(&self, name: &str) -> AccessState {
        self.node(self.origin_of(name)).state
    }

    /// Record the access state a frame left a resource in.
    pub fn set_access_state(&mut self, name: &str, state: AccessState) {
        let index = self.index_of(self.origin_of(name));
        self.nodes[index].state = state;
    }

    /// Reset a resource's tracked state to "none".
    ///
    /// Applied to swapchain resources after their present transition so the
    /// next frame's first access never sees a stale layout.
    pub fn reset_access_state(&mut self, name: &str) {
        self.set_access_state(name, AccessState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferUsage, ImageUsage, NullDevice};

    fn color_image(width: u32, height: u32) -> ImageDescriptor {
        ImageDescriptor::new_2d(
            width,
            height,
            Format::Rgba8Unorm,
            ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED,
        )
    }

    #[test]
    fn test_redeclaration_is_noop() {
        let mut graph = ResourceGraph::new();
        let first = graph.add_image("gbuffer/albedo", color_image(64, 64), Residency::Persistent);
        let second = graph.add_image("gbuffer/albedo", color_image(128, 128), Residency::Transient);

        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
        // The original declaration wins.
        assert_eq!(graph.extent_of("gbuffer/albedo").unwrap().width, 64);
    }

    #[test]
    fn test_mount_is_idempotent() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.add_buffer(
            "scene/uniforms",
            BufferDescriptor::new(256, BufferUsage::UNIFORM),
            Residency::Persistent,
        );

        graph.mount("scene/uniforms", &device).unwrap();
        let first = graph.buffer("scene/uniforms");
        graph.mount("scene/uniforms", &device).unwrap();
        let second = graph.buffer("scene/uniforms");

        assert_eq!(first, second);
    }

    #[test]
    fn test_mount_bumps_life() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.add_buffer(
            "scene/uniforms",
            BufferDescriptor::new(256, BufferUsage::UNIFORM),
            Residency::Persistent,
        );

        graph.mount("scene/uniforms", &device).unwrap();
        let first = graph.node("scene/uniforms").life();
        graph.mount("scene/uniforms", &device).unwrap();
        let second = graph.node("scene/uniforms").life();
        assert!(second > first);
    }

    #[test]
    fn test_depth_stencil_spawns_aspect_views() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.add_image(
            "main/depth",
            ImageDescriptor::new_2d(
                64,
                64,
                Format::Depth24PlusStencil8,
                ImageUsage::DEPTH_STENCIL_ATTACHMENT,
            ),
            Residency::Persistent,
        );

        assert!(graph.contains("main/depth/depth"));
        assert!(graph.contains("main/depth/stencil"));

        graph.mount("main/depth", &device).unwrap();
        assert!(graph.node("main/depth/depth").is_mounted());
        assert!(graph.node("main/depth/stencil").is_mounted());
        assert_eq!(graph.aspects_of("main/depth/depth"), ImageAspects::DEPTH);
        assert_eq!(
            graph.aspects_of("main/depth/stencil"),
            ImageAspects::STENCIL
        );
    }

    #[test]
    fn test_depth_only_spawns_single_aspect_view() {
        let mut graph = ResourceGraph::new();
        graph.add_image(
            "shadow/map",
            ImageDescriptor::new_2d(
                1024,
                1024,
                Format::Depth32Float,
                ImageUsage::DEPTH_STENCIL_ATTACHMENT,
            ),
            Residency::Persistent,
        );
        assert!(graph.contains("shadow/map/depth"));
        assert!(!graph.contains("shadow/map/stencil"));
    }

    #[test]
    #[should_panic(expected = "was never declared")]
    fn test_unregistered_name_panics() {
        let graph = ResourceGraph::new();
        graph.node("nonexistent");
    }

    #[test]
    #[should_panic(expected = "mounted before its origin")]
    fn test_view_before_origin_panics() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.add_image("color", color_image(64, 64), Residency::Persistent);
        graph.add_image_view(
            "color/slice0",
            "color",
            ImageViewDescriptor::new(ImageAspects::COLOR),
        );
        // Origin never mounted.
        graph.mount("color/slice0", &device).unwrap();
    }

    #[test]
    fn test_unmount_post_order() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.add_image("color", color_image(64, 64), Residency::Transient);
        graph.add_image_view(
            "color/slice0",
            "color",
            ImageViewDescriptor::new(ImageAspects::COLOR),
        );
        graph.mount("color", &device).unwrap();
        graph.mount("color/slice0", &device).unwrap();

        let mut order = Vec::new();
        graph.visit_post_order("color", &mut |name| order.push(name.to_string()));
        assert_eq!(order, vec!["color/slice0".to_string(), "color".to_string()]);

        graph.unmount("color", graph.frame_life(), &device);
        assert!(!graph.node("color").is_mounted());
        assert!(!graph.node("color/slice0").is_mounted());
    }

    #[test]
    fn test_unmount_respects_threshold() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.add_buffer(
            "staging",
            BufferDescriptor::new(64, BufferUsage::COPY_SRC),
            Residency::Transient,
        );

        let threshold = graph.frame_life();
        graph.mount("staging", &device).unwrap();

        // Mounted at (>= threshold): survives.
        graph.unmount("staging", threshold, &device);
        assert!(graph.node("staging").is_mounted());

        // A later threshold reaps it.
        graph.unmount("staging", graph.frame_life(), &device);
        assert!(!graph.node("staging").is_mounted());
    }

    #[test]
    fn test_swapchain_resolves_per_frame() {
        let device = NullDevice::new();
        let mut graph = ResourceGraph::new();
        graph.import_swapchain(
            "backbuffer",
            SwapchainDescriptor {
                label: None,
                extent: Extent3d::new_2d(1920, 1080),
                format: Format::Bgra8Unorm,
                image_count: 3,
            },
        );
        graph.mount("backbuffer", &device).unwrap();

        graph.set_frame_index(0);
        let image0 = graph.image("backbuffer");
        graph.set_frame_index(1);
        let image1 = graph.image("backbuffer");
        assert_ne!(image0, image1);

        // Wraps around the image count.
        graph.set_frame_index(3);
        assert_eq!(graph.image("backbuffer"), image0);
    }

    #[test]
    fn test_origin_resolution() {
        let mut graph = ResourceGraph::new();
        graph.add_image("color", color_image(64, 64), Residency::Persistent);
        graph.add_image_view(
            "color/mip0",
            "color",
            ImageViewDescriptor::new(ImageAspects::COLOR),
        );

        assert_eq!(graph.origin_of("color/mip0"), "color");
        assert_eq!(graph.origin_of("color"), "color");
        assert_eq!(graph.format_of("color/mip0"), Some(Format::Rgba8Unorm));
    }
}
