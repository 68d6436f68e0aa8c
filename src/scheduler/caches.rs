//! Content-hash memoization of expensive backend objects.
//!
//! Render passes, framebuffers, descriptor/pipeline layouts and pipelines
//! are keyed by a hash of their full descriptor: two passes with identical
//! attachment lists share one backend object. The caches are owned by the
//! scheduler and passed where needed, never global; `clear` exists for
//! teardown and device invalidation.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::backend::{
    GpuDescriptorLayout, GpuFramebuffer, GpuPipeline, GpuPipelineLayout, GpuRenderPass,
};
use crate::error::FrameGraphError;

fn content_hash<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// One content-hash keyed cache of backend handles.
#[derive(Debug)]
pub struct BackendCache<H> {
    entries: HashMap<u64, H>,
}

// A derived Default would bound `H: Default`, which the handle newtypes
// do not implement.
impl<H> Default for BackendCache<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H: Copy> BackendCache<H> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Fetch the handle for `key`, creating it on a miss.
    pub fn get_or_create<K: Hash>(
        &mut self,
        key: &K,
        create: impl FnOnce() -> Result<H, FrameGraphError>,
    ) -> Result<H, FrameGraphError> {
        let hash = content_hash(key);
        if let Some(&handle) = self.entries.get(&hash) {
            return Ok(handle);
        }
        let handle = create()?;
        self.entries.insert(hash, handle);
        Ok(handle)
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. The caller is responsible for releasing the
    /// backend objects themselves.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The full set of backend-object caches owned by one scheduler.
#[derive(Debug, Default)]
pub struct SchedulerCaches {
    /// Render pass objects keyed by attachment list.
    pub render_passes: BackendCache<GpuRenderPass>,
    /// Framebuffer objects keyed by (render pass, views, extent).
    pub framebuffers: BackendCache<GpuFramebuffer>,
    /// Descriptor-set layouts keyed by sorted binding list.
    pub descriptor_layouts: BackendCache<GpuDescriptorLayout>,
    /// Pipeline layouts keyed by set-layout list.
    pub pipeline_layouts: BackendCache<GpuPipelineLayout>,
    /// Graphics and compute pipelines keyed by their descriptors.
    pub pipelines: BackendCache<GpuPipeline>,
}

impl SchedulerCaches {
    /// Create an empty cache set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry of every cache.
    pub fn clear(&mut self) {
        self.render_passes.clear();
        self.framebuffers.clear();
        self.descriptor_layouts.clear();
        self.pipeline_layouts.clear();
        self.pipelines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NullDevice, RenderDevice, RenderPassAttachment, RenderPassDescriptor};
    use crate::types::{Format, ImageLayout, LoadOp, StoreOp};

    fn pass_desc(format: Format) -> RenderPassDescriptor {
        RenderPassDescriptor {
            attachments: vec![RenderPassAttachment {
                format,
                load_op: LoadOp::Clear,
                store_op: StoreOp::Store,
                layout: ImageLayout::ColorAttachment,
            }],
        }
    }

    #[test]
    fn test_default_cache_set_is_empty() {
        let caches = SchedulerCaches::default();
        assert!(caches.render_passes.is_empty());
        assert!(caches.framebuffers.is_empty());
        assert!(caches.descriptor_layouts.is_empty());
        assert!(caches.pipeline_layouts.is_empty());
        assert!(caches.pipelines.is_empty());
    }

    #[test]
    fn test_identical_keys_share_one_object() {
        let device = NullDevice::new();
        let mut cache = BackendCache::new();
        let desc = pass_desc(Format::Rgba8Unorm);

        let first = cache
            .get_or_create(&desc, || device.create_render_pass(&desc))
            .unwrap();
        let second = cache
            .get_or_create(&desc, || device.create_render_pass(&desc))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_create_distinct_objects() {
        let device = NullDevice::new();
        let mut cache = BackendCache::new();
        let color = pass_desc(Format::Rgba8Unorm);
        let hdr = pass_desc(Format::Rgba16Float);

        let first = cache
            .get_or_create(&color, || device.create_render_pass(&color))
            .unwrap();
        let second = cache
            .get_or_create(&hdr, || device.create_render_pass(&hdr))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let device = NullDevice::new();
        let mut cache = BackendCache::new();
        let desc = pass_desc(Format::Rgba8Unorm);
        cache
            .get_or_create(&desc, || device.create_render_pass(&desc))
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
