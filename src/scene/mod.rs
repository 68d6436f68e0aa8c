//! Scene and material collaborator seam.
//!
//! The frame graph does not own scene data. It consumes a [`SceneView`]:
//! a queryable list of active renderables with their bounds, per-phase
//! techniques and mesh handles, plus named cameras. [`SceneData`] is a
//! plain-storage implementation sufficient for tools and tests; a real
//! engine implements the trait over its own scene representation.

use std::collections::HashMap;

use glam::Mat4;

use crate::backend::{DescriptorLayoutDescriptor, GpuBuffer};
use crate::scheduler::cull::Aabb;

/// How one material draws in one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Technique {
    /// Shader program id.
    pub program: String,
    /// Descriptor-set layout of the material's bindings.
    pub layout: DescriptorLayoutDescriptor,
    /// Vertex layout tag the program was compiled against.
    pub vertex_layout: String,
}

impl Technique {
    /// A technique with no material bindings.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            layout: DescriptorLayoutDescriptor::default(),
            vertex_layout: String::new(),
        }
    }
}

/// One drawable item of the scene.
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Debug label; fatal diagnostics name it.
    pub label: String,
    /// World-space bounds used for culling.
    pub bounds: Aabb,
    /// Technique per scene phase.
    pub techniques: HashMap<String, Technique>,
    /// Vertex buffer handle.
    pub vertex_buffer: GpuBuffer,
    /// Index buffer handle, if indexed.
    pub index_buffer: Option<GpuBuffer>,
    /// Vertex count for non-indexed draws.
    pub vertex_count: u32,
    /// Index count for indexed draws.
    pub index_count: u32,
    /// Per-draw constant bytes pushed before the draw call.
    pub constants: Vec<u8>,
    /// Whether frustum culling applies; always-drawn items skip the BVH.
    pub cullable: bool,
}

impl Renderable {
    /// Set the per-draw constants from a plain-old-data value.
    pub fn set_constants<T: bytemuck::NoUninit>(&mut self, value: &T) {
        self.constants = bytemuck::bytes_of(value).to_vec();
    }
}

/// A camera as the frame graph sees it.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Debug label.
    pub label: String,
    /// Combined view-projection matrix.
    pub view_projection: Mat4,
    /// When false, this camera draws every renderable.
    pub culling_enabled: bool,
}

impl Camera {
    /// Create a camera with culling enabled.
    pub fn new(label: &str, view_projection: Mat4) -> Self {
        Self {
            label: label.to_string(),
            view_projection,
            culling_enabled: true,
        }
    }
}

/// Read access to the active scene, as consumed by the scheduler.
pub trait SceneView {
    /// Active renderables, index-stable for the duration of a warm cycle.
    fn renderables(&self) -> &[Renderable];

    /// A camera by name.
    fn camera(&self, name: &str) -> Option<&Camera>;

    /// Built-in fallback technique for a phase, substituted for
    /// renderables lacking their own.
    fn fallback_technique(&self, phase: &str) -> Option<&Technique>;
}

/// Plain-storage scene, used by tools and tests.
#[derive(Debug, Default)]
pub struct SceneData {
    /// Active renderables.
    pub renderables: Vec<Renderable>,
    /// Cameras by name.
    pub cameras: HashMap<String, Camera>,
    /// Fallback techniques by phase.
    pub fallbacks: HashMap<String, Technique>,
}

impl SceneData {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderable.
    pub fn add_renderable(&mut self, renderable: Renderable) {
        self.renderables.push(renderable);
    }

    /// Add a camera.
    pub fn add_camera(&mut self, camera: Camera) {
        self.cameras.insert(camera.label.clone(), camera);
    }

    /// Register a fallback technique for a phase.
    pub fn add_fallback(&mut self, phase: &str, technique: Technique) {
        self.fallbacks.insert(phase.to_string(), technique);
    }
}

impl SceneView for SceneData {
    fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    fn camera(&self, name: &str) -> Option<&Camera> {
        self.cameras.get(name)
    }

    fn fallback_technique(&self, phase: &str) -> Option<&Technique> {
        self.fallbacks.get(phase)
    }
}
