//! Per-frame orchestration: warm-up, culling, preprocess and encode.
//!
//! The [`GraphScheduler`] owns the resource graph, the pass graph and the
//! access graph, and drives one frame through [`GraphScheduler::execute`]:
//!
//! 1. re-run access analysis against the freshly declared graph;
//! 2. if COLD, warm up: collect renderables, resolve techniques per active
//!    phase (fallback substitution), bake merged per-phase descriptor
//!    layouts and pipelines, build the culling BVH;
//! 3. frustum-cull per active camera (cameras with culling disabled
//!    bypass);
//! 4. preprocess: mount every declared resource, fetch-or-create memoized
//!    render pass and framebuffer objects, refresh bind groups;
//! 5. encode: per pass, barriers first, then commands; child queues in
//!    declared order; trailing present transitions once at the end;
//! 6. clear the pass graph and access graph for the next frame.
//!
//! The scheduler is single-threaded by construction: everything it owns is
//! touched only by the thread driving the frame loop. Sharing one device
//! across multiple schedulers is unsupported.

pub mod caches;
pub mod cull;

use std::collections::HashMap;

use crate::access::AccessGraph;
use crate::backend::{
    BindGroupEntry, BoundResource, CommandRecorder, ComputePipelineDescriptor, DescriptorBinding,
    DescriptorKind, DescriptorLayoutDescriptor, FramebufferDescriptor, GpuBindGroup,
    GpuDescriptorLayout, GpuFramebuffer, GpuPipeline, GpuRenderPass, GraphicsPipelineDescriptor,
    PipelineLayoutDescriptor, RenderDevice,
};
use crate::error::FrameGraphError;
use crate::graph::{Binding, CopyOp, CopyRegion, PassIndex, PassNode, RenderGraph};
use crate::resource::ResourceGraph;
use crate::scene::{SceneView, Technique};
use crate::types::{BindingRate, ClearValue, ImageAspects, ImageLayout, Rect2d, Viewport};

use caches::SchedulerCaches;
use cull::{Bvh, Frustum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SchedulerState {
    #[default]
    Cold,
    Warm,
}

/// State built once during warm-up and reused every frame until
/// invalidated.
#[derive(Debug, Default)]
struct WarmData {
    /// Renderable indices drawn regardless of frustum.
    always_drawn: Vec<u32>,
    /// Hierarchy over the cullable set, bounds stored in the leaves.
    bvh: Bvh,
    /// Resolved technique per (renderable index, phase), fallbacks applied.
    resolved: HashMap<(u32, String), Technique>,
    /// Merged descriptor layout per phase.
    phase_layouts: HashMap<String, GpuDescriptorLayout>,
    /// Graphics pipeline per (phase, program).
    pipelines: HashMap<(String, String), GpuPipeline>,
}

/// Backend objects resolved for one render pass this frame.
#[derive(Debug, Clone)]
struct BakedRenderPass {
    render_pass: GpuRenderPass,
    framebuffer: GpuFramebuffer,
    area: Rect2d,
    clears: Vec<ClearValue>,
}

/// Backend objects resolved for one compute pass this frame.
#[derive(Debug, Clone, Copy)]
struct BakedComputePass {
    pipeline: GpuPipeline,
    group: GpuBindGroup,
}

/// The per-frame orchestrator.
#[derive(Debug, Default)]
pub struct GraphScheduler {
    resources: ResourceGraph,
    graph: RenderGraph,
    access: AccessGraph,
    caches: SchedulerCaches,
    warm: WarmData,
    state: SchedulerState,
    /// Bind groups per queue/pass name, allocated once and refreshed every
    /// frame.
    bind_groups: HashMap<String, GpuBindGroup>,
    frame_counter: u64,
}

impl GraphScheduler {
    /// Create a cold scheduler with empty graphs.
    pub fn new() -> Self {
        Self::default()
    }

    /// The resource registry (declaration surface).
    pub fn resources(&self) -> &ResourceGraph {
        &self.resources
    }

    /// Mutable access to the resource registry.
    pub fn resources_mut(&mut self) -> &mut ResourceGraph {
        &mut self.resources
    }

    /// Mutable access to this frame's pass graph (builder surface).
    pub fn graph_mut(&mut self) -> &mut RenderGraph {
        &mut self.graph
    }

    /// This frame's derived access state (empty between frames).
    pub fn access(&self) -> &AccessGraph {
        &self.access
    }

    /// The backend-object memoization caches.
    pub fn caches(&self) -> &SchedulerCaches {
        &self.caches
    }

    /// Check whether warm-up has run.
    pub fn is_warm(&self) -> bool {
        self.state == SchedulerState::Warm
    }

    /// Force the warm-up step to repeat in full on the next `execute`.
    pub fn request_warm_up(&mut self) {
        log::debug!("warm-up requested");
        self.state = SchedulerState::Cold;
    }

    /// Build, analyze and encode one frame.
    ///
    /// # Panics
    ///
    /// Panics on configuration errors: a referenced resource that was never
    /// declared, a queue camera missing from the scene, or a renderable
    /// lacking a technique for an active phase with no registered fallback.
    pub fn execute(
        &mut self,
        device: &dyn RenderDevice,
        recorder: &mut dyn CommandRecorder,
        scene: &dyn SceneView,
    ) -> Result<(), FrameGraphError> {
        self.resources.set_frame_index(self.frame_counter as u32);
        self.access.analyze(&self.graph, &mut self.resources);

        if self.state == SchedulerState::Cold {
            self.warm_up(device, scene)?;
            self.state = SchedulerState::Warm;
        }

        let visible = self.cull(scene);
        let (baked_render, baked_compute) = self.preprocess(device)?;
        self.encode(recorder, scene, &visible, &baked_render, &baked_compute);

        self.graph.clear();
        self.access.clear();
        self.frame_counter += 1;
        Ok(())
    }

    /// One-time (per COLD cycle) scene digestion and backend baking.
    fn warm_up(
        &mut self,
        device: &dyn RenderDevice,
        scene: &dyn SceneView,
    ) -> Result<(), FrameGraphError> {
        let renderables = scene.renderables();
        let mut cullable = Vec::new();
        let mut always_drawn = Vec::new();
        for (index, renderable) in renderables.iter().enumerate() {
            if renderable.cullable {
                cullable.push((index as u32, renderable.bounds));
            } else {
                always_drawn.push(index as u32);
            }
        }
        let bvh = Bvh::build(&cullable);

        // Phases actually drawn this frame, in declaration order.
        let mut phases: Vec<String> = Vec::new();
        for queue in self.graph.queues() {
            if !phases.iter().any(|phase| phase == queue.phase()) {
                phases.push(queue.phase().to_string());
            }
        }

        let mut resolved = HashMap::new();
        for phase in &phases {
            for (index, renderable) in renderables.iter().enumerate() {
                let technique = match renderable.techniques.get(phase) {
                    Some(technique) => technique.clone(),
                    None => match scene.fallback_technique(phase) {
                        Some(technique) => {
                            log::warn!(
                                "renderable '{}' has no technique for phase '{phase}', \
                                 substituting fallback '{}'",
                                renderable.label,
                                technique.program
                            );
                            technique.clone()
                        }
                        None => panic!(
                            "renderable '{}' has no technique for phase '{phase}' \
                             and no fallback is registered",
                            renderable.label
                        ),
                    },
                };
                resolved.insert((index as u32, phase.clone()), technique);
            }
        }

        // Merged descriptor layout per phase: graph-declared queue bindings
        // plus the material bindings of every technique touching the phase.
        let mut phase_layouts = HashMap::new();
        let mut phase_pipeline_layouts = HashMap::new();
        for phase in &phases {
            let mut bindings: Vec<DescriptorBinding> = Vec::new();
            for queue in self.graph.queues() {
                if queue.phase() != phase {
                    continue;
                }
                for binding in queue.bindings() {
                    bindings.push(DescriptorBinding {
                        name: binding.binding.clone(),
                        kind: binding.kind,
                        rate: BindingRate::PerPass,
                    });
                }
            }
            for ((_, technique_phase), technique) in &resolved {
                if technique_phase == phase {
                    bindings.extend(technique.layout.bindings.iter().cloned());
                }
            }
            bindings.sort_by(|a, b| a.name.cmp(&b.name));
            bindings.dedup_by(|a, b| a.name == b.name);

            let desc = DescriptorLayoutDescriptor { bindings };
            let layout = self
                .caches
                .descriptor_layouts
                .get_or_create(&desc, || device.create_descriptor_layout(&desc))?;
            let pipeline_desc = PipelineLayoutDescriptor {
                set_layouts: vec![layout],
            };
            let pipeline_layout = self
                .caches
                .pipeline_layouts
                .get_or_create(&pipeline_desc, || {
                    device.create_pipeline_layout(&pipeline_desc)
                })?;
            phase_layouts.insert(phase.clone(), layout);
            phase_pipeline_layouts.insert(phase.clone(), pipeline_layout);
        }

        // Graphics pipelines per (phase, program), baked against the render
        // pass hosting the phase.
        let mut pipelines = HashMap::new();
        for (index, pass) in self.graph.passes().iter().enumerate() {
            let PassNode::Render(node) = pass else {
                continue;
            };
            let Some(info) = self.access.render_pass_info(index as PassIndex) else {
                continue;
            };
            let render_pass = self
                .caches
                .render_passes
                .get_or_create(&info.desc, || device.create_render_pass(&info.desc))?;
            for &queue_index in node.queues() {
                let phase = self.graph.queue(queue_index).phase().to_string();
                let layout = phase_pipeline_layouts[&phase];
                for ((_, technique_phase), technique) in &resolved {
                    if technique_phase != &phase {
                        continue;
                    }
                    let key = (phase.clone(), technique.program.clone());
                    if pipelines.contains_key(&key) {
                        continue;
                    }
                    let desc = GraphicsPipelineDescriptor {
                        program: technique.program.clone(),
                        layout,
                        render_pass,
                        rate: BindingRate::PerDraw,
                    };
                    let pipeline = self
                        .caches
                        .pipelines
                        .get_or_create(&desc, || device.create_graphics_pipeline(&desc))?;
                    pipelines.insert(key, pipeline);
                }
            }
        }

        log::info!(
            "warm-up complete: {} renderables ({} cullable), {} phases, {} pipelines",
            renderables.len(),
            cullable.len(),
            phases.len(),
            pipelines.len()
        );
        self.warm = WarmData {
            always_drawn,
            bvh,
            resolved,
            phase_layouts,
            pipelines,
        };
        Ok(())
    }

    /// Visible renderable indices per active camera.
    fn cull(&self, scene: &dyn SceneView) -> HashMap<String, Vec<u32>> {
        let mut visible = HashMap::new();
        for queue in self.graph.queues() {
            let Some(camera_name) = queue.camera() else {
                continue;
            };
            if visible.contains_key(camera_name) {
                continue;
            }
            let camera = scene.camera(camera_name).unwrap_or_else(|| {
                panic!("camera '{camera_name}' is not part of the scene")
            });
            let ids = if camera.culling_enabled {
                let mut ids = self.warm.always_drawn.clone();
                let frustum = Frustum::from_view_projection(&camera.view_projection);
                self.warm.bvh.query(&frustum, &mut ids);
                ids
            } else {
                (0..scene.renderables().len() as u32).collect()
            };
            log::trace!(
                "camera '{camera_name}': {} of {} renderables visible",
                ids.len(),
                scene.renderables().len()
            );
            visible.insert(camera_name.to_string(), ids);
        }
        visible
    }

    /// Mount resources and resolve backend objects for every pass.
    #[allow(clippy::type_complexity)]
    fn preprocess(
        &mut self,
        device: &dyn RenderDevice,
    ) -> Result<
        (
            HashMap<PassIndex, BakedRenderPass>,
            HashMap<PassIndex, BakedComputePass>,
        ),
        FrameGraphError,
    > {
        let mut baked_render = HashMap::new();
        let mut baked_compute = HashMap::new();

        for (index, pass) in self.graph.passes().iter().enumerate() {
            let pass_index = index as PassIndex;
            match pass {
                PassNode::Render(node) => {
                    for attachment in node.attachments() {
                        mount_with_origin(&mut self.resources, device, &attachment.resource)?;
                    }
                    for &queue_index in node.queues() {
                        for binding in self.graph.queue(queue_index).bindings() {
                            mount_with_origin(&mut self.resources, device, &binding.resource)?;
                        }
                    }

                    let info = self
                        .access
                        .render_pass_info(pass_index)
                        .unwrap_or_else(|| {
                            panic!("render pass '{}' was never analyzed", node.name())
                        });
                    let render_pass = self
                        .caches
                        .render_passes
                        .get_or_create(&info.desc, || device.create_render_pass(&info.desc))?;

                    let fb_info = self.access.framebuffer_info(pass_index).unwrap_or_else(|| {
                        panic!("render pass '{}' was never analyzed", node.name())
                    });
                    let fb_desc = FramebufferDescriptor {
                        render_pass,
                        attachments: fb_info
                            .attachments
                            .iter()
                            .map(|name| self.resources.image_view(name))
                            .collect(),
                        extent: fb_info.extent,
                        layers: fb_info.layers,
                    };
                    let framebuffer = self
                        .caches
                        .framebuffers
                        .get_or_create(&fb_desc, || device.create_framebuffer(&fb_desc))?;
                    baked_render.insert(
                        pass_index,
                        BakedRenderPass {
                            render_pass,
                            framebuffer,
                            area: Rect2d::from_extent(fb_info.extent),
                            clears: info.clears.clone(),
                        },
                    );

                    for &queue_index in node.queues() {
                        let queue = self.graph.queue(queue_index);
                        let layout = *self
                            .warm
                            .phase_layouts
                            .get(queue.phase())
                            .unwrap_or_else(|| {
                                panic!(
                                    "phase '{}' was declared after warm-up; \
                                     call request_warm_up()",
                                    queue.phase()
                                )
                            });
                        let group = match self.bind_groups.get(queue.name()) {
                            Some(&group) => group,
                            None => {
                                let group = device.create_bind_group(layout)?;
                                self.bind_groups.insert(queue.name().to_string(), group);
                                group
                            }
                        };
                        let entries = resolve_bindings(&self.resources, queue.bindings());
                        device.update_bind_group(group, &entries);
                    }
                }
                PassNode::Compute(node) => {
                    for binding in node.bindings() {
                        mount_with_origin(&mut self.resources, device, &binding.resource)?;
                    }

                    let mut bindings: Vec<DescriptorBinding> = node
                        .bindings()
                        .iter()
                        .map(|binding| DescriptorBinding {
                            name: binding.binding.clone(),
                            kind: binding.kind,
                            rate: BindingRate::PerPass,
                        })
                        .collect();
                    bindings.sort_by(|a, b| a.name.cmp(&b.name));
                    let layout_desc = DescriptorLayoutDescriptor { bindings };
                    let layout = self.caches.descriptor_layouts.get_or_create(
                        &layout_desc,
                        || device.create_descriptor_layout(&layout_desc),
                    )?;
                    let pipeline_layout_desc = PipelineLayoutDescriptor {
                        set_layouts: vec![layout],
                    };
                    let pipeline_layout = self.caches.pipeline_layouts.get_or_create(
                        &pipeline_layout_desc,
                        || device.create_pipeline_layout(&pipeline_layout_desc),
                    )?;
                    let pipeline_desc = ComputePipelineDescriptor {
                        program: node.program().to_string(),
                        layout: pipeline_layout,
                    };
                    let pipeline = self.caches.pipelines.get_or_create(&pipeline_desc, || {
                        device.create_compute_pipeline(&pipeline_desc)
                    })?;

                    let group = match self.bind_groups.get(node.name()) {
                        Some(&group) => group,
                        None => {
                            let group = device.create_bind_group(layout)?;
                            self.bind_groups.insert(node.name().to_string(), group);
                            group
                        }
                    };
                    let entries = resolve_bindings(&self.resources, node.bindings());
                    device.update_bind_group(group, &entries);
                    baked_compute.insert(pass_index, BakedComputePass { pipeline, group });
                }
                PassNode::Copy(node) => {
                    // Copy passes only need their resources mounted.
                    for op in node.ops() {
                        match op {
                            CopyOp::Pair(CopyRegion::Buffer { src, dst, .. })
                            | CopyOp::Pair(CopyRegion::Image { src, dst, .. }) => {
                                mount_with_origin(&mut self.resources, device, src)?;
                                mount_with_origin(&mut self.resources, device, dst)?;
                            }
                            CopyOp::Fill { dst, .. } => {
                                mount_with_origin(&mut self.resources, device, dst)?;
                            }
                            CopyOp::Upload { staging, dst, .. } => {
                                mount_with_origin(&mut self.resources, device, staging)?;
                                mount_with_origin(&mut self.resources, device, dst)?;
                            }
                        }
                    }
                }
            }
        }
        Ok((baked_render, baked_compute))
    }

    /// Record barriers and commands for every pass, in declaration order.
    fn encode(
        &self,
        recorder: &mut dyn CommandRecorder,
        scene: &dyn SceneView,
        visible: &HashMap<String, Vec<u32>>,
        baked_render: &HashMap<PassIndex, BakedRenderPass>,
        baked_compute: &HashMap<PassIndex, BakedComputePass>,
    ) {
        for (index, pass) in self.graph.passes().iter().enumerate() {
            let pass_index = index as PassIndex;
            self.encode_barriers(recorder, pass_index);

            match pass {
                PassNode::Render(node) => {
                    let baked = &baked_render[&pass_index];
                    recorder.begin_render_pass(
                        baked.render_pass,
                        baked.framebuffer,
                        baked.area,
                        &baked.clears,
                    );
                    for &queue_index in node.queues() {
                        let queue = self.graph.queue(queue_index);
                        let viewport = queue
                            .viewport()
                            .unwrap_or_else(|| viewport_for(baked.area));
                        recorder.set_viewport(viewport);

                        let group = self.bind_groups[queue.name()];
                        let ids: Vec<u32> = match queue.camera() {
                            Some(camera) => visible[camera].clone(),
                            None => (0..scene.renderables().len() as u32).collect(),
                        };
                        for id in ids {
                            let renderable = &scene.renderables()[id as usize];
                            let phase = queue.phase().to_string();
                            let Some(technique) = self.warm.resolved.get(&(id, phase.clone()))
                            else {
                                continue;
                            };
                            let pipeline =
                                self.warm.pipelines[&(phase, technique.program.clone())];
                            recorder.bind_graphics_pipeline(pipeline);
                            recorder.bind_descriptor_set(BindingRate::PerPass, group);
                            if !renderable.constants.is_empty() {
                                recorder.push_constants(&renderable.constants);
                            }
                            recorder.bind_vertex_buffer(renderable.vertex_buffer);
                            match renderable.index_buffer {
                                Some(index_buffer) => {
                                    recorder.bind_index_buffer(index_buffer);
                                    recorder.draw_indexed(renderable.index_count, 1);
                                }
                                None => recorder.draw(renderable.vertex_count, 1),
                            }
                        }
                    }
                    recorder.end_render_pass();
                }
                PassNode::Compute(node) => {
                    let baked = &baked_compute[&pass_index];
                    recorder.bind_compute_pipeline(baked.pipeline);
                    recorder.bind_descriptor_set(BindingRate::PerPass, baked.group);
                    let (x, y, z) = node.dispatch();
                    recorder.dispatch(x, y, z);
                }
                PassNode::Copy(node) => {
                    for op in node.ops() {
                        self.encode_copy_op(recorder, op);
                    }
                }
            }
        }

        // Trailing present transitions, once, after the last pass.
        let presents = self.access.present_barriers();
        if !presents.is_empty() {
            for barrier in presents {
                recorder.append_image_barrier(
                    self.resources.image(&barrier.resource),
                    barrier.old_layout,
                    barrier.new_layout,
                    barrier.src,
                    barrier.dst,
                    barrier.aspects,
                );
            }
            recorder.apply_barriers();
        }
    }

    /// Apply a pass's synthesized barriers before its commands.
    fn encode_barriers(&self, recorder: &mut dyn CommandRecorder, pass: PassIndex) {
        let buffer_barriers = self.access.buffer_barriers(pass);
        let image_barriers = self.access.image_barriers(pass);
        if buffer_barriers.is_empty() && image_barriers.is_empty() {
            return;
        }
        for barrier in buffer_barriers {
            recorder.append_buffer_barrier(
                self.resources.buffer(&barrier.resource),
                barrier.src,
                barrier.dst,
            );
        }
        for barrier in image_barriers {
            recorder.append_image_barrier(
                self.resources.image(&barrier.resource),
                barrier.old_layout,
                barrier.new_layout,
                barrier.src,
                barrier.dst,
                barrier.aspects,
            );
        }
        recorder.apply_barriers();
    }

    fn encode_copy_op(&self, recorder: &mut dyn CommandRecorder, op: &CopyOp) {
        match op {
            CopyOp::Pair(CopyRegion::Buffer {
                src,
                dst,
                src_offset,
                dst_offset,
                size,
            }) => {
                recorder.copy_buffer(
                    self.resources.buffer(src),
                    self.resources.buffer(dst),
                    *src_offset,
                    *dst_offset,
                    *size,
                );
            }
            CopyOp::Pair(CopyRegion::Image { src, dst, extent }) => {
                recorder.copy_image(
                    self.resources.image(src),
                    self.resources.image(dst),
                    *extent,
                );
            }
            CopyOp::Fill {
                dst,
                offset,
                size,
                value,
            } => {
                recorder.fill_buffer(self.resources.buffer(dst), *offset, *size, *value);
            }
            CopyOp::Upload {
                staging,
                data,
                dst,
                offset,
            } => {
                recorder.upload_buffer(
                    self.resources.buffer(staging),
                    data,
                    self.resources.buffer(dst),
                    *offset,
                );
            }
        }
    }

    /// Release every mounted resource and drop all caches.
    pub fn teardown(&mut self, device: &dyn RenderDevice) {
        self.resources.teardown(device);
        self.caches.clear();
        self.bind_groups.clear();
        self.state = SchedulerState::Cold;
    }
}

/// Mount a resource, mounting its origin first when it is a view.
fn mount_with_origin(
    resources: &mut ResourceGraph,
    device: &dyn RenderDevice,
    name: &str,
) -> Result<(), FrameGraphError> {
    let origin = resources.origin_of(name).to_string();
    if origin != name {
        resources.mount(&origin, device)?;
    }
    resources.mount(name, device)
}

/// Resolve declared bindings to current backend handles.
fn resolve_bindings(resources: &ResourceGraph, bindings: &[Binding]) -> Vec<BindGroupEntry> {
    bindings
        .iter()
        .map(|binding| BindGroupEntry {
            name: binding.binding.clone(),
            resource: resolve_binding(resources, binding),
        })
        .collect()
}

fn resolve_binding(resources: &ResourceGraph, binding: &Binding) -> BoundResource {
    let name = binding.resource.as_str();
    match binding.kind {
        DescriptorKind::Sampler => BoundResource::Sampler(resources.sampler(name)),
        DescriptorKind::SampledImage => {
            let aspects = resources.aspects_of(name);
            let layout = if aspects.intersects(ImageAspects::DEPTH | ImageAspects::STENCIL) {
                ImageLayout::DepthStencilReadOnly
            } else {
                ImageLayout::ShaderReadOnly
            };
            BoundResource::ImageView {
                view: resources.image_view(name),
                layout,
            }
        }
        DescriptorKind::StorageImage => BoundResource::ImageView {
            view: resources.image_view(name),
            layout: ImageLayout::General,
        },
        DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer => {
            let is_buffer_view =
                resources.node(name).is_view() && resources.format_of(name).is_none();
            if is_buffer_view {
                BoundResource::BufferView(resources.buffer_view(name))
            } else {
                BoundResource::Buffer(resources.buffer(name))
            }
        }
    }
}

/// Full-area viewport with the default depth range.
fn viewport_for(area: Rect2d) -> Viewport {
    Viewport {
        x: area.x as f32,
        y: area.y as f32,
        width: area.width as f32,
        height: area.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BufferDescriptor, BufferUsage, ImageDescriptor, ImageUsage, NullDevice, NullRecorder,
        RecordedOp, SwapchainDescriptor,
    };
    use super::cull::Aabb;
    use crate::resource::Residency;
    use crate::scene::{Camera, Renderable, SceneData};
    use crate::types::{Extent3d, Format, LoadOp, ResourceAccess, StoreOp};
    use glam::{Mat4, Vec3};

    fn basic_renderable(label: &str, phase: &str, bounds: Aabb) -> Renderable {
        let mut techniques = HashMap::new();
        techniques.insert(phase.to_string(), Technique::new("forward"));
        Renderable {
            label: label.to_string(),
            bounds,
            techniques,
            vertex_buffer: crate::backend::GpuBuffer::from_raw(1000),
            index_buffer: None,
            vertex_count: 36,
            index_count: 0,
            constants: Vec::new(),
            cullable: true,
        }
    }

    fn declare_frame(scheduler: &mut GraphScheduler) {
        scheduler.resources_mut().import_swapchain(
            "backbuffer",
            SwapchainDescriptor {
                label: None,
                extent: Extent3d::new_2d(640, 480),
                format: Format::Bgra8Unorm,
                image_count: 3,
            },
        );
        scheduler.resources_mut().add_buffer(
            "scene/uniforms",
            BufferDescriptor::new(256, BufferUsage::UNIFORM),
            Residency::Persistent,
        );
        scheduler
            .graph_mut()
            .add_render_pass("main")
            .add_color(
                "backbuffer",
                LoadOp::Clear,
                StoreOp::Store,
                ClearValue::Color([0.0; 4]),
            )
            .add_queue("opaque")
            .add_camera("camera/main")
            .add_uniform_buffer("scene/uniforms", "u_scene");
    }

    fn wide_open_scene(phase: &str, count: usize) -> SceneData {
        let mut scene = SceneData::new();
        scene.add_camera(Camera::new(
            "camera/main",
            Mat4::orthographic_rh(-100.0, 100.0, -100.0, 100.0, -100.0, 100.0),
        ));
        for index in 0..count {
            scene.add_renderable(basic_renderable(
                &format!("item{index}"),
                phase,
                Aabb::new(
                    Vec3::new(index as f32 * 3.0, 0.0, 0.0),
                    Vec3::new(index as f32 * 3.0 + 1.0, 1.0, 1.0),
                ),
            ));
        }
        scene
    }

    #[test]
    fn test_full_frame_op_ordering() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();
        let scene = wide_open_scene("opaque", 1);

        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let ops = recorder.ops();
        assert!(!ops.is_empty());

        // All of the pass's barriers precede its first command.
        let begin = ops
            .iter()
            .position(|op| matches!(op, RecordedOp::BeginRenderPass { .. }))
            .expect("render pass was encoded");
        assert!(ops[..begin].iter().all(RecordedOp::is_barrier));
        assert!(ops[..begin]
            .iter()
            .any(|op| matches!(op, RecordedOp::ImageBarrier { .. })));

        // One draw for the single visible renderable.
        let draws = ops
            .iter()
            .filter(|op| matches!(op, RecordedOp::Draw { .. }))
            .count();
        assert_eq!(draws, 1);

        // The present transition is the final barrier batch.
        let last_image_barrier = ops
            .iter()
            .rposition(|op| matches!(op, RecordedOp::ImageBarrier { .. }))
            .unwrap();
        assert!(matches!(
            ops[last_image_barrier],
            RecordedOp::ImageBarrier {
                new_layout: ImageLayout::Present,
                ..
            }
        ));
        assert_eq!(ops[last_image_barrier + 1], RecordedOp::ApplyBarriers);
        assert_eq!(last_image_barrier + 2, ops.len());

        // Pass graph is cleared, resource registry persists.
        assert!(scheduler.graph_mut().is_empty());
        assert!(scheduler.resources().contains("backbuffer"));
        assert!(scheduler.is_warm());
    }

    #[test]
    fn test_warm_state_reuses_cached_objects() {
        let device = NullDevice::new();
        let mut scheduler = GraphScheduler::new();
        let scene = wide_open_scene("opaque", 2);

        let mut recorder = NullRecorder::new();
        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();
        let first_pass_id = recorder
            .ops()
            .iter()
            .find_map(|op| match op {
                RecordedOp::BeginRenderPass { render_pass, .. } => Some(*render_pass),
                _ => None,
            })
            .unwrap();
        let render_passes = scheduler.caches().render_passes.len();
        let pipelines = scheduler.caches().pipelines.len();

        // Second frame, no structural change, no warm-up request.
        let mut recorder = NullRecorder::new();
        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();
        let second_pass_id = recorder
            .ops()
            .iter()
            .find_map(|op| match op {
                RecordedOp::BeginRenderPass { render_pass, .. } => Some(*render_pass),
                _ => None,
            })
            .unwrap();

        assert_eq!(first_pass_id, second_pass_id);
        assert_eq!(scheduler.caches().render_passes.len(), render_passes);
        assert_eq!(scheduler.caches().pipelines.len(), pipelines);
        assert!(scheduler.is_warm());
    }

    #[test]
    fn test_frustum_culling_limits_draws() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();

        // Camera covering only item 4's bounds.
        let mut scene = wide_open_scene("opaque", 10);
        scene.add_camera(Camera::new(
            "camera/main",
            Mat4::orthographic_rh(11.5, 13.5, -10.0, 10.0, -10.0, 10.0),
        ));

        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let draws = recorder
            .ops()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Draw { .. }))
            .count();
        assert_eq!(draws, 1);
    }

    #[test]
    fn test_disabled_culling_draws_everything() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();

        let mut scene = wide_open_scene("opaque", 10);
        let mut camera = Camera::new(
            "camera/main",
            Mat4::orthographic_rh(11.5, 13.5, -10.0, 10.0, -10.0, 10.0),
        );
        camera.culling_enabled = false;
        scene.add_camera(camera);

        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let draws = recorder
            .ops()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Draw { .. }))
            .count();
        assert_eq!(draws, 10);
    }

    #[test]
    fn test_always_drawn_bypasses_frustum() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();

        let mut scene = wide_open_scene("opaque", 2);
        scene.renderables[1].cullable = false;
        // Frustum excluding both items' bounds.
        scene.add_camera(Camera::new(
            "camera/main",
            Mat4::orthographic_rh(500.0, 600.0, -10.0, 10.0, -10.0, 10.0),
        ));

        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        // Only the always-drawn item survives.
        let draws = recorder
            .ops()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Draw { .. }))
            .count();
        assert_eq!(draws, 1);
    }

    #[test]
    #[should_panic(expected = "no technique for phase")]
    fn test_missing_technique_without_fallback_is_fatal() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();

        let mut scene = wide_open_scene("opaque", 1);
        scene.renderables[0].techniques.clear();

        declare_frame(&mut scheduler);
        let _ = scheduler.execute(&device, &mut recorder, &scene);
    }

    #[test]
    fn test_missing_technique_with_fallback_recovers() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();

        let mut scene = wide_open_scene("opaque", 1);
        scene.renderables[0].techniques.clear();
        scene.add_fallback("opaque", Technique::new("fallback"));

        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let draws = recorder
            .ops()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Draw { .. }))
            .count();
        assert_eq!(draws, 1);
    }

    #[test]
    #[should_panic(expected = "was never declared")]
    fn test_undeclared_resource_is_fatal() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();
        let scene = wide_open_scene("opaque", 1);

        scheduler.graph_mut().add_render_pass("main").add_color(
            "nonexistent",
            LoadOp::Clear,
            StoreOp::Store,
            ClearValue::Color([0.0; 4]),
        );
        let _ = scheduler.execute(&device, &mut recorder, &scene);
    }

    #[test]
    fn test_request_warm_up_forces_cold() {
        let device = NullDevice::new();
        let mut scheduler = GraphScheduler::new();
        let scene = wide_open_scene("opaque", 1);

        let mut recorder = NullRecorder::new();
        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();
        assert!(scheduler.is_warm());

        scheduler.request_warm_up();
        assert!(!scheduler.is_warm());

        let mut recorder = NullRecorder::new();
        declare_frame(&mut scheduler);
        scheduler.execute(&device, &mut recorder, &scene).unwrap();
        assert!(scheduler.is_warm());
    }

    #[test]
    fn test_copy_pass_encodes_transfers() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();
        let scene = SceneData::new();

        scheduler.resources_mut().add_buffer(
            "mesh/vertices",
            BufferDescriptor::new(1024, BufferUsage::VERTEX | BufferUsage::COPY_DST),
            Residency::Persistent,
        );
        let mut resources = std::mem::take(scheduler.resources_mut());
        scheduler
            .graph_mut()
            .add_copy_pass("uploads")
            .upload_buffer(&mut resources, &[7u8; 64], "mesh/vertices", 0)
            .fill(0, 256, "mesh/vertices", 64);
        *scheduler.resources_mut() = resources;

        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let ops = recorder.ops();
        let upload = ops
            .iter()
            .position(|op| matches!(op, RecordedOp::UploadBuffer { .. }))
            .expect("upload encoded");
        let fill = ops
            .iter()
            .position(|op| matches!(op, RecordedOp::FillBuffer { .. }))
            .expect("fill encoded");
        assert!(upload < fill);
        // Barriers for the copy pass precede its first transfer.
        assert!(ops[..upload].iter().all(RecordedOp::is_barrier));
    }

    #[test]
    fn test_compute_pass_dispatch() {
        let device = NullDevice::new();
        let mut recorder = NullRecorder::new();
        let mut scheduler = GraphScheduler::new();
        let scene = SceneData::new();

        scheduler.resources_mut().add_buffer(
            "particles",
            BufferDescriptor::new(4096, BufferUsage::STORAGE),
            Residency::Persistent,
        );
        scheduler
            .graph_mut()
            .add_compute_pass("simulate")
            .set_program_name("particle_sim")
            .add_resource("particles", "b_particles", ResourceAccess::ReadWrite)
            .set_dispatch(16, 8, 1);

        scheduler.execute(&device, &mut recorder, &scene).unwrap();

        let ops = recorder.ops();
        let dispatch = ops
            .iter()
            .position(|op| matches!(op, RecordedOp::Dispatch { x: 16, y: 8, z: 1 }))
            .expect("dispatch encoded");
        assert!(ops[..dispatch - 2].iter().all(RecordedOp::is_barrier));
        assert!(matches!(
            ops[dispatch - 2],
            RecordedOp::BindComputePipeline(_)
        ));
    }
}
