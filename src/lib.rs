//! Frame-graph based GPU frame scheduler.
//!
//! One frame's worth of GPU work is built from a declarative description:
//! a [`resource::ResourceGraph`] registers named resources with lazy
//! backing allocation, a [`graph::RenderGraph`] declares this frame's
//! passes and queues, an [`access::AccessGraph`] derives per-touch access
//! state and synthesizes barriers, and a [`scheduler::GraphScheduler`]
//! orchestrates warm-up, frustum culling, resource mounting and command
//! encoding. The graph is rebuilt every frame and discarded after
//! encoding; backing resources and baked backend objects persist.
//!
//! Passes execute in strict declaration order; nothing is reordered or
//! parallelized. The whole subsystem is single-threaded and synchronous
//! per frame.
//!
//! ```
//! use framegraph::backend::{ImageDescriptor, ImageUsage, NullDevice, NullRecorder};
//! use framegraph::resource::Residency;
//! use framegraph::scene::SceneData;
//! use framegraph::scheduler::GraphScheduler;
//! use framegraph::types::{ClearValue, Format, LoadOp, StoreOp};
//!
//! let device = NullDevice::new();
//! let mut recorder = NullRecorder::new();
//! let mut scheduler = GraphScheduler::new();
//! let scene = SceneData::new();
//!
//! scheduler.resources_mut().add_image(
//!     "target",
//!     ImageDescriptor::new_2d(640, 480, Format::Rgba8Unorm, ImageUsage::COLOR_ATTACHMENT),
//!     Residency::Persistent,
//! );
//! scheduler.graph_mut().add_render_pass("main").add_color(
//!     "target",
//!     LoadOp::Clear,
//!     StoreOp::Store,
//!     ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
//! );
//! scheduler.execute(&device, &mut recorder, &scene).unwrap();
//! ```

pub mod access;
pub mod backend;
pub mod error;
pub mod graph;
pub mod resource;
pub mod scene;
pub mod scheduler;
pub mod types;

pub use access::AccessGraph;
pub use error::FrameGraphError;
pub use graph::RenderGraph;
pub use resource::ResourceGraph;
pub use scheduler::GraphScheduler;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version. Call once at startup.
pub fn init() {
    log::info!("framegraph {VERSION}");
}
