//! Common types shared across the frame graph.

mod common;
mod format;
mod sync;

pub use common::{
    BindingRate, ClearValue, Extent3d, LoadOp, Rect2d, StoreOp, Viewport,
};
pub use format::Format;
pub use sync::{
    AccessFlags, ImageAspects, ImageLayout, PipelineStages, ResourceAccess, SyncScope,
};
