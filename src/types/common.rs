//! Extents, viewports, clear values and attachment operations.

/// Three-dimensional extent of an image or framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels (1 for 2D images).
    pub depth: u32,
}

impl Extent3d {
    /// Create a 2D extent with depth 1.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Component-wise minimum of two extents.
    ///
    /// Used to derive a framebuffer size that fits inside all attachments.
    pub fn min(self, other: Self) -> Self {
        Self {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
            depth: self.depth.min(other.depth),
        }
    }
}

impl Default for Extent3d {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            depth: 1,
        }
    }
}

/// Rectangular region in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect2d {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect2d {
    /// Create a rectangle anchored at the origin.
    pub fn from_extent(extent: Extent3d) -> Self {
        Self {
            x: 0,
            y: 0,
            width: extent.width,
            height: extent.height,
        }
    }
}

/// Viewport configuration for a render queue.
///
/// Depth range follows the `[0, 1]` convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X coordinate of the viewport's top-left corner.
    pub x: f32,
    /// Y coordinate of the viewport's top-left corner.
    pub y: f32,
    /// Width of the viewport.
    pub width: f32,
    /// Height of the viewport.
    pub height: f32,
    /// Minimum depth value (default: 0.0).
    pub min_depth: f32,
    /// Maximum depth value (default: 1.0).
    pub max_depth: f32,
}

impl Viewport {
    /// Create a new viewport with standard `[0, 1]` depth range.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// What to do with an attachment's contents when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadOp {
    /// Preserve the existing contents.
    Load,
    /// Clear to the attachment's clear value.
    #[default]
    Clear,
    /// Contents are undefined; cheapest option when fully overwritten.
    DontCare,
}

/// What to do with an attachment's contents when a render pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    /// Write the results back to memory.
    #[default]
    Store,
    /// Discard the results.
    Discard,
}

/// Clear value for an attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Clear color as `[r, g, b, a]`.
    Color([f32; 4]),
    /// Clear depth and stencil values.
    DepthStencil {
        /// Depth clear value.
        depth: f32,
        /// Stencil clear value.
        stencil: u32,
    },
}

impl Default for ClearValue {
    fn default() -> Self {
        Self::Color([0.0, 0.0, 0.0, 1.0])
    }
}

/// Update-frequency class of a descriptor binding.
///
/// Descriptor sets are bound per rate; lower-frequency sets stay bound
/// across higher-frequency rebinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingRate {
    /// Bound once per pass.
    PerPass,
    /// Bound once per batch of draws sharing bindings.
    PerBatch,
    /// Bound per instanced group.
    PerInstance,
    /// Bound per individual draw.
    PerDraw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_min() {
        let a = Extent3d::new_2d(1920, 1080);
        let b = Extent3d::new_2d(1280, 1440);
        let min = a.min(b);
        assert_eq!(min.width, 1280);
        assert_eq!(min.height, 1080);
        assert_eq!(min.depth, 1);
    }

    #[test]
    fn test_rect_from_extent() {
        let rect = Rect2d::from_extent(Extent3d::new_2d(800, 600));
        assert_eq!(rect.x, 0);
        assert_eq!(rect.width, 800);
        assert_eq!(rect.height, 600);
    }
}
