//! Pixel formats and their aspect helpers.

use super::sync::ImageAspects;

/// Pixel format of an image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Format {
    /// 8-bit red channel, unsigned integer (also used for shading-rate images).
    R8Uint,
    /// 32-bit red channel, float.
    R32Float,
    /// 16-bit RG channels, float.
    Rg16Float,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized (common swapchain format).
    Bgra8Unorm,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,

    // Depth/stencil formats
    /// 16-bit depth.
    Depth16Unorm,
    /// 32-bit depth, float.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit depth float with 8-bit stencil.
    Depth32FloatStencil8,
}

impl Format {
    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            Self::Depth16Unorm
                | Self::Depth32Float
                | Self::Depth24PlusStencil8
                | Self::Depth32FloatStencil8
        )
    }

    /// Returns true if this format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8 | Self::Depth32FloatStencil8)
    }

    /// Returns the image aspects covered by this format.
    ///
    /// Color formats map to `COLOR`, depth-only formats to `DEPTH`, and
    /// combined formats to `DEPTH | STENCIL`.
    pub fn aspects(&self) -> ImageAspects {
        if self.is_depth_stencil() {
            if self.has_stencil() {
                ImageAspects::DEPTH | ImageAspects::STENCIL
            } else {
                ImageAspects::DEPTH
            }
        } else {
            ImageAspects::COLOR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_stencil_classification() {
        assert!(Format::Depth32Float.is_depth_stencil());
        assert!(Format::Depth24PlusStencil8.is_depth_stencil());
        assert!(!Format::Rgba8Unorm.is_depth_stencil());

        assert!(Format::Depth24PlusStencil8.has_stencil());
        assert!(!Format::Depth32Float.has_stencil());
    }

    #[test]
    fn test_aspects() {
        assert_eq!(Format::Rgba8Unorm.aspects(), ImageAspects::COLOR);
        assert_eq!(Format::Depth16Unorm.aspects(), ImageAspects::DEPTH);
        assert_eq!(
            Format::Depth32FloatStencil8.aspects(),
            ImageAspects::DEPTH | ImageAspects::STENCIL
        );
    }
}
