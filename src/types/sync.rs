//! Access, stage and layout types used by barrier synthesis.

use bitflags::bitflags;

bitflags! {
    /// Memory access kinds performed by a pass on a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        /// Written as a color attachment.
        const COLOR_ATTACHMENT_WRITE = 1 << 0;
        /// Written as a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 1;
        /// Read as an input attachment.
        const INPUT_ATTACHMENT_READ = 1 << 2;
        /// Read as a shading-rate attachment.
        const SHADING_RATE_READ = 1 << 3;
        /// Read as a uniform buffer.
        const UNIFORM_READ = 1 << 4;
        /// Generic shader read (sampled image, storage read).
        const SHADER_READ = 1 << 5;
        /// Generic shader write (storage write).
        const SHADER_WRITE = 1 << 6;
        /// Source of a transfer operation.
        const TRANSFER_READ = 1 << 7;
        /// Destination of a transfer operation.
        const TRANSFER_WRITE = 1 << 8;
    }
}

impl AccessFlags {
    /// All write bits.
    pub const WRITES: Self = Self::COLOR_ATTACHMENT_WRITE
        .union(Self::DEPTH_STENCIL_ATTACHMENT_WRITE)
        .union(Self::SHADER_WRITE)
        .union(Self::TRANSFER_WRITE);

    /// Check whether this access contains no write bits.
    pub fn is_read_only(self) -> bool {
        !self.intersects(Self::WRITES)
    }
}

bitflags! {
    /// Pipeline stages at which an access occurs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PipelineStages: u32 {
        /// Start of the pipeline.
        const TOP_OF_PIPE = 1 << 0;
        /// Vertex shader execution.
        const VERTEX_SHADER = 1 << 1;
        /// Fragment shader execution.
        const FRAGMENT_SHADER = 1 << 2;
        /// Late depth/stencil tests.
        const LATE_FRAGMENT_TESTS = 1 << 3;
        /// Color attachment output.
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
        /// Compute shader execution.
        const COMPUTE_SHADER = 1 << 5;
        /// Transfer/copy operations.
        const TRANSFER = 1 << 6;
        /// End of the pipeline.
        const BOTTOM_OF_PIPE = 1 << 7;
    }
}

bitflags! {
    /// Aspects of an image covered by a view or barrier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImageAspects: u32 {
        /// Color aspect.
        const COLOR = 1 << 0;
        /// Depth aspect.
        const DEPTH = 1 << 1;
        /// Stencil aspect.
        const STENCIL = 1 << 2;
    }
}

/// Layout an image must be in for an access to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    /// Contents undefined; valid only as a transition source.
    #[default]
    Undefined,
    /// Any access; least optimal.
    General,
    /// Color attachment write.
    ColorAttachment,
    /// Depth/stencil attachment write.
    DepthStencilAttachment,
    /// Depth/stencil read-only (sampling plus read-only tests).
    DepthStencilReadOnly,
    /// Shader read-only (sampled image, input attachment).
    ShaderReadOnly,
    /// Shading-rate attachment read.
    ShadingRate,
    /// Source of a transfer operation.
    TransferSrc,
    /// Destination of a transfer operation.
    TransferDst,
    /// Ready for presentation.
    Present,
}

/// One half of a barrier: the stages and accesses on one side of a
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SyncScope {
    /// Pipeline stages participating in the access.
    pub stages: PipelineStages,
    /// Access kinds performed.
    pub access: AccessFlags,
}

impl SyncScope {
    /// Create a scope from stages and access flags.
    pub fn new(stages: PipelineStages, access: AccessFlags) -> Self {
        Self { stages, access }
    }

    /// Scope used before a resource's first access of the frame.
    pub fn none() -> Self {
        Self {
            stages: PipelineStages::TOP_OF_PIPE,
            access: AccessFlags::empty(),
        }
    }
}

/// Direction of a declared resource touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAccess {
    /// Read-only access.
    Read,
    /// Write-only access.
    Write,
    /// Read and write access.
    ReadWrite,
}

impl ResourceAccess {
    /// Check if this access includes reading.
    pub fn reads(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Check if this access includes writing.
    pub fn writes(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_read_only() {
        assert!(AccessFlags::UNIFORM_READ.is_read_only());
        assert!((AccessFlags::SHADER_READ | AccessFlags::INPUT_ATTACHMENT_READ).is_read_only());
        assert!(!AccessFlags::SHADER_WRITE.is_read_only());
        assert!(!(AccessFlags::SHADER_READ | AccessFlags::SHADER_WRITE).is_read_only());
    }

    #[test]
    fn test_resource_access() {
        assert!(ResourceAccess::Read.reads());
        assert!(!ResourceAccess::Read.writes());
        assert!(ResourceAccess::ReadWrite.reads());
        assert!(ResourceAccess::ReadWrite.writes());
        assert!(ResourceAccess::Write.writes());
    }

    #[test]
    fn test_sync_scope_none() {
        let scope = SyncScope::none();
        assert_eq!(scope.stages, PipelineStages::TOP_OF_PIPE);
        assert!(scope.access.is_empty());
    }
}
