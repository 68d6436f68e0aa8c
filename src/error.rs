//! Frame graph error types.

use thiserror::Error;

/// Errors that can occur while building backend objects for a frame.
///
/// Configuration mistakes (referencing an undeclared resource, a missing
/// technique with no registered fallback) are programming errors and panic
/// with a diagnostic naming the offending resource or pass instead of
/// returning one of these variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameGraphError {
    /// The device failed to create a backend object.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,
    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,
    /// An invalid parameter was provided to the device.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
