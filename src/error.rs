//! Error types for the support layer.

use ash::vk;
use thiserror::Error;

/// Errors surfaced by barrier derivation, format selection and report output.
#[derive(Error, Debug)]
pub enum SupportError {
    /// The requested subresource aspect is incompatible with the image format.
    ///
    /// Barrier construction is aborted; emitting a barrier with a wrong aspect
    /// mask would pass validation on some drivers and corrupt data on others.
    #[error("aspect {requested:?} is not valid for format {format:?}")]
    InvalidAspect {
        format: vk::Format,
        requested: vk::ImageAspectFlags,
    },
    /// None of the candidate depth formats is supported by the device.
    #[error("none of the candidate depth formats is supported by the device")]
    NoSupportedDepthFormat,
    /// The benchmark report destination could not be written.
    ///
    /// Non-critical: in-memory results stay valid, callers typically log and
    /// move on.
    #[error("failed to write benchmark report: {0}")]
    Io(#[from] std::io::Error),
    /// An underlying device-level call failed. Propagated verbatim; recovery
    /// policy (retry, abort, device-loss handling) is the caller's decision.
    #[error("device call failed: {0}")]
    Driver(#[from] vk::Result),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SupportError>;
