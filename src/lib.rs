//! # vk-support
//!
//! Thin support layer over Vulkan for the pieces every renderer needs before
//! it can draw anything: image-state transition barriers, pixel format
//! classification and selection, and a fixed-duration benchmark loop.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ImageUsageState`] - the recognized image usage states and the access
//!   semantics each implies
//! - [`derive_barrier`] - pure derivation of access and stage masks for a
//!   state transition
//! - [`classify`] / [`supported_depth_format`] - format classification and a
//!   depth-format selection policy
//! - [`Benchmark`] - warm-up + fixed-duration sampling of a render step with
//!   CSV report output
//!
//! ## Example
//!
//! ```ignore
//! use vk_support::{derive_barrier, ImageUsageState, SubresourceRange};
//!
//! let spec = derive_barrier(
//!     format,
//!     ImageUsageState::TransferDst,
//!     ImageUsageState::ShaderReadOnly,
//!     SubresourceRange::default(),
//!     None,
//! )?;
//! vk_support::record_image_barrier(&device, cmd, image, &spec);
//! ```
//!
//! Barrier derivation and format classification are pure and thread-safe; the
//! benchmark loop is single-threaded and blocks for the duration of the run.

pub mod barrier;
pub mod benchmark;
pub mod device;
pub mod error;
pub mod format;
pub mod state;

// Re-export main types for convenience
pub use barrier::{
    derive_barrier, record_image_barrier, transition_image, BarrierSpec, PipelineStageHint,
    SubresourceRange,
};
pub use benchmark::{Benchmark, BenchmarkConfig, BenchmarkPhase, FrameStats};
pub use device::{DeviceIdentity, PhysicalDeviceCaps};
pub use error::{Result, SupportError};
pub use format::{
    classify, is_filterable, supported_depth_format, supported_depth_stencil_format,
    FormatCapabilities, FormatClass, DEPTH_FORMAT_CANDIDATES,
};
pub use state::{ImageId, ImageStateTracker, ImageUsageState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the support layer.
///
/// Only emits a log line; all functionality is usable without it.
pub fn init() {
    log::info!("vk-support v{VERSION} initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
