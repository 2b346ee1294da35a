//! Image usage states and the access semantics each one implies.
//!
//! An [`ImageUsageState`] names the role an image is currently serving
//! (render target, shader input, transfer destination, ...). Each state maps
//! to a canonical Vulkan layout and to the access masks a transition into or
//! out of that state must order against. The mapping is a finite lookup table,
//! which keeps it trivially testable by enumeration.
//!
//! The crate itself never remembers what state an image is in: every barrier
//! derivation takes the old state as an argument. Callers that want tracking
//! keep an [`ImageStateTracker`] of their own.

use std::collections::HashMap;

use ash::vk;
use ash::vk::Handle;

/// The semantic role an image is serving, abstracted over `VkImageLayout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageUsageState {
    /// Initial state, contents undefined. Can transition to any state.
    #[default]
    Undefined,
    /// General layout (least optimal but most flexible, storage access).
    General,
    /// Source of transfer (copy/blit) operations.
    TransferSrc,
    /// Destination of transfer (copy/blit) operations.
    TransferDst,
    /// Sampled by shaders, read-only.
    ShaderReadOnly,
    /// Written as a color attachment.
    ColorAttachment,
    /// Written as a depth/stencil attachment.
    DepthStencilAttachmentWrite,
    /// Depth/stencil attachment in read-only use (depth testing + sampling).
    DepthStencilAttachmentRead,
    /// Handed to the presentation engine.
    Present,
}

impl ImageUsageState {
    /// Every defined state, for enumeration in table-driven tests.
    pub const ALL: [ImageUsageState; 9] = [
        Self::Undefined,
        Self::General,
        Self::TransferSrc,
        Self::TransferDst,
        Self::ShaderReadOnly,
        Self::ColorAttachment,
        Self::DepthStencilAttachmentWrite,
        Self::DepthStencilAttachmentRead,
        Self::Present,
    ];

    /// Convert to the canonical Vulkan image layout.
    pub fn to_vk(self) -> vk::ImageLayout {
        match self {
            Self::Undefined => vk::ImageLayout::UNDEFINED,
            Self::General => vk::ImageLayout::GENERAL,
            Self::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            Self::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            Self::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            Self::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            Self::DepthStencilAttachmentWrite => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            Self::DepthStencilAttachmentRead => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            Self::Present => vk::ImageLayout::PRESENT_SRC_KHR,
        }
    }

    /// Access mask for this state on the source side of a transition:
    /// what must complete (and be made available) before the transition.
    ///
    /// `Undefined` yields an empty mask: the image's prior contents are not
    /// guaranteed, so there is nothing to wait on or flush. `Present` likewise
    /// yields an empty mask, the presentation engine synchronizes externally.
    pub fn src_access_mask(self) -> vk::AccessFlags {
        match self {
            Self::Undefined => vk::AccessFlags::empty(),
            Self::General => vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            Self::TransferSrc => vk::AccessFlags::TRANSFER_READ,
            Self::TransferDst => vk::AccessFlags::TRANSFER_WRITE,
            Self::ShaderReadOnly => vk::AccessFlags::SHADER_READ,
            Self::ColorAttachment => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            Self::DepthStencilAttachmentWrite => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            Self::DepthStencilAttachmentRead => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            Self::Present => vk::AccessFlags::empty(),
        }
    }

    /// Access mask for this state on the destination side of a transition:
    /// what must wait for (and be made visible after) the transition.
    pub fn dst_access_mask(self) -> vk::AccessFlags {
        match self {
            Self::Undefined => vk::AccessFlags::empty(),
            Self::General => vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            Self::TransferSrc => vk::AccessFlags::TRANSFER_READ,
            Self::TransferDst => vk::AccessFlags::TRANSFER_WRITE,
            Self::ShaderReadOnly => vk::AccessFlags::SHADER_READ,
            Self::ColorAttachment => vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            Self::DepthStencilAttachmentWrite => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            Self::DepthStencilAttachmentRead => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            Self::Present => vk::AccessFlags::empty(),
        }
    }

    /// Check if this is a depth/stencil attachment state.
    pub fn is_depth_stencil(self) -> bool {
        matches!(
            self,
            Self::DepthStencilAttachmentWrite | Self::DepthStencilAttachmentRead
        )
    }
}

/// Unique identifier for a Vulkan image within a state tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(u64);

impl From<vk::Image> for ImageId {
    fn from(image: vk::Image) -> Self {
        Self(image.as_raw())
    }
}

impl ImageId {
    /// Create an image ID from a raw Vulkan image handle.
    pub fn from_raw(handle: u64) -> Self {
        Self(handle)
    }

    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Caller-owned map of per-image usage states.
///
/// Barrier derivation is stateless between invocations, so the current state
/// of each image has to live somewhere on the caller's side. This tracker is
/// that somewhere: look up the old state before deriving a barrier, store the
/// new state after recording it.
#[derive(Debug, Default)]
pub struct ImageStateTracker {
    states: HashMap<ImageId, ImageUsageState>,
}

impl ImageStateTracker {
    /// Create a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state of an image, or `Undefined` if not tracked.
    pub fn get(&self, id: ImageId) -> ImageUsageState {
        self.states
            .get(&id)
            .copied()
            .unwrap_or(ImageUsageState::Undefined)
    }

    /// Update the state after a transition.
    pub fn set(&mut self, id: ImageId, state: ImageUsageState) {
        self.states.insert(id, state);
    }

    /// Stop tracking an image (e.g., when it is destroyed).
    pub fn remove(&mut self, id: ImageId) {
        self.states.remove(&id);
    }

    /// Reset all images to `Undefined`.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Get the number of tracked images.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if any images are being tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
