//! Image-state transition barrier derivation.
//!
//! The core of this crate: [`derive_barrier`] turns an (old state, new state)
//! pair into the access and stage masks a `vkCmdPipelineBarrier` needs so the
//! driver enforces correct ordering and visibility between the two usages.
//! Under-synchronizing here causes silent data races on real hardware;
//! over-synchronizing costs throughput. The access masks come from the finite
//! per-state tables in [`ImageUsageState`]; the stage masks come from the
//! caller's [`PipelineStageHint`] or from a deliberately conservative
//! `ALL_COMMANDS` fallback.
//!
//! Derivation is a pure function: no hidden state, identical inputs always
//! produce identical [`BarrierSpec`] values, and any number of threads may
//! derive barriers concurrently.

use ash::vk;

use crate::error::{Result, SupportError};
use crate::format::{self, FormatClass};
use crate::state::ImageUsageState;

/// The subset of an image (aspects, mip levels, array layers) a barrier
/// applies to.
///
/// An empty `aspect_mask` means "infer from the target state": depth/stencil
/// attachment states get the depth (and stencil) aspects, everything else gets
/// color. A non-empty mask is used verbatim after validation against the
/// format's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceRange {
    /// Aspects covered; empty means infer from the new state.
    pub aspect_mask: vk::ImageAspectFlags,
    /// First mip level.
    pub base_mip_level: u32,
    /// Number of mip levels, or `vk::REMAINING_MIP_LEVELS`.
    pub level_count: u32,
    /// First array layer.
    pub base_array_layer: u32,
    /// Number of array layers, or `vk::REMAINING_ARRAY_LAYERS`.
    pub layer_count: u32,
}

impl Default for SubresourceRange {
    /// Full range: every mip level and array layer, aspect inferred.
    fn default() -> Self {
        Self {
            aspect_mask: vk::ImageAspectFlags::empty(),
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        }
    }
}

impl SubresourceRange {
    /// Fixed range covering only the first mip level and array layer.
    pub fn first_mip_and_layer() -> Self {
        Self {
            level_count: 1,
            layer_count: 1,
            ..Self::default()
        }
    }

    /// Full range with an explicit aspect mask.
    pub fn with_aspect(aspect_mask: vk::ImageAspectFlags) -> Self {
        Self {
            aspect_mask,
            ..Self::default()
        }
    }

    /// Convert to the Vulkan representation.
    pub fn to_vk(self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask,
            base_mip_level: self.base_mip_level,
            level_count: self.level_count,
            base_array_layer: self.base_array_layer,
            layer_count: self.layer_count,
        }
    }
}

/// Caller-supplied pipeline stage pair for a transition.
///
/// When the caller knows which stages produce and consume the image, passing a
/// hint narrows the barrier to exactly those stages. Without a hint the engine
/// falls back to `ALL_COMMANDS` on both sides, which is always correct but
/// never optimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStageHint {
    /// Stages that must complete before the transition.
    pub src_stage: vk::PipelineStageFlags,
    /// Stages that must wait for the transition.
    pub dst_stage: vk::PipelineStageFlags,
}

impl PipelineStageHint {
    /// Create a stage hint from an explicit source/destination pair.
    pub fn new(src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags) -> Self {
        Self {
            src_stage,
            dst_stage,
        }
    }
}

/// A fully derived image barrier, ready for recording.
///
/// Produced fresh per [`derive_barrier`] call and consumed by value; nothing
/// in the crate retains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierSpec {
    /// Accesses that must complete before the transition.
    pub src_access_mask: vk::AccessFlags,
    /// Accesses that must wait for the transition.
    pub dst_access_mask: vk::AccessFlags,
    /// Stages the source access mask applies to.
    pub src_stage_mask: vk::PipelineStageFlags,
    /// Stages the destination access mask applies to.
    pub dst_stage_mask: vk::PipelineStageFlags,
    /// State the image is transitioning out of.
    pub old_state: ImageUsageState,
    /// State the image is transitioning into.
    pub new_state: ImageUsageState,
    /// Resolved subresource range (aspect mask filled in).
    pub range: SubresourceRange,
}

/// Derive the barrier for transitioning an image between usage states.
///
/// `old_state == new_state` is legal and yields empty access masks: some
/// callers transition in place to establish a synchronization point without a
/// layout change. Stage masks are taken from `hint` unmodified when supplied,
/// otherwise both default to `ALL_COMMANDS`. The fallback is a documented
/// conservative default; tighter stages are never guessed from the states.
///
/// # Errors
///
/// [`SupportError::InvalidAspect`] when the requested (or inferred) aspect is
/// incompatible with the format: a depth aspect on a color-only format, a
/// stencil aspect on a stencil-free format, or a depth/stencil attachment
/// state on a format that does not combine depth and stencil.
pub fn derive_barrier(
    format: vk::Format,
    old_state: ImageUsageState,
    new_state: ImageUsageState,
    range: SubresourceRange,
    hint: Option<PipelineStageHint>,
) -> Result<BarrierSpec> {
    debug_assert!(
        range.level_count > 0 && range.layer_count > 0,
        "subresource counts must be positive or the remaining sentinel"
    );

    let class = format::classify(format);
    let aspect_mask = resolve_aspect(class, format, new_state, range.aspect_mask)?;

    let (src_access_mask, dst_access_mask) = if old_state == new_state {
        // In-place synchronization point, no layout change to order against.
        (vk::AccessFlags::empty(), vk::AccessFlags::empty())
    } else {
        (old_state.src_access_mask(), new_state.dst_access_mask())
    };

    let (src_stage_mask, dst_stage_mask) = match hint {
        Some(hint) => (hint.src_stage, hint.dst_stage),
        None => (
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
        ),
    };

    Ok(BarrierSpec {
        src_access_mask,
        dst_access_mask,
        src_stage_mask,
        dst_stage_mask,
        old_state,
        new_state,
        range: SubresourceRange {
            aspect_mask,
            ..range
        },
    })
}

fn resolve_aspect(
    class: FormatClass,
    format: vk::Format,
    new_state: ImageUsageState,
    requested: vk::ImageAspectFlags,
) -> Result<vk::ImageAspectFlags> {
    // The depth/stencil attachment states cover both aspects; a format that
    // does not combine them cannot hold an image in those states.
    if new_state.is_depth_stencil() && !(class.has_depth && class.has_stencil) {
        return Err(SupportError::InvalidAspect {
            format,
            requested: vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
        });
    }

    if requested.is_empty() {
        return Ok(if new_state.is_depth_stencil() {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::COLOR
        });
    }

    if requested.contains(vk::ImageAspectFlags::DEPTH) && !class.has_depth {
        return Err(SupportError::InvalidAspect { format, requested });
    }
    if requested.contains(vk::ImageAspectFlags::STENCIL) && !class.has_stencil {
        return Err(SupportError::InvalidAspect { format, requested });
    }
    if requested.contains(vk::ImageAspectFlags::COLOR) && class.has_depth {
        return Err(SupportError::InvalidAspect { format, requested });
    }

    Ok(requested)
}

/// Record a derived barrier into a command buffer.
///
/// The queue family indices are left ignored; ownership transfers are out of
/// scope for this layer.
pub fn record_image_barrier(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    spec: &BarrierSpec,
) {
    let barrier = vk::ImageMemoryBarrier::default()
        .src_access_mask(spec.src_access_mask)
        .dst_access_mask(spec.dst_access_mask)
        .old_layout(spec.old_state.to_vk())
        .new_layout(spec.new_state.to_vk())
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(spec.range.to_vk());

    unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            spec.src_stage_mask,
            spec.dst_stage_mask,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            std::slice::from_ref(&barrier),
        );
    }
}

/// Derive and record an image state transition in one call.
///
/// Returns the derived spec so callers can update their state tracking.
#[allow(clippy::too_many_arguments)]
pub fn transition_image(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    format: vk::Format,
    old_state: ImageUsageState,
    new_state: ImageUsageState,
    range: SubresourceRange,
    hint: Option<PipelineStageHint>,
) -> Result<BarrierSpec> {
    let spec = derive_barrier(format, old_state, new_state, range, hint)?;
    record_image_barrier(device, cmd, image, &spec);
    Ok(spec)
}
