//! Pixel format classification and depth-format selection.
//!
//! Classification (depth/stencil content) is a static lookup over the known
//! depth formats. Filterability and attachment support depend on the actual
//! device and are queried through the [`FormatCapabilities`] trait, which the
//! device-management side implements and tests can mock.

use ash::vk;

use crate::error::{Result, SupportError};

/// Depth/stencil content of a pixel format.
///
/// Every stencil-bearing format in this table also carries depth; pure-stencil
/// formats are not part of the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatClass {
    /// Format carries a depth component.
    pub has_depth: bool,
    /// Format carries a stencil component.
    pub has_stencil: bool,
}

/// Classify a format's depth/stencil content.
pub fn classify(format: vk::Format) -> FormatClass {
    match format {
        vk::Format::D16_UNORM | vk::Format::X8_D24_UNORM_PACK32 | vk::Format::D32_SFLOAT => {
            FormatClass {
                has_depth: true,
                has_stencil: false,
            }
        }
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => FormatClass {
            has_depth: true,
            has_stencil: true,
        },
        _ => FormatClass {
            has_depth: false,
            has_stencil: false,
        },
    }
}

/// Device-side format capability query.
///
/// Implemented by [`crate::device::PhysicalDeviceCaps`] for a real device;
/// tests supply a table-backed mock.
pub trait FormatCapabilities {
    /// Report the format features the device supports for `format`.
    fn format_properties(&self, format: vk::Format) -> vk::FormatProperties;
}

/// Check whether a format supports linear filtering under the given tiling.
///
/// Must be asked of the actual device; filterability cannot be assumed from
/// the format alone.
pub fn is_filterable<C: FormatCapabilities>(
    caps: &C,
    format: vk::Format,
    tiling: vk::ImageTiling,
) -> bool {
    let props = caps.format_properties(format);
    let features = if tiling == vk::ImageTiling::LINEAR {
        props.linear_tiling_features
    } else {
        props.optimal_tiling_features
    };
    features.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
}

/// Default depth format preference list, highest precision first.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 5] = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D32_SFLOAT,
    vk::Format::D24_UNORM_S8_UINT,
    vk::Format::D16_UNORM_S8_UINT,
    vk::Format::D16_UNORM,
];

/// Select the first candidate the device supports as a depth attachment.
///
/// Candidates are checked in order, so callers list them precision-descending.
/// Returns [`SupportError::NoSupportedDepthFormat`] when none qualifies; any
/// caller that requires a depth buffer must treat that as fatal.
pub fn supported_depth_format<C: FormatCapabilities>(
    caps: &C,
    candidates: &[vk::Format],
) -> Result<vk::Format> {
    candidates
        .iter()
        .copied()
        .find(|&format| {
            caps.format_properties(format)
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or(SupportError::NoSupportedDepthFormat)
}

/// Same as [`supported_depth_format`] but only considers candidates that also
/// carry a stencil component.
pub fn supported_depth_stencil_format<C: FormatCapabilities>(
    caps: &C,
    candidates: &[vk::Format],
) -> Result<vk::Format> {
    let combined: Vec<vk::Format> = candidates
        .iter()
        .copied()
        .filter(|&format| classify(format).has_stencil)
        .collect();
    supported_depth_format(caps, &combined)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    /// Table-backed capability query; formats absent from the table report no
    /// features at all.
    struct MockCaps {
        properties: HashMap<vk::Format, vk::FormatProperties>,
    }

    impl MockCaps {
        fn new() -> Self {
            Self {
                properties: HashMap::new(),
            }
        }

        fn with_depth_attachment(mut self, format: vk::Format) -> Self {
            let props = self.properties.entry(format).or_default();
            props.optimal_tiling_features |= vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
            self
        }

        fn with_linear_filter(mut self, format: vk::Format, tiling: vk::ImageTiling) -> Self {
            let props = self.properties.entry(format).or_default();
            if tiling == vk::ImageTiling::LINEAR {
                props.linear_tiling_features |= vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
            } else {
                props.optimal_tiling_features |=
                    vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
            }
            self
        }
    }

    impl FormatCapabilities for MockCaps {
        fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
            self.properties.get(&format).copied().unwrap_or_default()
        }
    }

    #[rstest]
    #[case::d16(vk::Format::D16_UNORM, true, false)]
    #[case::x8_d24(vk::Format::X8_D24_UNORM_PACK32, true, false)]
    #[case::d32(vk::Format::D32_SFLOAT, true, false)]
    #[case::d16_s8(vk::Format::D16_UNORM_S8_UINT, true, true)]
    #[case::d24_s8(vk::Format::D24_UNORM_S8_UINT, true, true)]
    #[case::d32_s8(vk::Format::D32_SFLOAT_S8_UINT, true, true)]
    #[case::rgba8(vk::Format::R8G8B8A8_UNORM, false, false)]
    #[case::bgra8(vk::Format::B8G8R8A8_SRGB, false, false)]
    fn test_classify(
        #[case] format: vk::Format,
        #[case] has_depth: bool,
        #[case] has_stencil: bool,
    ) {
        let class = classify(format);
        assert_eq!(class.has_depth, has_depth);
        assert_eq!(class.has_stencil, has_stencil);
    }

    #[test]
    fn test_stencil_implies_depth() {
        // All stencil-bearing formats in this domain are depth+stencil combined.
        for format in DEPTH_FORMAT_CANDIDATES {
            let class = classify(format);
            if class.has_stencil {
                assert!(class.has_depth);
            }
        }
    }

    #[test]
    fn test_depth_format_selection_order() {
        // Device supports only D24S8 and D16; the higher-precision D24S8 wins.
        let caps = MockCaps::new()
            .with_depth_attachment(vk::Format::D24_UNORM_S8_UINT)
            .with_depth_attachment(vk::Format::D16_UNORM);

        let candidates = [
            vk::Format::D32_SFLOAT,
            vk::Format::D24_UNORM_S8_UINT,
            vk::Format::D16_UNORM,
        ];
        let selected = supported_depth_format(&caps, &candidates).unwrap();
        assert_eq!(selected, vk::Format::D24_UNORM_S8_UINT);
    }

    #[test]
    fn test_depth_format_selection_none_supported() {
        let caps = MockCaps::new();
        let result = supported_depth_format(&caps, &DEPTH_FORMAT_CANDIDATES);
        assert!(matches!(result, Err(SupportError::NoSupportedDepthFormat)));
    }

    #[test]
    fn test_depth_stencil_selection_skips_depth_only() {
        // D32_SFLOAT is supported but has no stencil; the stencil-required
        // variant must pass over it.
        let caps = MockCaps::new()
            .with_depth_attachment(vk::Format::D32_SFLOAT)
            .with_depth_attachment(vk::Format::D24_UNORM_S8_UINT);

        let selected =
            supported_depth_stencil_format(&caps, &DEPTH_FORMAT_CANDIDATES).unwrap();
        assert_eq!(selected, vk::Format::D24_UNORM_S8_UINT);

        let depth_only = [vk::Format::D32_SFLOAT, vk::Format::D16_UNORM];
        let result = supported_depth_stencil_format(&caps, &depth_only);
        assert!(matches!(result, Err(SupportError::NoSupportedDepthFormat)));
    }

    #[test]
    fn test_is_filterable_depends_on_tiling() {
        let caps = MockCaps::new()
            .with_linear_filter(vk::Format::R8G8B8A8_UNORM, vk::ImageTiling::OPTIMAL);

        assert!(is_filterable(
            &caps,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::OPTIMAL
        ));
        assert!(!is_filterable(
            &caps,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::LINEAR
        ));
        assert!(!is_filterable(
            &caps,
            vk::Format::R16G16B16A16_SFLOAT,
            vk::ImageTiling::OPTIMAL
        ));
    }
}
