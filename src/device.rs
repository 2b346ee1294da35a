//! Device identity and capability queries.
//!
//! Device and instance creation live outside this crate; what the support
//! layer needs from the device side is small: who the device is (for benchmark
//! reports) and what its formats can do (for the format classifier).

use std::ffi::CStr;

use ash::vk;

use crate::format::FormatCapabilities;

/// Identity of the physical device a benchmark ran on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceIdentity {
    /// Device name as reported by the driver.
    pub name: String,
    /// Packed driver version.
    pub driver_version: u32,
}

impl DeviceIdentity {
    /// Create an identity from explicit values.
    pub fn new(name: impl Into<String>, driver_version: u32) -> Self {
        Self {
            name: name.into(),
            driver_version,
        }
    }

    /// Extract the identity from physical device properties.
    pub fn from_properties(properties: &vk::PhysicalDeviceProperties) -> Self {
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        Self {
            name,
            driver_version: properties.driver_version,
        }
    }
}

/// [`FormatCapabilities`] backed by a real physical device.
pub struct PhysicalDeviceCaps<'a> {
    instance: &'a ash::Instance,
    physical_device: vk::PhysicalDevice,
}

impl<'a> PhysicalDeviceCaps<'a> {
    /// Wrap an instance/physical-device pair for capability queries.
    pub fn new(instance: &'a ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        Self {
            instance,
            physical_device,
        }
    }
}

impl FormatCapabilities for PhysicalDeviceCaps<'_> {
    fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, format)
        }
    }
}
