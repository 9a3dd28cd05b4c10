//! Common types for the transport layer

use serde::Serialize;

use crate::device_registry;

/// Identification of one FFB HID interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// OS device path (hidraw node, IOKit path, ...)
    pub path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Manufacturer string if available
    pub manufacturer: Option<String>,
    /// Product name if available
    pub product: Option<String>,
    /// bcdDevice release number
    pub release_number: u16,
    /// USB interface number (-1 when the backend cannot tell)
    pub interface_number: i32,
    /// HID usage page of the top-level collection
    pub usage_page: u16,
    /// HID usage of the top-level collection
    pub usage: u16,
}

impl DeviceInfo {
    /// Short display label, e.g. `FFFF:2055 VPforce Rhino FFB Joystick`
    pub fn label(&self) -> String {
        format!(
            "{:04X}:{:04X} {}",
            self.vendor_id,
            self.product_id,
            self.product.as_deref().unwrap_or("(unknown product)")
        )
    }
}

/// Which device to open
///
/// A `product_id` of 0 accepts any product from the vendor. `serial` and
/// `path` narrow the match further when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
    pub path: Option<String>,
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self {
            vendor_id: device_registry::VENDOR_ID,
            product_id: device_registry::RHINO_PID,
            serial: None,
            path: None,
        }
    }
}

impl DeviceSelector {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            ..Self::default()
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Check vendor/product/serial/path against an enumerated device
    pub fn matches(&self, info: &DeviceInfo) -> bool {
        if info.vendor_id != self.vendor_id {
            return false;
        }
        if self.product_id != 0 && info.product_id != self.product_id {
            return false;
        }
        if let Some(serial) = &self.serial {
            if info.serial.as_deref() != Some(serial.as_str()) {
                return false;
            }
        }
        if let Some(path) = &self.path {
            if info.path != *path {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor_id, self.product_id)?;
        if let Some(serial) = &self.serial {
            write!(f, " serial={serial}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " path={path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_info() -> DeviceInfo {
    DeviceInfo {
        vendor_id: 0xFFFF,
        product_id: 0x2055,
        path: "/dev/hidraw3".into(),
        serial: Some("RH-0001".into()),
        manufacturer: Some("VPforce".into()),
        product: Some("Rhino FFB Joystick".into()),
        release_number: 0x0100,
        interface_number: 0,
        usage_page: 0x01,
        usage: 0x04,
    }
}
