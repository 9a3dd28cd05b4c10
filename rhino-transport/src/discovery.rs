//! Device discovery for VPforce FFB devices

use std::ffi::CString;

use hidapi::HidApi;
use tracing::{debug, info};

use crate::device_registry;
use crate::error::TransportError;
use crate::hid_device::HidTransport;
use crate::types::{DeviceInfo, DeviceSelector};
use crate::{BoxedTransport, DeviceOpener};

/// HID device discovery
///
/// Each device exposes several HID collections; enumeration keeps only the
/// top-level joystick collection on interface 0, which is the one that
/// accepts PID reports.
pub struct HidDiscovery;

impl HidDiscovery {
    fn convert(d: &hidapi::DeviceInfo) -> DeviceInfo {
        DeviceInfo {
            vendor_id: d.vendor_id(),
            product_id: d.product_id(),
            path: d.path().to_string_lossy().into_owned(),
            serial: d.serial_number().map(str::to_string),
            manufacturer: d.manufacturer_string().map(str::to_string),
            product: d.product_string().map(str::to_string),
            release_number: d.release_number(),
            interface_number: d.interface_number(),
            usage_page: d.usage_page(),
            usage: d.usage(),
        }
    }

    /// List FFB interfaces matching the selector
    pub fn enumerate(selector: &DeviceSelector) -> Result<Vec<DeviceInfo>, TransportError> {
        let api = HidApi::new()?;
        let devices: Vec<DeviceInfo> = api
            .device_list()
            .filter(|d| {
                device_registry::is_ffb_interface(d.interface_number(), d.usage_page(), d.usage())
            })
            .map(Self::convert)
            .filter(|d| selector.matches(d))
            .collect();

        debug!("Found {} FFB interfaces for {}", devices.len(), selector);
        Ok(devices)
    }

    /// Open an enumerated interface
    ///
    /// Fails with `DeviceUnavailable` when the path cannot be opened (in use,
    /// unplugged) and `PermissionDenied` when udev rules are missing.
    pub fn open(info: &DeviceInfo) -> Result<HidTransport, TransportError> {
        let api = HidApi::new()?;
        let path = CString::new(info.path.as_str())
            .map_err(|_| TransportError::DeviceUnavailable(format!("invalid path {}", info.path)))?;

        let device = api.open_path(&path).map_err(|e| match TransportError::from(e) {
            TransportError::PermissionDenied(msg) => TransportError::PermissionDenied(msg),
            other => TransportError::DeviceUnavailable(format!("{}: {}", info.path, other)),
        })?;

        info!(
            "Opened {:04X}:{:04X} at {}",
            info.vendor_id, info.product_id, info.path
        );
        HidTransport::new(device, info.clone())
    }

    /// Enumerate and open the first match
    pub fn open_first(selector: &DeviceSelector) -> Result<HidTransport, TransportError> {
        let devices = Self::enumerate(selector)?;
        let first = devices
            .first()
            .ok_or_else(|| TransportError::DeviceNotFound(selector.to_string()))?;
        Self::open(first)
    }
}

/// Reopens the selected device for the reconnection supervisor
#[derive(Debug, Clone)]
pub struct HidOpener {
    selector: DeviceSelector,
}

impl HidOpener {
    pub fn new(selector: DeviceSelector) -> Self {
        Self { selector }
    }

    pub fn selector(&self) -> &DeviceSelector {
        &self.selector
    }
}

impl DeviceOpener for HidOpener {
    fn open(&self) -> Result<BoxedTransport, TransportError> {
        Ok(Box::new(HidDiscovery::open_first(&self.selector)?))
    }
}
