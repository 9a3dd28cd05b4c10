//! Firmware version query over a USB vendor control transfer
//!
//! The version string is not exposed through HID, so this goes around
//! hidapi and talks to the USB device directly via nusb.

use std::time::Duration;

use nusb::transfer::{Control, ControlType, Recipient};
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::usb;
use crate::types::DeviceInfo;
use crate::ControlChannel;

/// Issue a vendor IN control request to the USB device behind `info`
///
/// The device is matched by VID/PID and, when known, serial number.
fn vendor_control_read(
    info: &DeviceInfo,
    request: u8,
    length: usize,
) -> Result<Vec<u8>, TransportError> {
    let usb_info = nusb::list_devices()
        .map_err(|e| TransportError::Usb(format!("failed to list USB devices: {e}")))?
        .find(|d| {
            d.vendor_id() == info.vendor_id
                && d.product_id() == info.product_id
                && match &info.serial {
                    Some(serial) => d.serial_number() == Some(serial.as_str()),
                    None => true,
                }
        })
        .ok_or_else(|| {
            TransportError::DeviceNotFound(format!(
                "USB device {:04X}:{:04X}",
                info.vendor_id, info.product_id
            ))
        })?;

    let device = usb_info
        .open()
        .map_err(|e| TransportError::Usb(format!("failed to open USB device: {e}")))?;

    let control = Control {
        control_type: ControlType::Vendor,
        recipient: Recipient::Device,
        request,
        value: 0,
        index: 0,
    };

    let mut buf = vec![0u8; length];
    let len = device
        .control_in_blocking(control, &mut buf, Duration::from_millis(usb::TIMEOUT_MS))
        .map_err(|e| TransportError::Usb(format!("control transfer failed: {e}")))?;
    buf.truncate(len);
    debug!("USB control read 0x{:02X}: {} bytes", request, len);
    Ok(buf)
}

/// Decode the firmware version payload (UTF-8, NUL padded)
pub fn decode_firmware_version(raw: &[u8]) -> Option<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let text = std::str::from_utf8(&raw[..end]).ok()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Control channel that reopens the USB device for every request
#[derive(Debug, Clone)]
pub struct UsbControl {
    info: DeviceInfo,
}

impl UsbControl {
    pub fn new(info: DeviceInfo) -> Self {
        Self { info }
    }
}

impl ControlChannel for UsbControl {
    fn control_read(&self, request: u8, length: usize) -> Result<Vec<u8>, TransportError> {
        vendor_control_read(&self.info, request, length)
    }
}

/// Query and decode the firmware version
pub fn read_firmware_version(channel: &dyn ControlChannel) -> Result<String, TransportError> {
    let raw = channel.control_read(usb::REQ_GET_VERSION, usb::VERSION_LENGTH)?;
    decode_firmware_version(&raw)
        .ok_or_else(|| TransportError::Usb("empty or invalid firmware version".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_version() {
        let mut raw = b"v1.0.15 - Jan 12 2024".to_vec();
        raw.resize(64, 0);
        assert_eq!(
            decode_firmware_version(&raw).as_deref(),
            Some("v1.0.15 - Jan 12 2024")
        );
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_firmware_version(&[0u8; 64]), None);
        assert_eq!(decode_firmware_version(&[]), None);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert_eq!(decode_firmware_version(&[0xFF, 0xFE, 0x00]), None);
    }
}
