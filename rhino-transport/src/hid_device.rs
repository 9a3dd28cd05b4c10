//! hidapi-backed transport for the Rhino FFB interface

use std::sync::Arc;

use hidapi::HidDevice;
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::firmware::UsbControl;
use crate::protocol::INPUT_BUFFER_SIZE;
use crate::types::DeviceInfo;
use crate::{ControlChannel, Transport};

/// HID transport over an open hidapi device
///
/// The device is switched to non-blocking mode at construction so that
/// `read_nonblocking` returns immediately when the OS buffer is empty.
pub struct HidTransport {
    device: HidDevice,
    info: DeviceInfo,
}

impl HidTransport {
    /// Wrap an opened device
    ///
    /// # Arguments
    /// * `device` - Device opened on the FFB joystick collection
    /// * `info` - Enumeration data for that collection
    pub fn new(device: HidDevice, info: DeviceInfo) -> Result<Self, TransportError> {
        device.set_blocking_mode(false)?;
        debug!("Opened HID transport {}", info.path);
        Ok(Self { device, info })
    }
}

impl Transport for HidTransport {
    fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        trace!("HID write {:02X?}", data);
        let written = self.device.write(data)?;
        if written == 0 && !data.is_empty() {
            return Err(TransportError::Io(format!(
                "short write: 0 of {} bytes",
                data.len()
            )));
        }
        Ok(())
    }

    fn read_nonblocking(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut buf = [0u8; INPUT_BUFFER_SIZE];
        let len = self.device.read(&mut buf)?;
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(buf[..len].to_vec()))
    }

    fn get_feature_report(&self, report_id: u8, size: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; size.max(1)];
        buf[0] = report_id;
        let len = self.device.get_feature_report(&mut buf)?;
        buf.truncate(len);
        trace!("HID get feature {:02X}: {:02X?}", report_id, buf);
        Ok(buf)
    }

    fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError> {
        trace!("HID set feature {:02X?}", data);
        self.device.send_feature_report(data)?;
        Ok(())
    }

    fn control_channel(&self) -> Arc<dyn ControlChannel> {
        Arc::new(UsbControl::new(self.info.clone()))
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }
}
