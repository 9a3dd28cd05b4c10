//! Transport layer for VPforce Rhino force-feedback devices
//!
//! This crate owns everything below the effect engine:
//!
//! - Wire format: report IDs, fixed-layout report structs, unit conversions
//! - Discovery: enumerating the single FFB HID collection per device
//! - Transport: non-blocking reads, writes and feature reports over hidapi
//! - Firmware version query via a USB vendor control transfer
//! - An in-memory mock transport for tests

pub mod device_registry;
pub mod error;
pub mod mock;
pub mod protocol;
pub mod report;
pub mod types;
pub mod units;

mod discovery;
mod firmware;
mod hid_device;

pub use device_registry::{is_ffb_interface, is_ffb_pid, RHINO_PID, VENDOR_ID};
pub use discovery::{HidDiscovery, HidOpener};
pub use error::{ParseError, TransportError};
pub use firmware::{decode_firmware_version, read_firmware_version, UsbControl};
pub use hid_device::HidTransport;
pub use protocol::{DeviceControl, EffectOp, EffectType, GainSlider};
pub use report::{
    BlockFreeReport, BlockLoadReport, ConditionAxis, ConditionParams, CreateEffectReport,
    DeviceControlReport, EffectOperationReport, GainsReport, InputReport, PidStateReport, Report,
    SetConditionReport, SetConstantForceReport, SetEffectReport, SetGainReport,
    SetPeriodicReport,
};
pub use types::{DeviceInfo, DeviceSelector};

use std::sync::Arc;

use zerocopy::IntoBytes;

/// Vendor control requests to the USB device behind a transport
///
/// Control transfers do not go through the HID handle, so callers take a
/// channel from the transport and use it without holding the transport.
pub trait ControlChannel: Send + Sync {
    /// Vendor device-to-host control request
    ///
    /// # Arguments
    /// * `request` - bRequest (e.g. `protocol::usb::REQ_GET_VERSION`)
    /// * `length` - wLength
    fn control_read(&self, request: u8, length: usize) -> Result<Vec<u8>, TransportError>;
}

/// The core transport trait - the hidapi backend and the mock implement this
///
/// All calls are synchronous. `read_nonblocking` never blocks; the feature
/// report calls may block for one USB transaction.
pub trait Transport: Send {
    /// Write one output report (first byte is the report ID)
    ///
    /// An error means the connection is dead and must be reopened.
    fn write(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Read one pending input report, `None` if nothing is buffered
    fn read_nonblocking(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Read a feature report
    ///
    /// # Arguments
    /// * `report_id` - Feature report ID (e.g. `protocol::report_id::PID_BLOCK_LOAD`)
    /// * `size` - Buffer size including the report ID byte
    fn get_feature_report(&self, report_id: u8, size: usize) -> Result<Vec<u8>, TransportError>;

    /// Send a feature report (first byte is the report ID)
    fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Control channel onto the same USB device
    fn control_channel(&self) -> Arc<dyn ControlChannel>;

    /// Get device information
    fn device_info(&self) -> &DeviceInfo;
}

/// Type alias for a boxed transport
pub type BoxedTransport = Box<dyn Transport>;

/// Opens a fresh transport; used for the initial connect and every reconnect
pub trait DeviceOpener: Send + Sync {
    fn open(&self) -> Result<BoxedTransport, TransportError>;
}

/// Typed report helpers on top of [`Transport`]
pub trait TransportExt: Transport {
    /// Encode and write an output report
    fn write_report<R: Report>(&self, report: &R) -> Result<(), TransportError> {
        tracing::trace!("write {} {:02X?}", R::NAME, report.as_bytes());
        self.write(report.as_bytes())
    }

    /// Encode and send a feature report
    fn send_feature<R: Report>(&self, report: &R) -> Result<(), TransportError> {
        tracing::trace!("set feature {} {:02X?}", R::NAME, report.as_bytes());
        self.send_feature_report(report.as_bytes())
    }

    /// Read and decode a feature report
    fn get_feature<R: Report>(&self) -> Result<R, TransportError> {
        let buf = self.get_feature_report(R::ID, R::SIZE)?;
        Ok(R::decode(&buf)?)
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}
