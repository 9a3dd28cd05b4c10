//! In-memory transport simulating a Rhino PID device
//!
//! `MockTransport` is a cheap clonable handle onto shared state: give one
//! clone to the code under test and keep another to queue input reports and
//! inspect what was written. The simulated device allocates effect slots on
//! create-effect, frees them on block-free and answers the gain feature
//! reports, which is enough to drive the effect engine end to end.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::protocol::{load_status, report_id, DeviceControl};
use crate::report::{pid_flags, PidStateReport, Report};
use crate::types::DeviceInfo;
use crate::{BoxedTransport, ControlChannel, DeviceOpener, Transport};

/// Effect slots the real firmware offers
pub const DEFAULT_POOL_SIZE: usize = 40;

#[derive(Debug)]
struct MockState {
    writes: Vec<Vec<u8>>,
    feature_writes: Vec<Vec<u8>>,
    reads: VecDeque<Vec<u8>>,
    feature_overrides: HashMap<u8, Vec<u8>>,
    pending_block_load: Option<Vec<u8>>,
    allocated: BTreeSet<u8>,
    pool_size: usize,
    gains: [u8; 7],
    firmware: Option<Vec<u8>>,
    control_delay: Duration,
    reset_after_load: bool,
    connected: bool,
    fail_writes: bool,
    fail_reads: bool,
}

impl MockState {
    fn check_connected(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::Io("device disconnected".into()))
        }
    }

    fn allocate(&mut self) -> Vec<u8> {
        let free = (1..=self.pool_size.min(127) as u8).find(|s| !self.allocated.contains(s));
        match free {
            Some(slot) => {
                self.allocated.insert(slot);
                vec![report_id::PID_BLOCK_LOAD, slot, load_status::SUCCESS, 0, 0]
            }
            None => vec![report_id::PID_BLOCK_LOAD, 0, load_status::FULL, 0, 0],
        }
    }
}

/// Simulated device handle
#[derive(Debug, Clone)]
pub struct MockTransport {
    info: DeviceInfo,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_info(DeviceInfo {
            vendor_id: crate::VENDOR_ID,
            product_id: crate::RHINO_PID,
            path: "mock://rhino".into(),
            serial: Some("MOCK0001".into()),
            manufacturer: Some("VPforce".into()),
            product: Some("Rhino FFB Joystick".into()),
            release_number: 0x0100,
            interface_number: 0,
            usage_page: crate::device_registry::USAGE_PAGE_GENERIC_DESKTOP,
            usage: crate::device_registry::USAGE_JOYSTICK,
        })
    }

    pub fn with_info(info: DeviceInfo) -> Self {
        Self {
            info,
            state: Arc::new(Mutex::new(MockState {
                writes: Vec::new(),
                feature_writes: Vec::new(),
                reads: VecDeque::new(),
                feature_overrides: HashMap::new(),
                pending_block_load: None,
                allocated: BTreeSet::new(),
                pool_size: DEFAULT_POOL_SIZE,
                gains: [100; 7],
                firmware: None,
                control_delay: Duration::ZERO,
                reset_after_load: false,
                connected: true,
                fail_writes: false,
                fail_reads: false,
            })),
        }
    }

    /// Limit the number of effect slots the device hands out
    pub fn with_pool_size(self, pool_size: usize) -> Self {
        self.state.lock().pool_size = pool_size;
        self
    }

    /// Queue a raw input report for `read_nonblocking`
    pub fn queue_read(&self, data: Vec<u8>) {
        self.state.lock().reads.push_back(data);
    }

    /// Queue an encoded input report
    pub fn queue_report<R: Report>(&self, report: &R) {
        self.queue_read(report.encode());
    }

    pub fn pending_reads(&self) -> usize {
        self.state.lock().reads.len()
    }

    /// All output reports written so far
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// Output reports with the given report ID
    pub fn writes_with_id(&self, id: u8) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.first() == Some(&id))
            .cloned()
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// All feature reports sent so far
    pub fn feature_writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().feature_writes.clone()
    }

    /// Force the answer of a `get_feature_report` call
    pub fn set_feature_response(&self, id: u8, data: Vec<u8>) {
        self.state.lock().feature_overrides.insert(id, data);
    }

    pub fn clear_feature_response(&self, id: u8) {
        self.state.lock().feature_overrides.remove(&id);
    }

    pub fn set_gains(&self, gains: [u8; 7]) {
        self.state.lock().gains = gains;
    }

    pub fn gains(&self) -> [u8; 7] {
        self.state.lock().gains
    }

    pub fn set_firmware(&self, version: &str) {
        let mut raw = version.as_bytes().to_vec();
        raw.resize(crate::protocol::usb::VERSION_LENGTH.max(raw.len()), 0);
        self.state.lock().firmware = Some(raw);
    }

    /// Make every control transfer take `delay`
    pub fn set_control_delay(&self, delay: Duration) {
        self.state.lock().control_delay = delay;
    }

    /// Reset the simulated device right after the next block load answer:
    /// every slot is freed and a device-reset PID state is queued
    pub fn reset_after_next_load(&self) {
        self.state.lock().reset_after_load = true;
    }

    /// Slots currently allocated on the simulated device
    pub fn allocated_slots(&self) -> Vec<u8> {
        self.state.lock().allocated.iter().copied().collect()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Unplug: every call fails until [`MockTransport::reconnect`]
    pub fn disconnect(&self) {
        self.state.lock().connected = false;
    }

    /// Plug back in; the device comes back with an empty slot table
    pub fn reconnect(&self) {
        let mut state = self.state.lock();
        state.connected = true;
        state.fail_reads = false;
        state.fail_writes = false;
        state.allocated.clear();
        state.pending_block_load = None;
        state.reads.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

impl Transport for MockTransport {
    fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.check_connected()?;
        if state.fail_writes {
            return Err(TransportError::Io("HID write failed".into()));
        }
        state.writes.push(data.to_vec());

        match data {
            [report_id::BLOCK_FREE, slot, ..] => {
                let slot = *slot;
                state.allocated.remove(&slot);
            }
            [report_id::DEVICE_CONTROL, control, ..] if *control == DeviceControl::Reset as u8 => {
                state.allocated.clear();
            }
            _ => {}
        }
        Ok(())
    }

    fn read_nonblocking(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut state = self.state.lock();
        state.check_connected()?;
        if state.fail_reads {
            return Err(TransportError::Io("HID read failed".into()));
        }
        Ok(state.reads.pop_front())
    }

    fn get_feature_report(&self, id: u8, size: usize) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock();
        state.check_connected()?;

        let mut data = if let Some(data) = state.feature_overrides.get(&id) {
            data.clone()
        } else {
            match id {
                report_id::PID_BLOCK_LOAD => {
                    let data = state
                        .pending_block_load
                        .take()
                        .unwrap_or_else(|| vec![id, 0, load_status::ERROR, 0, 0]);
                    if state.reset_after_load {
                        state.reset_after_load = false;
                        state.allocated.clear();
                        let reset = PidStateReport::new(pid_flags::DEVICE_RESET, false, 0);
                        state.reads.push_back(reset.encode());
                    }
                    data
                }
                report_id::GET_GAINS => {
                    let mut data = vec![id];
                    data.extend_from_slice(&state.gains);
                    data
                }
                _ => {
                    return Err(TransportError::Io(format!(
                        "feature report 0x{id:02X} not supported"
                    )))
                }
            }
        };
        data.truncate(size);
        Ok(data)
    }

    fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.check_connected()?;
        state.feature_writes.push(data.to_vec());

        match data {
            [report_id::CREATE_EFFECT, ..] => {
                let response = state.allocate();
                state.pending_block_load = Some(response);
            }
            [report_id::SET_GAIN, slider @ 1..=7, value, ..] => {
                let idx = usize::from(*slider - 1);
                state.gains[idx] = *value;
            }
            _ => {}
        }
        Ok(())
    }

    fn control_channel(&self) -> Arc<dyn ControlChannel> {
        Arc::new(self.clone())
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }
}

impl ControlChannel for MockTransport {
    fn control_read(&self, _request: u8, length: usize) -> Result<Vec<u8>, TransportError> {
        // sleep outside the state lock so HID calls keep flowing
        let delay = self.state.lock().control_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let state = self.state.lock();
        match &state.firmware {
            Some(raw) => Ok(raw.iter().copied().take(length).collect()),
            None => Err(TransportError::Usb("control transfer stalled".into())),
        }
    }
}

/// Opener handing out clones of one simulated device
///
/// Opening fails with `DeviceUnavailable` while the device is disconnected.
#[derive(Debug, Clone)]
pub struct MockOpener {
    device: MockTransport,
    opens: Arc<AtomicUsize>,
}

impl MockOpener {
    pub fn new(device: MockTransport) -> Self {
        Self {
            device,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl DeviceOpener for MockOpener {
    fn open(&self) -> Result<BoxedTransport, TransportError> {
        if !self.device.is_connected() {
            return Err(TransportError::DeviceUnavailable("mock device unplugged".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.device.clone()))
    }
}
