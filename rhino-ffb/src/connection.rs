//! Device connection: transport ownership, report cache, handle registry
//! and the reconnection supervisor
//!
//! A `DeviceConnection` is a cheap clonable handle onto one physical device.
//! Every transport call takes the transport mutex for exactly that call, so
//! writes from effect handles and reads from the poll loop are serialized in
//! call order without holding a lock across a poll iteration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rhino_transport::protocol::{load_status, report_id};
use rhino_transport::{
    read_firmware_version, BlockLoadReport, BoxedTransport, CreateEffectReport, DeviceControl,
    DeviceControlReport, DeviceInfo, DeviceOpener, DeviceSelector, EffectType, GainSlider,
    GainsReport, HidOpener, InputReport, PidStateReport, Report, SetGainReport, Transport,
    TransportError, TransportExt,
};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::effect::EffectHandle;
use crate::error::{FfbError, Result};

/// Broadcast channel capacity for device events
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Upper bound on frames drained per tick, so a flooding device cannot
/// starve the rest of the poll thread
const MAX_REPORTS_PER_TICK: usize = 1024;

/// Settle time after a device reset
const RESET_SETTLE: Duration = Duration::from_millis(10);

/// Timing knobs for polling and reconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Poll loop period
    pub poll_interval: Duration,
    /// Delay between reconnection attempts
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Reconnection supervisor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
    Attempting,
}

/// Notifications published by the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Transport (re)opened
    Connected(DeviceInfo),
    /// Transport dropped after an I/O failure
    Disconnected(String),
    /// PID state reported a device reset; all effect handles were invalidated
    DeviceReset,
    /// The device stopped an effect on its own (duration expired)
    EffectStopped { slot: u8 },
}

/// Slot state shared between an effect handle and the registry
///
/// The handle owns it; the registry only keeps a `Weak` so it can zero the
/// slot on reset without keeping dropped handles alive.
#[derive(Debug)]
pub(crate) struct SlotState {
    slot: AtomicU8,
    started: AtomicBool,
}

impl SlotState {
    fn new(slot: u8) -> Self {
        Self {
            slot: AtomicU8::new(slot),
            started: AtomicBool::new(false),
        }
    }

    pub(crate) fn slot(&self) -> u8 {
        self.slot.load(Ordering::Acquire)
    }

    /// Zero the slot, returning the previous value
    pub(crate) fn take_slot(&self) -> u8 {
        self.started.store(false, Ordering::Release);
        self.slot.swap(0, Ordering::AcqRel)
    }

    pub(crate) fn started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn set_started(&self, started: bool) {
        self.started.store(started, Ordering::Release);
    }
}

struct Link {
    transport: Option<BoxedTransport>,
    state: LinkState,
    disconnected_at: Option<Instant>,
}

struct Shared {
    link: Mutex<Link>,
    info: RwLock<Option<DeviceInfo>>,
    reports: RwLock<HashMap<u8, Vec<u8>>>,
    handles: Mutex<Vec<Weak<SlotState>>>,
    firmware: Mutex<Option<String>>,
    events: broadcast::Sender<DeviceEvent>,
    opener: Box<dyn DeviceOpener>,
    config: ConnectionConfig,
    closed: AtomicBool,
}

/// Handle onto one open force-feedback device
#[derive(Clone)]
pub struct DeviceConnection {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DeviceConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConnection")
            .field("state", &self.state())
            .field("device", &self.device_info().map(|i| i.path))
            .finish()
    }
}

impl DeviceConnection {
    /// Enumerate and open the first device matching `selector`
    ///
    /// The selector is kept for reconnection.
    pub fn open(selector: DeviceSelector, config: ConnectionConfig) -> Result<Self> {
        info!("Open Rhino HID {}", selector);
        Self::with_opener(HidOpener::new(selector), config)
    }

    /// Open through a custom opener (mock devices, alternative backends)
    pub fn with_opener(opener: impl DeviceOpener + 'static, config: ConnectionConfig) -> Result<Self> {
        let transport = opener.open().map_err(|e| match e {
            TransportError::PermissionDenied(msg) => {
                FfbError::DeviceUnavailable(format!("permission denied: {msg}"))
            }
            other => FfbError::DeviceUnavailable(other.to_string()),
        })?;
        let device_info = transport.device_info().clone();
        info!("Successfully opened HID '{}'", device_info.path);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            shared: Arc::new(Shared {
                link: Mutex::new(Link {
                    transport: Some(transport),
                    state: LinkState::Connected,
                    disconnected_at: None,
                }),
                info: RwLock::new(Some(device_info)),
                reports: RwLock::new(HashMap::new()),
                handles: Mutex::new(Vec::new()),
                firmware: Mutex::new(None),
                events,
                opener: Box::new(opener),
                config,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Info of the most recently opened transport
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.shared.info.read().clone()
    }

    pub fn state(&self) -> LinkState {
        self.shared.link.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Subscribe to connection and PID state events
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.shared.events.subscribe()
    }

    fn emit(&self, event: DeviceEvent) {
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }

    // =========================================================================
    // Transport access
    // =========================================================================

    /// Run one transport call under the transport mutex
    ///
    /// A fatal transport error drops the transport and hands the connection
    /// to the reconnection supervisor before the error is returned.
    fn with_transport<T>(
        &self,
        f: impl FnOnce(&dyn Transport) -> std::result::Result<T, TransportError>,
    ) -> Result<T> {
        let mut link = self.shared.link.lock();
        let transport = link.transport.as_deref().ok_or(FfbError::Disconnected)?;
        match f(transport) {
            Ok(v) => Ok(v),
            Err(e) if e.is_fatal() => {
                let reason = e.to_string();
                link.transport = None;
                link.state = LinkState::Disconnected;
                link.disconnected_at = Some(Instant::now());
                drop(link);
                self.on_connection_lost(&reason);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn on_connection_lost(&self, reason: &str) {
        warn!("HID connection lost ({}), reconnecting in {:?}", reason, self.shared.config.reconnect_delay);
        let invalidated = self.invalidate_all();
        if invalidated > 0 {
            debug!("Invalidated {} effect handles", invalidated);
        }
        self.emit(DeviceEvent::Disconnected(reason.to_string()));
    }

    /// Write one output report
    pub fn write_report<R: Report>(&self, report: &R) -> Result<()> {
        self.with_transport(|t| t.write_report(report))
    }

    /// Write raw output report bytes
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.with_transport(|t| t.write(data))
    }

    // =========================================================================
    // Polling and reconnection
    // =========================================================================

    /// One poll step: drain pending reports, or try to reconnect when due
    ///
    /// Never fails; read errors move the connection to `Disconnected`.
    pub fn tick(&self) {
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }
        match self.state() {
            LinkState::Connected => self.read_reports(),
            LinkState::Disconnected => self.try_reconnect(Instant::now()),
            LinkState::Attempting => {}
        }
    }

    /// Drain every buffered input report, keeping only the newest per ID
    ///
    /// Each frame is handled before the transport mutex is released, so a
    /// reset report cannot slip between an allocation and its registration.
    pub fn read_reports(&self) {
        for _ in 0..MAX_REPORTS_PER_TICK {
            let read = self.with_transport(|t| {
                Ok(t.read_nonblocking()?.map(|frame| self.on_report(frame)))
            });
            match read {
                Ok(Some(())) => {}
                Ok(None) => return,
                Err(e) => {
                    debug!("Poll read failed: {}", e);
                    return;
                }
            }
        }
        trace!("Report drain limit reached");
    }

    fn on_report(&self, frame: Vec<u8>) {
        let Some(&id) = frame.first() else {
            return;
        };

        let decoded = match id {
            report_id::INPUT => InputReport::decode(&frame).map(drop),
            report_id::PID_STATE => {
                PidStateReport::decode(&frame).map(|status| self.on_pid_state(&status))
            }
            _ => Ok(()),
        };
        if let Err(e) = decoded {
            debug!("Dropping malformed frame: {}", e);
            return;
        }

        self.shared.reports.write().insert(id, frame);
    }

    fn on_pid_state(&self, status: &PidStateReport) {
        if status.device_reset() {
            info!("Device FFB reset event: invalidating all effects");
            self.invalidate_all();
            self.emit(DeviceEvent::DeviceReset);
        }

        if !status.effect_playing() {
            let slot = status.effect_block_index();
            if slot == 0 {
                return;
            }
            let mut stopped = false;
            for state in self.live_states() {
                if state.slot() == slot && state.started() {
                    state.set_started(false);
                    stopped = true;
                }
            }
            if stopped {
                debug!("Effect {} stopped by device", slot);
                self.emit(DeviceEvent::EffectStopped { slot });
            }
        }
    }

    /// Reopen the transport if the retry delay has elapsed
    pub fn try_reconnect(&self, now: Instant) {
        {
            let mut link = self.shared.link.lock();
            if link.state != LinkState::Disconnected {
                return;
            }
            if let Some(since) = link.disconnected_at {
                if now.saturating_duration_since(since) < self.shared.config.reconnect_delay {
                    return;
                }
            }
            link.state = LinkState::Attempting;
        }

        // Opening can take a while; writers see Disconnected meanwhile
        let result = self.shared.opener.open();

        let mut link = self.shared.link.lock();
        match result {
            Ok(transport) => {
                let device_info = transport.device_info().clone();
                link.transport = Some(transport);
                link.state = LinkState::Connected;
                link.disconnected_at = None;
                drop(link);

                info!("HID connected! ({})", device_info.path);
                self.shared.reports.write().clear();
                *self.shared.info.write() = Some(device_info.clone());
                self.emit(DeviceEvent::Connected(device_info));
            }
            Err(e) => {
                link.state = LinkState::Disconnected;
                link.disconnected_at = Some(now);
                warn!(
                    "Reconnect failed ({}), retrying in {:?}",
                    e, self.shared.config.reconnect_delay
                );
            }
        }
    }

    /// Close the transport; no reconnection is attempted afterwards
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        let mut link = self.shared.link.lock();
        link.transport = None;
        link.state = LinkState::Disconnected;
        link.disconnected_at = None;
        drop(link);
        self.invalidate_all();
        info!("HID connection closed");
    }

    // =========================================================================
    // Report cache
    // =========================================================================

    /// Most recent raw frame for a report ID
    pub fn get_report(&self, id: u8) -> Option<Vec<u8>> {
        self.shared.reports.read().get(&id).cloned()
    }

    /// Latest input snapshot
    pub fn get_input(&self) -> Option<InputReport> {
        let frame = self.get_report(report_id::INPUT)?;
        InputReport::decode(&frame)
            .map_err(|e| debug!("Cached input report unreadable: {}", e))
            .ok()
    }

    /// Latest PID state
    pub fn pid_status(&self) -> Option<PidStateReport> {
        let frame = self.get_report(report_id::PID_STATE)?;
        PidStateReport::decode(&frame).ok()
    }

    // =========================================================================
    // Effect handles
    // =========================================================================

    /// Allocate a hardware effect slot
    ///
    /// Returns `PoolExhausted` when the device has no free slot; nothing is
    /// registered in that case.
    pub fn create_effect(&self, effect_type: EffectType) -> Result<EffectHandle> {
        // Registered while the transport is still held, so the next reset
        // report read by the poll loop always sees the new slot
        let (load, state) = self.with_transport(|t| {
            t.send_feature(&CreateEffectReport::new(effect_type))?;
            let raw = t.get_feature_report(report_id::PID_BLOCK_LOAD, BlockLoadReport::SIZE)?;
            let load = BlockLoadReport::decode(&raw)?;
            let state = (load.status() == load_status::SUCCESS && load.block_index() != 0)
                .then(|| Arc::new(SlotState::new(load.block_index())));
            if let Some(state) = &state {
                self.register(state);
            }
            Ok((load, state))
        })?;

        let Some(state) = state else {
            if load.status() != load_status::SUCCESS {
                warn!("Effects pool full, cannot create new {} effect", effect_type);
                return Err(FfbError::PoolExhausted {
                    status: load.status(),
                });
            }
            return Err(FfbError::MalformedReport(
                "block load reported success with slot 0".into(),
            ));
        };
        debug!("Created effect {} ({})", load.block_index(), effect_type);
        Ok(EffectHandle::new(self.clone(), state, effect_type))
    }

    fn register(&self, state: &Arc<SlotState>) {
        let mut handles = self.shared.handles.lock();
        handles.retain(|w| w.strong_count() > 0);
        handles.push(Arc::downgrade(state));
    }

    pub(crate) fn unregister(&self, state: &Arc<SlotState>) {
        let target = Arc::downgrade(state);
        self.shared
            .handles
            .lock()
            .retain(|w| w.strong_count() > 0 && !w.ptr_eq(&target));
    }

    fn live_states(&self) -> Vec<Arc<SlotState>> {
        let mut handles = self.shared.handles.lock();
        handles.retain(|w| w.strong_count() > 0);
        handles.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of registered, still-owned effect handles
    pub fn live_handles(&self) -> usize {
        self.live_states().len()
    }

    /// Zero every live handle's slot without freeing it on the device
    fn invalidate_all(&self) -> usize {
        let states = self.live_states();
        for state in &states {
            state.take_slot();
        }
        states.len()
    }

    // =========================================================================
    // Device control, gains, firmware
    // =========================================================================

    /// Send a device control command
    pub fn device_control(&self, control: DeviceControl) -> Result<()> {
        debug!("Device control {:?}", control);
        self.write_report(&DeviceControlReport::new(control))
    }

    /// Reset the device's effect state; every effect slot is released
    pub fn reset_effects(&self) -> Result<()> {
        info!("FFB: Reset device effects");
        self.device_control(DeviceControl::Reset)?;
        std::thread::sleep(RESET_SETTLE);
        Ok(())
    }

    /// Stop every playing effect, keeping the slots allocated
    pub fn stop_all_effects(&self) -> Result<()> {
        info!("FFB: Stop all effects");
        self.device_control(DeviceControl::StopAllEffects)?;
        for state in self.live_states() {
            state.set_started(false);
        }
        Ok(())
    }

    /// Read the global gain sliders
    pub fn get_gains(&self) -> Result<GainsReport> {
        let gains = self.with_transport(|t| t.get_feature::<GainsReport>())?;
        Ok(gains)
    }

    /// Set one global gain slider (percent, clamped to 0-100)
    pub fn set_gain(&self, slider: GainSlider, percent: i32) -> Result<()> {
        let report = SetGainReport::new(slider, percent);
        debug!("Set {} gain to {}%", slider, report.value());
        self.with_transport(|t| t.send_feature(&report))
    }

    /// Firmware version string, queried over USB once and then cached
    ///
    /// Returns `None` on failure; the next call retries.
    pub fn firmware_version(&self, cached: bool) -> Option<String> {
        if cached {
            if let Some(version) = self.shared.firmware.lock().clone() {
                return Some(version);
            }
        }

        // The control transfer can take a while; run it without the transport
        let version = self
            .with_transport(|t| Ok(t.control_channel()))
            .and_then(|channel| Ok(read_firmware_version(channel.as_ref())?));
        match version {
            Ok(version) => {
                *self.shared.firmware.lock() = Some(version.clone());
                Some(version)
            }
            Err(e) => {
                warn!("Unable to read firmware version: {}", e);
                None
            }
        }
    }
}
