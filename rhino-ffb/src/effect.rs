//! Effect handle: one hardware effect slot
//!
//! Parameter setters remember the last payload written per report kind (and
//! per axis for conditions) and skip the write when nothing changed. Every
//! operation on an invalidated handle (slot 0) is a logged no-op; transport
//! failures are logged and swallowed, the connection takes care of
//! reconnecting.

use std::collections::HashMap;
use std::sync::Arc;

use rhino_transport::protocol::{EffectOp, FULL_SCALE};
use rhino_transport::{
    units, BlockFreeReport, ConditionAxis, ConditionParams, EffectOperationReport, EffectType,
    Report, SetConditionReport, SetConstantForceReport, SetEffectReport, SetPeriodicReport,
};
use tracing::{debug, trace, warn};

use crate::connection::{DeviceConnection, SlotState};
use crate::error::FfbError;

/// Cache key for write suppression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PayloadKey {
    Effect,
    Periodic,
    ConstantForce,
    Condition(ConditionAxis),
}

/// General effect parameters (Set Effect report)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Duration in milliseconds, 0 = until stopped
    pub duration_ms: u16,
    /// Effect gain in device units [0, 4096]
    pub gain: i32,
    /// Steering angle in degrees; `None` enables the X and Y axes instead
    pub direction: Option<f32>,
    pub start_delay_ms: u16,
    pub trigger_button: u8,
    pub trigger_repeat_ms: u16,
    pub sample_period_ms: u16,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            gain: i32::from(FULL_SCALE),
            direction: None,
            start_delay_ms: 0,
            trigger_button: 0,
            trigger_repeat_ms: 0,
            sample_period_ms: 0,
        }
    }
}

impl EffectParams {
    /// Default parameters steered by an angle
    pub fn directional(degrees: f32) -> Self {
        Self {
            direction: Some(degrees),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration_ms: u16) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    fn to_report(self, slot: u8, effect_type: EffectType) -> SetEffectReport {
        let mut report = SetEffectReport::new(slot, effect_type)
            .with_duration(self.duration_ms)
            .with_gain(self.gain)
            .with_start_delay(self.start_delay_ms)
            .with_trigger(self.trigger_button, self.trigger_repeat_ms)
            .with_sample_period(self.sample_period_ms);
        if let Some(degrees) = self.direction {
            report = report.with_direction(degrees);
        }
        report
    }
}

/// Periodic waveform parameters, logical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicParams {
    pub frequency_hz: f32,
    /// Unipolar [0.0, 1.0]
    pub magnitude: f32,
    /// Bipolar [-1.0, 1.0]
    pub offset: f32,
    pub phase_deg: f32,
}

/// One allocated hardware effect
///
/// The handle exclusively owns its slot. Dropping it frees the slot.
pub struct EffectHandle {
    connection: DeviceConnection,
    state: Arc<SlotState>,
    effect_type: EffectType,
    sent: HashMap<PayloadKey, Vec<u8>>,
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EffectHandle({}, {})", self.slot(), self.effect_type)
    }
}

impl EffectHandle {
    pub(crate) fn new(
        connection: DeviceConnection,
        state: Arc<SlotState>,
        effect_type: EffectType,
    ) -> Self {
        Self {
            connection,
            state,
            effect_type,
            sent: HashMap::new(),
        }
    }

    /// Device slot index, 0 once destroyed or invalidated
    pub fn slot(&self) -> u8 {
        self.state.slot()
    }

    pub fn is_valid(&self) -> bool {
        self.slot() != 0
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    pub fn name(&self) -> &'static str {
        self.effect_type.name()
    }

    pub fn started(&self) -> bool {
        self.state.started()
    }

    /// Slot for a new write, or `None` (logged) when invalidated
    fn live_slot(&self, op: &str) -> Option<u8> {
        let slot = self.slot();
        if slot == 0 {
            debug!("{} on an invalidated {} effect ignored", op, self.effect_type);
            None
        } else {
            Some(slot)
        }
    }

    fn send<R: Report>(&self, report: &R) -> Result<(), FfbError> {
        self.connection.write_report(report).map_err(|e| {
            warn!("{} for effect {} failed: {}", R::NAME, self.slot(), e);
            e
        })
    }

    /// Write unless the same bytes were the last ones sent under `key`
    fn send_if_changed<R: Report>(&mut self, key: PayloadKey, report: &R) -> bool {
        let bytes = report.encode();
        if self.sent.get(&key) == Some(&bytes) {
            trace!("{} unchanged for effect {}, skipped", R::NAME, self.slot());
            return false;
        }
        if self.send(report).is_err() {
            return false;
        }
        self.sent.insert(key, bytes);
        true
    }

    /// Start playback
    ///
    /// # Arguments
    /// * `loop_count` - Number of repetitions
    /// * `override_others` - Use start-override instead of start
    pub fn start(&mut self, loop_count: u8, override_others: bool) -> &mut Self {
        let Some(slot) = self.live_slot("start") else {
            return self;
        };
        let op = if override_others {
            EffectOp::StartOverride
        } else {
            EffectOp::Start
        };
        if self
            .send(&EffectOperationReport::new(slot, op, loop_count))
            .is_ok()
        {
            self.state.set_started(true);
        }
        self
    }

    /// Start as the only playing effect
    pub fn start_solo(&mut self, loop_count: u8) -> &mut Self {
        let Some(slot) = self.live_slot("start") else {
            return self;
        };
        if self
            .send(&EffectOperationReport::new(slot, EffectOp::StartSolo, loop_count))
            .is_ok()
        {
            self.state.set_started(true);
        }
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        let Some(slot) = self.live_slot("stop") else {
            return self;
        };
        // The caller's intent is "not playing" even if the write is lost
        let _ = self.send(&EffectOperationReport::new(slot, EffectOp::Stop, 0));
        self.state.set_started(false);
        self
    }

    /// Free the hardware slot; safe to call repeatedly
    pub fn destroy(&mut self) {
        let slot = self.state.take_slot();
        self.sent.clear();
        if slot == 0 {
            return;
        }
        debug!("Destroying effect {} ({})", slot, self.effect_type);
        let _ = self.send(&BlockFreeReport::new(slot));
    }

    /// Set general effect parameters
    pub fn set_effect(&mut self, params: EffectParams) -> &mut Self {
        let Some(slot) = self.live_slot("set_effect") else {
            return self;
        };
        let report = params.to_report(slot, self.effect_type);
        self.send_if_changed(PayloadKey::Effect, &report);
        self
    }

    /// Set constant force magnitude (bipolar, clamped to [-1.0, 1.0])
    pub fn set_constant_force(&mut self, magnitude: f32) -> &mut Self {
        let Some(slot) = self.live_slot("set_constant_force") else {
            return self;
        };
        if self.effect_type != EffectType::Constant {
            debug!("set_constant_force on a {} effect ignored", self.effect_type);
            return self;
        }
        let report =
            SetConstantForceReport::new(slot, i32::from(units::bipolar_to_device(magnitude)));
        self.send_if_changed(PayloadKey::ConstantForce, &report);
        self
    }

    /// Set periodic waveform parameters
    pub fn set_periodic(&mut self, params: &PeriodicParams) -> &mut Self {
        let Some(slot) = self.live_slot("set_periodic") else {
            return self;
        };
        if !self.effect_type.is_periodic() {
            debug!("set_periodic on a {} effect ignored", self.effect_type);
            return self;
        }
        let report = SetPeriodicReport::new(
            slot,
            i32::from(units::unipolar_to_device(params.magnitude)),
            i32::from(units::bipolar_to_device(params.offset)),
            params.phase_deg,
            units::frequency_to_period_ms(params.frequency_hz),
        );
        self.send_if_changed(PayloadKey::Periodic, &report);
        self
    }

    /// Set condition parameters for one axis (device units, clamped)
    pub fn set_condition(&mut self, axis: ConditionAxis, params: &ConditionParams) -> &mut Self {
        let Some(slot) = self.live_slot("set_condition") else {
            return self;
        };
        if !self.effect_type.is_condition() {
            debug!("set_condition on a {} effect ignored", self.effect_type);
            return self;
        }
        let report = SetConditionReport::new(slot, axis, params);
        self.send_if_changed(PayloadKey::Condition(axis), &report);
        self
    }
}

impl Drop for EffectHandle {
    fn drop(&mut self) {
        self.destroy();
        self.connection.unregister(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionConfig;
    use rhino_transport::mock::{MockOpener, MockTransport};
    use rhino_transport::protocol::report_id;

    fn connect() -> (MockTransport, DeviceConnection) {
        let mock = MockTransport::new();
        let conn =
            DeviceConnection::with_opener(MockOpener::new(mock.clone()), ConnectionConfig::default())
                .unwrap();
        (mock, conn)
    }

    #[test]
    fn test_destroy_idempotent() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Spring).unwrap();
        h.destroy();
        h.destroy();
        assert_eq!(h.slot(), 0);
        drop(h);
        assert_eq!(mock.writes_with_id(report_id::BLOCK_FREE), vec![vec![111, 1]]);
        assert_eq!(conn.live_handles(), 0);
    }

    #[test]
    fn test_write_suppression() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Constant).unwrap();
        h.set_constant_force(0.5);
        h.set_constant_force(0.5);
        assert_eq!(mock.writes_with_id(report_id::SET_CONSTANT_FORCE).len(), 1);

        h.set_constant_force(-0.25);
        let writes = mock.writes_with_id(report_id::SET_CONSTANT_FORCE);
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1], vec![105, 1, 0x00, 0xFC]);
    }

    #[test]
    fn test_condition_cache_per_axis() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Damper).unwrap();
        let p = ConditionParams::coefficient(1000);
        h.set_condition(ConditionAxis::X, &p);
        h.set_condition(ConditionAxis::Y, &p);
        h.set_condition(ConditionAxis::X, &p);
        h.set_condition(ConditionAxis::Y, &p);
        assert_eq!(mock.writes_with_id(report_id::SET_CONDITION).len(), 2);
    }

    #[test]
    fn test_failed_write_not_cached() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Constant).unwrap();
        mock.set_fail_writes(true);
        h.set_constant_force(0.5);
        assert!(!conn.is_connected());
        assert_eq!(h.slot(), 0);
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn test_invalidated_handle_is_noop() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Sine).unwrap();
        h.state.take_slot();
        mock.clear_writes();

        h.start(1, false)
            .set_periodic(&PeriodicParams {
                frequency_hz: 10.0,
                magnitude: 0.5,
                offset: 0.0,
                phase_deg: 0.0,
            })
            .stop();
        h.destroy();
        assert_eq!(mock.write_count(), 0);
        assert!(!h.started());
    }

    #[test]
    fn test_start_override_and_stop() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Friction).unwrap();
        h.start(2, true);
        assert!(h.started());
        h.stop();
        assert!(!h.started());
        assert_eq!(
            mock.writes_with_id(report_id::EFFECT_OPERATION),
            vec![vec![110, 1, 4, 2], vec![110, 1, 3, 0]]
        );
    }

    #[test]
    fn test_wrong_family_setter_ignored() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Spring).unwrap();
        h.set_constant_force(1.0);
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn test_directional_effect_params() {
        let (mock, conn) = connect();
        let mut h = conn.create_effect(EffectType::Constant).unwrap();
        h.set_effect(EffectParams::directional(180.0).with_duration(100));
        let w = mock.writes_with_id(report_id::SET_EFFECT);
        let report = SetEffectReport::decode(&w[0]).unwrap();
        assert_eq!(report.direction_x(), 128);
        assert_eq!(report.duration(), 100);
        assert_eq!(report.gain(), 4096);
    }
}
