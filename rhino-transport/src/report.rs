//! Fixed-layout HID reports
//!
//! Every report starts with its report ID and is packed little-endian with
//! no padding. Outbound reports keep their fields private so that values are
//! clamped to the device's fixed-point ranges at construction time.

use zerocopy::byteorder::little_endian::{I16, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::ParseError;
use crate::protocol::{axis_enable, report_id, EffectOp, EffectType, GainSlider, FULL_SCALE};
use crate::units;

/// Common encode/decode behaviour for all fixed-layout reports
pub trait Report: IntoBytes + FromBytes + KnownLayout + Immutable + Copy {
    /// Report ID (first byte on the wire)
    const ID: u8;
    /// Name used in error messages and logs
    const NAME: &'static str;
    /// Encoded size in bytes, including the report ID
    const SIZE: usize = std::mem::size_of::<Self>();

    /// Serialize to wire bytes
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Parse from wire bytes; trailing bytes are ignored
    fn decode(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < Self::SIZE {
            return Err(ParseError::TooShort {
                report: Self::NAME,
                expected: Self::SIZE,
                got: buf.len(),
            });
        }
        if buf[0] != Self::ID {
            return Err(ParseError::ReportIdMismatch {
                report: Self::NAME,
                expected: Self::ID,
                got: buf[0],
            });
        }
        Self::read_from_prefix(buf)
            .map(|(report, _)| report)
            .map_err(|_| ParseError::TooShort {
                report: Self::NAME,
                expected: Self::SIZE,
                got: buf.len(),
            })
    }
}

macro_rules! impl_report {
    ($ty:ty, $id:expr, $name:literal) => {
        impl Report for $ty {
            const ID: u8 = $id;
            const NAME: &'static str = $name;
        }
    };
}

// =============================================================================
// Device -> host
// =============================================================================

/// Joystick input report (ID 1), 19 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct InputReport {
    report_id: u8,
    x: I16,
    y: I16,
    z: I16,
    rz: u8,
    ry: u8,
    rx: u8,
    slider: u8,
    buttons: U32,
    buttons_aux: U16,
    hats: U16,
}

impl_report!(InputReport, report_id::INPUT, "Input");

/// Number of button bits carried by the input report (32 + 16)
pub const BUTTON_COUNT: u8 = 48;

impl InputReport {
    /// Build an input snapshot (used by simulators and tests)
    pub fn new(x: i16, y: i16, z: i16, buttons: u64) -> Self {
        Self {
            report_id: report_id::INPUT,
            x: I16::new(x),
            y: I16::new(y),
            z: I16::new(z),
            rz: 0,
            ry: 0,
            rx: 0,
            slider: 0,
            buttons: U32::new(buttons as u32),
            buttons_aux: U16::new((buttons >> 32) as u16),
            hats: U16::new(0),
        }
    }

    pub fn x(&self) -> i16 {
        self.x.get()
    }

    pub fn y(&self) -> i16 {
        self.y.get()
    }

    pub fn z(&self) -> i16 {
        self.z.get()
    }

    pub fn rx(&self) -> u8 {
        self.rx
    }

    pub fn ry(&self) -> u8 {
        self.ry
    }

    pub fn rz(&self) -> u8 {
        self.rz
    }

    pub fn slider(&self) -> u8 {
        self.slider
    }

    pub fn hats(&self) -> u16 {
        self.hats.get()
    }

    /// All 48 button bits, main buttons in the low 32
    pub fn button_mask(&self) -> u64 {
        u64::from(self.buttons.get()) | (u64::from(self.buttons_aux.get()) << 32)
    }

    /// Whether a button is pressed; buttons are numbered from 1
    pub fn is_button_pressed(&self, button: u8) -> bool {
        if button == 0 || button > BUTTON_COUNT {
            return false;
        }
        self.button_mask() & (1u64 << (button - 1)) != 0
    }

    /// Numbers (1-based) of all pressed buttons
    pub fn pressed_buttons(&self) -> Vec<u8> {
        let mask = self.button_mask();
        (0..BUTTON_COUNT)
            .filter(|i| mask & (1u64 << i) != 0)
            .map(|i| i + 1)
            .collect()
    }

    /// Main stick position normalized to [-1.0, 1.0]
    pub fn axis_xy(&self) -> (f32, f32) {
        (
            units::device_to_normalized(i32::from(self.x())),
            units::device_to_normalized(i32::from(self.y())),
        )
    }
}

/// Flag bits of the first PID state byte
pub mod pid_flags {
    pub const DEVICE_PAUSED: u8 = 1 << 0;
    pub const ACTUATORS_ENABLED: u8 = 1 << 1;
    pub const SAFETY_SWITCH: u8 = 1 << 2;
    pub const ACTUATOR_OVERRIDE: u8 = 1 << 3;
    pub const ACTUATOR_POWER: u8 = 1 << 4;
    pub const DEVICE_RESET: u8 = 1 << 5;
}

/// PID state report (ID 2), 3 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PidStateReport {
    report_id: u8,
    flags: u8,
    /// bit 0: effect playing, bits 1..7: effect block index
    effect: u8,
}

impl_report!(PidStateReport, report_id::PID_STATE, "PidState");

impl PidStateReport {
    /// Build a status report; `flags` uses the [`pid_flags`] bits
    pub fn new(flags: u8, effect_playing: bool, block_index: u8) -> Self {
        Self {
            report_id: report_id::PID_STATE,
            flags: flags & 0x3F,
            effect: u8::from(effect_playing) | ((block_index & 0x7F) << 1),
        }
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn device_paused(&self) -> bool {
        self.flags & pid_flags::DEVICE_PAUSED != 0
    }

    pub fn actuators_enabled(&self) -> bool {
        self.flags & pid_flags::ACTUATORS_ENABLED != 0
    }

    pub fn safety_switch(&self) -> bool {
        self.flags & pid_flags::SAFETY_SWITCH != 0
    }

    pub fn actuator_override(&self) -> bool {
        self.flags & pid_flags::ACTUATOR_OVERRIDE != 0
    }

    pub fn actuator_power(&self) -> bool {
        self.flags & pid_flags::ACTUATOR_POWER != 0
    }

    pub fn device_reset(&self) -> bool {
        self.flags & pid_flags::DEVICE_RESET != 0
    }

    pub fn effect_playing(&self) -> bool {
        self.effect & 0x01 != 0
    }

    pub fn effect_block_index(&self) -> u8 {
        self.effect >> 1
    }
}

// =============================================================================
// Host -> device (output reports)
// =============================================================================

/// Set Effect report (ID 101), 17 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SetEffectReport {
    report_id: u8,
    block_index: u8,
    effect_type: u8,
    duration: U16,
    trigger_repeat_interval: U16,
    sample_period: U16,
    gain: U16,
    trigger_button: u8,
    axes_enable: u8,
    direction_x: u8,
    direction_y: u8,
    start_delay: U16,
}

impl_report!(SetEffectReport, report_id::SET_EFFECT, "SetEffect");

impl SetEffectReport {
    /// Default parameters: full gain, X and Y axes enabled, infinite duration
    pub fn new(block_index: u8, effect_type: EffectType) -> Self {
        Self {
            report_id: report_id::SET_EFFECT,
            block_index,
            effect_type: effect_type as u8,
            duration: U16::new(0),
            trigger_repeat_interval: U16::new(0),
            sample_period: U16::new(0),
            gain: U16::new(FULL_SCALE as u16),
            trigger_button: 0,
            axes_enable: axis_enable::X | axis_enable::Y,
            direction_x: 0,
            direction_y: 0,
            start_delay: U16::new(0),
        }
    }

    /// Steer the effect by direction instead of per-axis enable
    pub fn with_direction(mut self, degrees: f32) -> Self {
        self.axes_enable = axis_enable::DIRECTION;
        self.direction_x = units::degrees_to_byte(degrees);
        self
    }

    /// Duration in milliseconds (0 = infinite)
    pub fn with_duration(mut self, duration_ms: u16) -> Self {
        self.duration = U16::new(duration_ms);
        self
    }

    /// Effect gain, clamped to [0, 4096]
    pub fn with_gain(mut self, gain: i32) -> Self {
        self.gain = U16::new(units::clamp_unipolar(gain));
        self
    }

    pub fn with_start_delay(mut self, delay_ms: u16) -> Self {
        self.start_delay = U16::new(delay_ms);
        self
    }

    pub fn with_trigger(mut self, button: u8, repeat_interval_ms: u16) -> Self {
        self.trigger_button = button;
        self.trigger_repeat_interval = U16::new(repeat_interval_ms);
        self
    }

    pub fn with_sample_period(mut self, period_ms: u16) -> Self {
        self.sample_period = U16::new(period_ms);
        self
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }

    pub fn effect_type(&self) -> Option<EffectType> {
        EffectType::from_u8(self.effect_type)
    }

    pub fn duration(&self) -> u16 {
        self.duration.get()
    }

    pub fn gain(&self) -> u16 {
        self.gain.get()
    }

    pub fn axes_enable(&self) -> u8 {
        self.axes_enable
    }

    pub fn direction_x(&self) -> u8 {
        self.direction_x
    }

    pub fn direction_y(&self) -> u8 {
        self.direction_y
    }

    pub fn start_delay(&self) -> u16 {
        self.start_delay.get()
    }
}

/// Set Periodic report (ID 104), 9 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SetPeriodicReport {
    report_id: u8,
    block_index: u8,
    magnitude: U16,
    offset: I16,
    phase: u8,
    period: U16,
}

impl_report!(SetPeriodicReport, report_id::SET_PERIODIC, "SetPeriodic");

impl SetPeriodicReport {
    /// # Arguments
    /// * `magnitude` - Device units, clamped to [0, 4096]
    /// * `offset` - Device units, clamped to [-4096, 4096]
    /// * `phase_deg` - Phase in degrees, stored as a direction byte
    /// * `period_ms` - Waveform period in milliseconds
    pub fn new(block_index: u8, magnitude: i32, offset: i32, phase_deg: f32, period_ms: u16) -> Self {
        Self {
            report_id: report_id::SET_PERIODIC,
            block_index,
            magnitude: U16::new(units::clamp_unipolar(magnitude)),
            offset: I16::new(units::clamp_bipolar(offset)),
            phase: units::degrees_to_byte(phase_deg),
            period: U16::new(period_ms),
        }
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }

    pub fn magnitude(&self) -> u16 {
        self.magnitude.get()
    }

    pub fn offset(&self) -> i16 {
        self.offset.get()
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn period(&self) -> u16 {
        self.period.get()
    }
}

/// Set Constant Force report (ID 105), 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SetConstantForceReport {
    report_id: u8,
    block_index: u8,
    magnitude: I16,
}

impl_report!(SetConstantForceReport, report_id::SET_CONSTANT_FORCE, "SetConstantForce");

impl SetConstantForceReport {
    /// `magnitude` in device units, clamped to [-4096, 4096]
    pub fn new(block_index: u8, magnitude: i32) -> Self {
        Self {
            report_id: report_id::SET_CONSTANT_FORCE,
            block_index,
            magnitude: I16::new(units::clamp_bipolar(magnitude)),
        }
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }

    pub fn magnitude(&self) -> i16 {
        self.magnitude.get()
    }
}

/// Axis addressed by a Set Condition parameter block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConditionAxis {
    X = 0,
    Y = 1,
}

/// Condition parameters for one axis, in device units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionParams {
    pub center_offset: i32,
    pub positive_coefficient: i32,
    pub negative_coefficient: i32,
    pub positive_saturation: i32,
    pub negative_saturation: i32,
    pub dead_band: i32,
}

impl ConditionParams {
    /// Symmetric coefficient, no offset, saturation or dead band
    pub fn coefficient(coefficient: i32) -> Self {
        Self {
            positive_coefficient: coefficient,
            negative_coefficient: coefficient,
            ..Self::default()
        }
    }
}

/// Set Condition report (ID 103), 15 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SetConditionReport {
    report_id: u8,
    block_index: u8,
    /// bits 0..3: parameter block offset (axis), bits 4..7: instance
    parameter_block_offset: u8,
    center_offset: I16,
    positive_coefficient: I16,
    negative_coefficient: I16,
    positive_saturation: U16,
    negative_saturation: U16,
    dead_band: U16,
}

impl_report!(SetConditionReport, report_id::SET_CONDITION, "SetCondition");

impl SetConditionReport {
    pub fn new(block_index: u8, axis: ConditionAxis, params: &ConditionParams) -> Self {
        Self {
            report_id: report_id::SET_CONDITION,
            block_index,
            parameter_block_offset: axis as u8 & 0x0F,
            center_offset: I16::new(units::clamp_bipolar(params.center_offset)),
            positive_coefficient: I16::new(units::clamp_bipolar(params.positive_coefficient)),
            negative_coefficient: I16::new(units::clamp_bipolar(params.negative_coefficient)),
            positive_saturation: U16::new(units::clamp_unipolar(params.positive_saturation)),
            negative_saturation: U16::new(units::clamp_unipolar(params.negative_saturation)),
            dead_band: U16::new(units::clamp_unipolar(params.dead_band)),
        }
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }

    pub fn axis(&self) -> Option<ConditionAxis> {
        match self.parameter_block_offset & 0x0F {
            0 => Some(ConditionAxis::X),
            1 => Some(ConditionAxis::Y),
            _ => None,
        }
    }

    pub fn params(&self) -> ConditionParams {
        ConditionParams {
            center_offset: i32::from(self.center_offset.get()),
            positive_coefficient: i32::from(self.positive_coefficient.get()),
            negative_coefficient: i32::from(self.negative_coefficient.get()),
            positive_saturation: i32::from(self.positive_saturation.get()),
            negative_saturation: i32::from(self.negative_saturation.get()),
            dead_band: i32::from(self.dead_band.get()),
        }
    }
}

/// Effect Operation report (ID 110), 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct EffectOperationReport {
    report_id: u8,
    block_index: u8,
    operation: u8,
    loop_count: u8,
}

impl_report!(EffectOperationReport, report_id::EFFECT_OPERATION, "EffectOperation");

impl EffectOperationReport {
    pub fn new(block_index: u8, op: EffectOp, loop_count: u8) -> Self {
        Self {
            report_id: report_id::EFFECT_OPERATION,
            block_index,
            operation: op as u8,
            loop_count,
        }
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }

    pub fn operation(&self) -> Option<EffectOp> {
        EffectOp::from_u8(self.operation)
    }

    pub fn loop_count(&self) -> u8 {
        self.loop_count
    }
}

/// Block Free report (ID 111), 2 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BlockFreeReport {
    report_id: u8,
    block_index: u8,
}

impl_report!(BlockFreeReport, report_id::BLOCK_FREE, "BlockFree");

impl BlockFreeReport {
    pub fn new(block_index: u8) -> Self {
        Self {
            report_id: report_id::BLOCK_FREE,
            block_index,
        }
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }
}

/// Device Control report (ID 112), 2 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct DeviceControlReport {
    report_id: u8,
    control: u8,
}

impl_report!(DeviceControlReport, report_id::DEVICE_CONTROL, "DeviceControl");

impl DeviceControlReport {
    pub fn new(control: crate::protocol::DeviceControl) -> Self {
        Self {
            report_id: report_id::DEVICE_CONTROL,
            control: control as u8,
        }
    }

    pub fn control(&self) -> u8 {
        self.control
    }
}

// =============================================================================
// Feature reports
// =============================================================================

/// Create New Effect feature report (ID 5), 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CreateEffectReport {
    report_id: u8,
    effect_type: u8,
    byte_count: U16,
}

impl_report!(CreateEffectReport, report_id::CREATE_EFFECT, "CreateEffect");

impl CreateEffectReport {
    pub fn new(effect_type: EffectType) -> Self {
        Self {
            report_id: report_id::CREATE_EFFECT,
            effect_type: effect_type as u8,
            byte_count: U16::new(0),
        }
    }

    pub fn effect_type(&self) -> Option<EffectType> {
        EffectType::from_u8(self.effect_type)
    }
}

/// PID Block Load feature report (ID 6), 5 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BlockLoadReport {
    report_id: u8,
    block_index: u8,
    status: u8,
    ram_pool_available: U16,
}

impl_report!(BlockLoadReport, report_id::PID_BLOCK_LOAD, "BlockLoad");

impl BlockLoadReport {
    pub fn new(block_index: u8, status: u8, ram_pool_available: u16) -> Self {
        Self {
            report_id: report_id::PID_BLOCK_LOAD,
            block_index,
            status,
            ram_pool_available: U16::new(ram_pool_available),
        }
    }

    pub fn block_index(&self) -> u8 {
        self.block_index
    }

    /// One of [`crate::protocol::load_status`]
    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn ram_pool_available(&self) -> u16 {
        self.ram_pool_available.get()
    }
}

/// Global gains feature report (ID 0x56), 8 bytes, percent values
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct GainsReport {
    report_id: u8,
    pub master: u8,
    pub periodic: u8,
    pub spring: u8,
    pub damper: u8,
    pub inertia: u8,
    pub friction: u8,
    pub constant: u8,
}

impl_report!(GainsReport, report_id::GET_GAINS, "Gains");

impl GainsReport {
    pub fn new(values: [u8; 7]) -> Self {
        let [master, periodic, spring, damper, inertia, friction, constant] =
            values.map(|v| v.min(100));
        Self {
            report_id: report_id::GET_GAINS,
            master,
            periodic,
            spring,
            damper,
            inertia,
            friction,
            constant,
        }
    }

    pub fn get(&self, slider: GainSlider) -> u8 {
        match slider {
            GainSlider::Master => self.master,
            GainSlider::Periodic => self.periodic,
            GainSlider::Spring => self.spring,
            GainSlider::Damper => self.damper,
            GainSlider::Inertia => self.inertia,
            GainSlider::Friction => self.friction,
            GainSlider::Constant => self.constant,
        }
    }
}

/// Set gain feature report (ID 0x57), 3 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SetGainReport {
    report_id: u8,
    slider: u8,
    value: u8,
}

impl_report!(SetGainReport, report_id::SET_GAIN, "SetGain");

impl SetGainReport {
    /// `percent` is clamped to 0-100
    pub fn new(slider: GainSlider, percent: i32) -> Self {
        Self {
            report_id: report_id::SET_GAIN,
            slider: slider as u8,
            value: units::clamp_percent(percent),
        }
    }

    pub fn slider(&self) -> u8 {
        self.slider
    }

    pub fn value(&self) -> u8 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DeviceControl;

    #[test]
    fn test_report_sizes() {
        assert_eq!(InputReport::SIZE, 19);
        assert_eq!(PidStateReport::SIZE, 3);
        assert_eq!(SetEffectReport::SIZE, 17);
        assert_eq!(SetPeriodicReport::SIZE, 9);
        assert_eq!(SetConstantForceReport::SIZE, 4);
        assert_eq!(SetConditionReport::SIZE, 15);
        assert_eq!(EffectOperationReport::SIZE, 4);
        assert_eq!(BlockFreeReport::SIZE, 2);
        assert_eq!(DeviceControlReport::SIZE, 2);
        assert_eq!(CreateEffectReport::SIZE, 4);
        assert_eq!(BlockLoadReport::SIZE, 5);
        assert_eq!(GainsReport::SIZE, 8);
        assert_eq!(SetGainReport::SIZE, 3);
    }

    #[test]
    fn test_set_effect_defaults() {
        let r = SetEffectReport::new(3, EffectType::Spring);
        let bytes = r.encode();
        assert_eq!(
            bytes,
            vec![101, 3, 8, 0, 0, 0, 0, 0, 0, 0x00, 0x10, 0, 3, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_set_effect_direction() {
        let r = SetEffectReport::new(1, EffectType::Constant)
            .with_direction(90.0)
            .with_duration(500);
        assert_eq!(r.axes_enable(), axis_enable::DIRECTION);
        assert_eq!(r.direction_x(), 64);
        assert_eq!(r.duration(), 500);
    }

    #[test]
    fn test_constant_force_layout() {
        let r = SetConstantForceReport::new(2, -4096);
        assert_eq!(r.encode(), vec![105, 2, 0x00, 0xF0]);
        assert_eq!(SetConstantForceReport::new(2, 9000).magnitude(), 4096);
    }

    #[test]
    fn test_condition_layout() {
        let r = SetConditionReport::new(4, ConditionAxis::Y, &ConditionParams::coefficient(2048));
        assert_eq!(
            r.encode(),
            vec![103, 4, 1, 0, 0, 0x00, 0x08, 0x00, 0x08, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(r.axis(), Some(ConditionAxis::Y));
    }

    #[test]
    fn test_condition_clamps() {
        let params = ConditionParams {
            center_offset: -9999,
            positive_coefficient: 5000,
            negative_coefficient: -5000,
            positive_saturation: -1,
            negative_saturation: 70000,
            dead_band: 10,
        };
        let r = SetConditionReport::new(1, ConditionAxis::X, &params);
        let p = r.params();
        assert_eq!(p.center_offset, -4096);
        assert_eq!(p.positive_coefficient, 4096);
        assert_eq!(p.negative_coefficient, -4096);
        assert_eq!(p.positive_saturation, 0);
        assert_eq!(p.negative_saturation, 4096);
        assert_eq!(p.dead_band, 10);
    }

    #[test]
    fn test_periodic_layout() {
        let r = SetPeriodicReport::new(7, 1229, 0, 45.0, 50);
        assert_eq!(r.encode(), vec![104, 7, 0xCD, 0x04, 0, 0, 32, 50, 0]);
    }

    #[test]
    fn test_effect_operation_and_free() {
        assert_eq!(
            EffectOperationReport::new(5, EffectOp::Start, 1).encode(),
            vec![110, 5, 1, 1]
        );
        assert_eq!(BlockFreeReport::new(5).encode(), vec![111, 5]);
        assert_eq!(
            DeviceControlReport::new(DeviceControl::Reset).encode(),
            vec![112, 4]
        );
        assert_eq!(
            CreateEffectReport::new(EffectType::Sine).encode(),
            vec![5, 4, 0, 0]
        );
    }

    #[test]
    fn test_pid_state_bits() {
        let r = PidStateReport::decode(&[2, 0b0010_0010, 0b0000_0111]).unwrap();
        assert!(r.device_reset());
        assert!(r.actuators_enabled());
        assert!(!r.device_paused());
        assert!(r.effect_playing());
        assert_eq!(r.effect_block_index(), 3);

        let built = PidStateReport::new(pid_flags::DEVICE_RESET, false, 9);
        assert_eq!(built.encode(), vec![2, 0x20, 18]);
    }

    #[test]
    fn test_input_buttons() {
        let mut buf = vec![0u8; 19];
        buf[0] = 1;
        // X = 2048, Y = -4096
        buf[1..3].copy_from_slice(&2048i16.to_le_bytes());
        buf[3..5].copy_from_slice(&(-4096i16).to_le_bytes());
        // buttons 1 and 3, aux button 33
        buf[11..15].copy_from_slice(&0b101u32.to_le_bytes());
        buf[15..17].copy_from_slice(&1u16.to_le_bytes());

        let r = InputReport::decode(&buf).unwrap();
        assert!(r.is_button_pressed(1));
        assert!(!r.is_button_pressed(2));
        assert!(r.is_button_pressed(3));
        assert!(r.is_button_pressed(33));
        assert!(!r.is_button_pressed(0));
        assert!(!r.is_button_pressed(49));
        assert_eq!(r.pressed_buttons(), vec![1, 3, 33]);
        assert_eq!(r.axis_xy(), (0.5, -1.0));
    }

    #[test]
    fn test_decode_too_short() {
        let err = InputReport::decode(&[1, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            ParseError::TooShort {
                report: "Input",
                expected: 19,
                got: 3
            }
        );
    }

    #[test]
    fn test_decode_wrong_id() {
        let err = BlockLoadReport::decode(&[7, 1, 1, 0, 0]).unwrap_err();
        assert!(matches!(err, ParseError::ReportIdMismatch { expected: 6, got: 7, .. }));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut buf = vec![2, 0, 1];
        buf.extend_from_slice(&[0xAA; 61]);
        let r = PidStateReport::decode(&buf).unwrap();
        assert!(r.effect_playing());
    }

    #[test]
    fn test_gains() {
        let r = GainsReport::decode(&[0x56, 100, 90, 80, 70, 60, 50, 40]).unwrap();
        assert_eq!(r.get(GainSlider::Master), 100);
        assert_eq!(r.get(GainSlider::Constant), 40);
        assert_eq!(SetGainReport::new(GainSlider::Constant, 140).encode(), vec![0x57, 7, 100]);
    }
}
