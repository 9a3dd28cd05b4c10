//! Conversions between logical values and device fixed-point units
//!
//! Angles are degrees in the logical layer and a 0-255 byte on the wire.
//! Forces, coefficients and gains are normalized floats in the logical layer
//! and 4096-based fixed point on the wire.

use crate::protocol::FULL_SCALE;

const FULL_SCALE_F: f32 = FULL_SCALE as f32;

/// Degrees (any range) to the 0-255 direction byte
pub fn degrees_to_byte(degrees: f32) -> u8 {
    if !degrees.is_finite() {
        return 0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    (wrapped * 255.0 / 360.0).round().clamp(0.0, 255.0) as u8
}

/// Direction byte back to degrees in [0, 360]
pub fn byte_to_degrees(value: u8) -> f32 {
    f32::from(value) * 360.0 / 255.0
}

/// Bipolar [-1.0, 1.0] to [-4096, 4096]; out-of-range input is clamped
pub fn bipolar_to_device(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(-1.0, 1.0) * FULL_SCALE_F).round() as i16
}

/// Unipolar [0.0, 1.0] to [0, 4096]; out-of-range input is clamped
pub fn unipolar_to_device(value: f32) -> u16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * FULL_SCALE_F).round() as u16
}

/// Clamp a raw signed device value to [-4096, 4096]
pub fn clamp_bipolar(value: i32) -> i16 {
    value.clamp(-i32::from(FULL_SCALE), i32::from(FULL_SCALE)) as i16
}

/// Clamp a raw unsigned device value to [0, 4096]
pub fn clamp_unipolar(value: i32) -> u16 {
    value.clamp(0, i32::from(FULL_SCALE)) as u16
}

/// Device value back to a normalized float
pub fn device_to_normalized(value: i32) -> f32 {
    value as f32 / FULL_SCALE_F
}

/// Frequency in Hz to the periodic report's period in milliseconds (0 Hz -> 0)
pub fn frequency_to_period_ms(frequency_hz: f32) -> u16 {
    if frequency_hz <= 0.0 || !frequency_hz.is_finite() {
        return 0;
    }
    (1000.0 / frequency_hz).round().clamp(0.0, f32::from(u16::MAX)) as u16
}

/// Gain percentage clamped to 0-100
pub fn clamp_percent(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}
