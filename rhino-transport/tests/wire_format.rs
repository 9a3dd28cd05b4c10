//! Wire format properties: round trips, clamping and decode errors

use proptest::prelude::*;
use rhino_transport::protocol::{EffectOp, EffectType, GainSlider};
use rhino_transport::units;
use rhino_transport::{
    BlockLoadReport, ConditionAxis, ConditionParams, EffectOperationReport, GainsReport,
    InputReport, ParseError, PidStateReport, Report, SetConditionReport, SetConstantForceReport,
    SetEffectReport, SetGainReport, SetPeriodicReport,
};

fn effect_type() -> impl Strategy<Value = EffectType> {
    (1u8..=12).prop_map(|v| EffectType::from_u8(v).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_bipolar_never_exceeds_full_scale(v in proptest::num::f32::ANY) {
        let d = units::bipolar_to_device(v);
        prop_assert!((-4096..=4096).contains(&d));
    }

    #[test]
    fn prop_unipolar_never_exceeds_full_scale(v in proptest::num::f32::ANY) {
        prop_assert!(units::unipolar_to_device(v) <= 4096);
    }

    #[test]
    fn prop_direction_byte_inverse(b in 0u8..255) {
        // 255 is 360 degrees, which wraps to 0
        prop_assert_eq!(units::degrees_to_byte(units::byte_to_degrees(b)), b);
    }

    #[test]
    fn prop_direction_wraps(deg in -720.0f32..720.0) {
        let a = units::degrees_to_byte(deg);
        let b = units::degrees_to_byte(deg + 360.0);
        // rounding at the 0/255 seam may differ by one step
        prop_assert!(a.abs_diff(b) <= 1 || a.abs_diff(b) == 255);
    }

    #[test]
    fn prop_set_effect_roundtrip(
        slot in 1u8..=127,
        ty in effect_type(),
        deg in 0.0f32..360.0,
        duration in any::<u16>(),
        gain in -10_000i32..10_000,
        delay in any::<u16>(),
    ) {
        let r = SetEffectReport::new(slot, ty)
            .with_direction(deg)
            .with_duration(duration)
            .with_gain(gain)
            .with_start_delay(delay);
        let decoded = SetEffectReport::decode(&r.encode()).unwrap();
        prop_assert_eq!(decoded, r);
        prop_assert!(decoded.gain() <= 4096);
        prop_assert_eq!(decoded.effect_type(), Some(ty));
    }

    #[test]
    fn prop_condition_roundtrip_and_clamp(
        slot in 1u8..=127,
        y_axis in any::<bool>(),
        offset in any::<i32>(),
        pos in any::<i32>(),
        neg in any::<i32>(),
        sat in any::<i32>(),
        dead in any::<i32>(),
    ) {
        let axis = if y_axis { ConditionAxis::Y } else { ConditionAxis::X };
        let params = ConditionParams {
            center_offset: offset,
            positive_coefficient: pos,
            negative_coefficient: neg,
            positive_saturation: sat,
            negative_saturation: sat,
            dead_band: dead,
        };
        let r = SetConditionReport::new(slot, axis, &params);
        let decoded = SetConditionReport::decode(&r.encode()).unwrap();
        prop_assert_eq!(decoded, r);
        prop_assert_eq!(decoded.axis(), Some(axis));
        let p = decoded.params();
        for v in [p.center_offset, p.positive_coefficient, p.negative_coefficient] {
            prop_assert!((-4096..=4096).contains(&v));
        }
        for v in [p.positive_saturation, p.negative_saturation, p.dead_band] {
            prop_assert!((0..=4096).contains(&v));
        }
    }

    #[test]
    fn prop_periodic_and_constant_roundtrip(
        slot in 1u8..=127,
        mag in any::<i32>(),
        offset in any::<i32>(),
        phase in 0.0f32..360.0,
        period in any::<u16>(),
    ) {
        let p = SetPeriodicReport::new(slot, mag, offset, phase, period);
        prop_assert_eq!(SetPeriodicReport::decode(&p.encode()).unwrap(), p);
        prop_assert!(p.magnitude() <= 4096);

        let c = SetConstantForceReport::new(slot, mag);
        prop_assert_eq!(SetConstantForceReport::decode(&c.encode()).unwrap(), c);
        prop_assert!((-4096..=4096).contains(&c.magnitude()));
    }

    #[test]
    fn prop_pid_state_roundtrip(flags in 0u8..64, playing in any::<bool>(), index in 0u8..128) {
        let r = PidStateReport::new(flags, playing, index);
        let decoded = PidStateReport::decode(&r.encode()).unwrap();
        prop_assert_eq!(decoded.flags(), flags);
        prop_assert_eq!(decoded.effect_playing(), playing);
        prop_assert_eq!(decoded.effect_block_index(), index);
    }

    #[test]
    fn prop_input_roundtrip(x in any::<i16>(), y in any::<i16>(), z in any::<i16>(), buttons in 0u64..(1 << 48)) {
        let r = InputReport::new(x, y, z, buttons);
        let decoded = InputReport::decode(&r.encode()).unwrap();
        prop_assert_eq!(decoded, r);
        prop_assert_eq!(decoded.button_mask(), buttons);
    }

    #[test]
    fn prop_gain_percent_clamped(percent in any::<i32>()) {
        let r = SetGainReport::new(GainSlider::Master, percent);
        prop_assert!(r.value() <= 100);
    }

    #[test]
    fn prop_short_buffers_rejected(len in 0usize..17) {
        let buf = vec![101u8; len];
        let is_too_short = matches!(
            SetEffectReport::decode(&buf),
            Err(ParseError::TooShort { .. })
        );
        prop_assert!(is_too_short);
    }
}

#[test]
fn test_fixed_reports_roundtrip() {
    let op = EffectOperationReport::new(9, EffectOp::StartOverride, 3);
    assert_eq!(EffectOperationReport::decode(&op.encode()).unwrap(), op);

    let load = BlockLoadReport::new(4, 1, 1024);
    let decoded = BlockLoadReport::decode(&load.encode()).unwrap();
    assert_eq!(decoded.block_index(), 4);
    assert_eq!(decoded.ram_pool_available(), 1024);

    let gains = GainsReport::new([100, 90, 80, 70, 60, 50, 40]);
    assert_eq!(GainsReport::decode(&gains.encode()).unwrap(), gains);
}
