//! Effect lifecycle tests against the simulated device.

use std::time::Duration;

use proptest::prelude::*;
use rhino_ffb::{
    ConnectionConfig, DeviceConnection, DeviceEvent, EffectRegistry, EffectType, FfbError,
    HapticEffect, LinkState,
};
use rhino_transport::mock::{MockOpener, MockTransport};
use rhino_transport::protocol::{report_id, EffectOp};
use rhino_transport::report::pid_flags;
use rhino_transport::{
    units, ConditionAxis, EffectOperationReport, PidStateReport, Report, SetConditionReport,
};

fn connect_with(mock: &MockTransport, config: ConnectionConfig) -> (MockOpener, DeviceConnection) {
    let opener = MockOpener::new(mock.clone());
    let conn = DeviceConnection::with_opener(opener.clone(), config).unwrap();
    (opener, conn)
}

fn connect() -> (MockTransport, DeviceConnection) {
    let mock = MockTransport::new();
    let (_, conn) = connect_with(&mock, ConnectionConfig::default());
    (mock, conn)
}

#[test]
fn test_spring_scenario_write_counts() {
    let (mock, conn) = connect();
    let mut effects = EffectRegistry::new(conn);

    effects.get("spring").spring(Some(2048), Some(2048)).start(false);
    effects.get("spring").spring(Some(2048), Some(2048));

    let conditions = mock.writes_with_id(report_id::SET_CONDITION);
    assert_eq!(conditions.len(), 2);
    let x = SetConditionReport::decode(&conditions[0]).unwrap();
    let y = SetConditionReport::decode(&conditions[1]).unwrap();
    assert_eq!(x.axis(), Some(ConditionAxis::X));
    assert_eq!(y.axis(), Some(ConditionAxis::Y));
    assert_eq!(x.params().positive_coefficient, 2048);

    let ops = mock.writes_with_id(report_id::EFFECT_OPERATION);
    assert_eq!(ops.len(), 1);
    let op = EffectOperationReport::decode(&ops[0]).unwrap();
    assert_eq!(op.operation(), Some(EffectOp::Start));

    let before = mock.write_count();
    effects.get("spring").spring(Some(2048), Some(2048)).start(false);
    assert_eq!(mock.write_count(), before);
}

#[test]
fn test_parameters_precede_start() {
    let (mock, conn) = connect();
    let mut effect = HapticEffect::new(conn);
    effect.constant(0.75, 270.0).start(false);

    let ids: Vec<u8> = mock.writes().iter().map(|w| w[0]).collect();
    assert_eq!(
        ids,
        vec![
            report_id::SET_EFFECT,
            report_id::SET_CONSTANT_FORCE,
            report_id::EFFECT_OPERATION
        ]
    );
}

#[test]
fn test_destroy_twice_single_block_free() {
    let (mock, conn) = connect();
    let mut handle = conn.create_effect(EffectType::Triangle).unwrap();
    handle.destroy();
    handle.destroy();
    assert_eq!(handle.slot(), 0);
    assert_eq!(mock.writes_with_id(report_id::BLOCK_FREE).len(), 1);
}

#[test]
fn test_reset_invalidates_and_start_is_noop() {
    let (mock, conn) = connect();
    let mut a = conn.create_effect(EffectType::Spring).unwrap();
    let mut b = conn.create_effect(EffectType::Sine).unwrap();

    mock.queue_report(&PidStateReport::new(pid_flags::DEVICE_RESET, false, 0));
    conn.tick();
    mock.clear_writes();

    assert_eq!((a.slot(), b.slot()), (0, 0));
    a.start(1, false);
    b.start_solo(1);
    assert!(!a.started());
    assert!(!b.started());
    assert_eq!(mock.write_count(), 0);
}

#[test]
fn test_pool_exhaustion_is_recoverable() {
    let mock = MockTransport::new().with_pool_size(2);
    let (_, conn) = connect_with(&mock, ConnectionConfig::default());

    let first = conn.create_effect(EffectType::Spring).unwrap();
    let _second = conn.create_effect(EffectType::Damper).unwrap();
    assert!(matches!(
        conn.create_effect(EffectType::Inertia),
        Err(FfbError::PoolExhausted { .. })
    ));
    assert_eq!(conn.live_handles(), 2);

    // freeing a slot makes room again
    drop(first);
    let third = conn.create_effect(EffectType::Inertia).unwrap();
    assert_eq!(third.slot(), 1);
}

#[test]
fn test_reconnection_reallocates_lazily() {
    let mock = MockTransport::new();
    let config = ConnectionConfig {
        reconnect_delay: Duration::ZERO,
        ..ConnectionConfig::default()
    };
    let (opener, conn) = connect_with(&mock, config);
    let mut effects = EffectRegistry::new(conn.clone());
    effects.get("rumble").damper(Some(500), Some(500)).start(false);
    assert_eq!(effects.get("rumble").slot(), 1);

    mock.set_fail_writes(true);
    effects.get("rumble").damper(Some(600), Some(600));
    assert_eq!(conn.state(), LinkState::Disconnected);
    assert_eq!(effects.get("rumble").slot(), 0);

    // writes while disconnected are dropped without panicking
    effects.get("rumble").start(true).stop(None);
    assert!(conn.write(&[report_id::DEVICE_CONTROL, 3]).is_err());

    mock.reconnect();
    conn.tick();
    assert!(conn.is_connected());
    assert_eq!(opener.open_count(), 2);
    mock.clear_writes();

    effects.get("rumble").damper(Some(600), Some(600)).start(false);
    assert_eq!(effects.get("rumble").slot(), 1);
    assert!(effects.get("rumble").started());
    assert_eq!(mock.writes_with_id(report_id::BLOCK_FREE).len(), 0);
    assert_eq!(mock.writes_with_id(report_id::SET_CONDITION).len(), 2);
    assert_eq!(mock.allocated_slots(), vec![1]);
}

#[test]
fn test_stop_all_keeps_slots() {
    let (mock, conn) = connect();
    let mut effects = EffectRegistry::new(conn.clone());
    effects.get("a").friction(Some(100), None).start(false);
    effects.get("b").inertia(Some(100), None).start(false);

    conn.stop_all_effects().unwrap();
    assert!(!effects.get("a").started());
    assert!(!effects.get("b").started());
    assert_eq!(mock.allocated_slots(), vec![1, 2]);
}

#[tokio::test]
async fn test_reset_event_broadcast() {
    let (mock, conn) = connect();
    let mut events = conn.subscribe();
    mock.queue_report(&PidStateReport::new(
        pid_flags::DEVICE_RESET | pid_flags::ACTUATORS_ENABLED,
        false,
        0,
    ));
    conn.tick();

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, DeviceEvent::DeviceReset);
    assert!(conn.pid_status().unwrap().actuators_enabled());
}

#[tokio::test]
async fn test_reconnect_events() {
    let mock = MockTransport::new();
    let config = ConnectionConfig {
        reconnect_delay: Duration::ZERO,
        ..ConnectionConfig::default()
    };
    let (_, conn) = connect_with(&mock, config);
    let mut events = conn.subscribe();

    mock.disconnect();
    conn.tick();
    mock.reconnect();
    conn.tick();

    assert!(matches!(events.recv().await.unwrap(), DeviceEvent::Disconnected(_)));
    match events.recv().await.unwrap() {
        DeviceEvent::Connected(info) => assert_eq!(info.path, "mock://rhino"),
        other => panic!("unexpected event {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// One write per change of the encoded magnitude, none for repeats
    #[test]
    fn prop_constant_force_suppression(magnitudes in prop::collection::vec(-1.5f32..1.5, 1..40)) {
        let (mock, conn) = connect();
        let mut effect = HapticEffect::new(conn);
        for &m in &magnitudes {
            effect.constant(m, 0.0);
        }

        let encoded: Vec<i16> = magnitudes.iter().map(|&m| units::bipolar_to_device(m)).collect();
        let changes = 1 + encoded.windows(2).filter(|w| w[0] != w[1]).count();
        prop_assert_eq!(mock.writes_with_id(report_id::SET_CONSTANT_FORCE).len(), changes);
        prop_assert_eq!(mock.writes_with_id(report_id::SET_EFFECT).len(), 1);
    }

    /// Condition writes never carry values outside the device range
    #[test]
    fn prop_condition_values_clamped(x in any::<i32>(), y in any::<i32>()) {
        let (mock, conn) = connect();
        let mut effect = HapticEffect::new(conn);
        effect.spring(Some(x), Some(y));
        for frame in mock.writes_with_id(report_id::SET_CONDITION) {
            let params = SetConditionReport::decode(&frame).unwrap().params();
            prop_assert!(params.positive_coefficient.abs() <= 4096);
            prop_assert!(params.negative_coefficient.abs() <= 4096);
        }
    }
}
