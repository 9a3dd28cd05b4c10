//! Test effect playback.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use super::{open_connection, setup_interrupt_handler, CommandResult};
use crate::cli::TestEffectKind;
use rhino_driver::DriverConfig;
use rhino_ffb::{HapticEffect, Periodic, PeriodicKind, PollLoop};
use rhino_transport::units;
use tracing::info;

/// Waveform frequency of the sine test
const SINE_FREQUENCY_HZ: f32 = 10.0;

/// Play one effect for `seconds`, then stop it and wait for its slot to be
/// released after the configured idle time
pub fn test_effect(
    config: &DriverConfig,
    kind: TestEffectKind,
    strength: f32,
    seconds: f32,
) -> CommandResult {
    let conn = open_connection(config)?;
    let _poll = PollLoop::spawn(conn.clone())?;
    let running = setup_interrupt_handler();

    let strength = strength.clamp(0.0, 1.0);
    let coefficient = i32::from(units::bipolar_to_device(strength));
    let mut effect = HapticEffect::named(conn.clone(), format!("{kind:?}").to_lowercase());

    match kind {
        TestEffectKind::Constant => effect.constant(strength, 0.0),
        TestEffectKind::Sine => effect.periodic(Periodic {
            kind: PeriodicKind::Sine,
            frequency_hz: SINE_FREQUENCY_HZ,
            magnitude: strength,
            ..Periodic::default()
        }),
        TestEffectKind::Spring => effect.spring(Some(coefficient), Some(coefficient)),
        TestEffectKind::Damper => effect.damper(Some(coefficient), Some(coefficient)),
    };

    if !effect.is_allocated() {
        anyhow::bail!("Could not allocate a {kind:?} effect (pool full or device gone)");
    }
    effect.start(false);
    println!(
        "Playing {:?} (slot {}) at {:.0}% for {:.1}s, Ctrl+C to stop",
        kind,
        effect.slot(),
        strength * 100.0,
        seconds
    );

    let play_for = Duration::from_secs_f32(seconds.max(0.0));
    let started = Instant::now();
    while running.load(Ordering::SeqCst) && started.elapsed() < play_for {
        std::thread::sleep(Duration::from_millis(20));
        if !effect.started() {
            info!("Effect stopped by the device");
            break;
        }
    }

    let destroy_after = config.destroy_after();
    effect.stop(Some(destroy_after));
    print!("Stopped, releasing slot after {:?} idle...", destroy_after);
    let _ = std::io::stdout().flush();

    while running.load(Ordering::SeqCst) && effect.is_allocated() {
        std::thread::sleep(Duration::from_millis(50));
        effect.stop(Some(destroy_after));
    }
    effect.destroy();
    println!(" done");
    Ok(())
}
