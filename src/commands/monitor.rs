//! Live monitor: poll loop plus input and event logging.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{open_connection, setup_interrupt_handler, CommandResult};
use rhino_driver::DriverConfig;
use rhino_ffb::{DeviceEvent, InputReport, PollLoop};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// How often the input snapshot is compared
const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(50);

fn print_input(input: &InputReport) {
    let (x, y) = input.axis_xy();
    println!(
        "X={:+.3} Y={:+.3} Z={:>6} slider={:>3} hats={:04x} buttons={:?}",
        x,
        y,
        input.z(),
        input.slider(),
        input.hats(),
        input.pressed_buttons()
    );
}

fn log_event(event: &DeviceEvent) {
    match event {
        DeviceEvent::Connected(info) => info!("Connected: {}", info.label()),
        DeviceEvent::Disconnected(reason) => warn!("Disconnected: {}", reason),
        DeviceEvent::DeviceReset => info!("Device reset, effects invalidated"),
        DeviceEvent::EffectStopped { slot } => info!("Effect {} finished", slot),
    }
}

/// Run until Ctrl-C
pub async fn monitor(config: &DriverConfig) -> CommandResult {
    let conn = open_connection(config)?;
    let mut events = conn.subscribe();
    let mut poll = PollLoop::spawn(conn.clone())?;
    let running = setup_interrupt_handler();

    if let Some(info) = conn.device_info() {
        println!("Monitoring {} (Ctrl+C to exit)", info.label());
    }

    let mut interval = tokio::time::interval(SNAPSHOT_INTERVAL);
    let mut last: Option<InputReport> = None;

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(n)) => warn!("Missed {} device events", n),
                Err(RecvError::Closed) => break,
            },
            _ = interval.tick() => {
                let input = conn.get_input();
                if input.is_some() && input != last {
                    if let Some(input) = &input {
                        print_input(input);
                    }
                    last = input;
                }
            }
        }
    }

    poll.shutdown();
    println!("Stopped after {} polls", poll.ticks());
    Ok(())
}
