//! Command handlers for the CLI application.
//!
//! - `query`: Read-only commands (list, info, gains)
//! - `set`: Device writes (set-gain, reset, stop-all)
//! - `effect`: Test effect playback
//! - `monitor`: Poll loop with input and event logging

pub mod effect;
pub mod monitor;
pub mod query;
pub mod set;

use anyhow::Context;
use rhino_driver::DriverConfig;
use rhino_ffb::DeviceConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Open the configured device
pub fn open_connection(config: &DriverConfig) -> anyhow::Result<DeviceConnection> {
    let selector = config.selector();
    DeviceConnection::open(selector.clone(), config.connection())
        .with_context(|| format!("No Rhino found for {selector}"))
}

/// Set up a Ctrl-C handler that sets the given flag to false when triggered.
/// Returns the Arc<AtomicBool> for use in the main loop.
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    if let Err(e) = ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }

    running
}
