//! Set (write) command handlers.

use super::{open_connection, CommandResult};
use rhino_driver::DriverConfig;
use rhino_transport::{units, GainSlider};

/// Set one global gain slider
pub fn set_gain(config: &DriverConfig, slider: GainSlider, percent: i32) -> CommandResult {
    let conn = open_connection(config)?;
    conn.set_gain(slider, percent)?;

    let applied = units::clamp_percent(percent);
    if i32::from(applied) != percent {
        eprintln!("Gain {percent}% out of range, clamped to {applied}%");
    }
    let gains = conn.get_gains()?;
    println!("{} gain set to {}%", slider, gains.get(slider));
    Ok(())
}

/// Reset the device's effect state
pub fn reset(config: &DriverConfig) -> CommandResult {
    let conn = open_connection(config)?;
    conn.reset_effects()?;
    println!("Device effects reset");
    Ok(())
}

/// Stop every playing effect
pub fn stop_all(config: &DriverConfig) -> CommandResult {
    let conn = open_connection(config)?;
    conn.stop_all_effects()?;
    println!("All effects stopped");
    Ok(())
}
