//! Query (read-only) command handlers.

use super::{open_connection, CommandResult};
use rhino_driver::DriverConfig;
use rhino_transport::{GainSlider, HidDiscovery};

/// List matching force-feedback interfaces
pub fn list(config: &DriverConfig, json: bool) -> CommandResult {
    let devices = HidDiscovery::enumerate(&config.selector())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices found for {}", config.selector());
        return Ok(());
    }
    println!("Force-feedback devices:");
    for d in &devices {
        println!(
            "  VID={:04X} PID={:04X} rel={:04x} serial={} path={}",
            d.vendor_id,
            d.product_id,
            d.release_number,
            d.serial.as_deref().unwrap_or("-"),
            d.path,
        );
        println!("    {}", d.label());
    }
    Ok(())
}

/// Show device identity and firmware version
pub fn info(config: &DriverConfig) -> CommandResult {
    let conn = open_connection(config)?;
    if let Some(info) = conn.device_info() {
        println!("Device:       {}", info.label());
        println!("VID/PID:      {:04X}:{:04X}", info.vendor_id, info.product_id);
        println!("Serial:       {}", info.serial.as_deref().unwrap_or("-"));
        println!("Path:         {}", info.path);
        println!("Release:      {:04x}", info.release_number);
    }
    match conn.firmware_version(true) {
        Some(version) => println!("Firmware:     {version}"),
        None => println!("Firmware:     unknown"),
    }

    // PID state arrives with the regular input stream
    conn.read_reports();
    if let Some(status) = conn.pid_status() {
        println!(
            "Actuators:    {} (power {}, safety switch {})",
            if status.actuators_enabled() { "enabled" } else { "disabled" },
            if status.actuator_power() { "on" } else { "off" },
            if status.safety_switch() { "on" } else { "off" },
        );
    }
    Ok(())
}

/// Show the global gain sliders
pub fn gains(config: &DriverConfig) -> CommandResult {
    let conn = open_connection(config)?;
    let gains = conn.get_gains()?;
    println!("Gains:");
    for slider in GainSlider::ALL {
        println!("  {:<9} {:>3}%", slider.name(), gains.get(slider));
    }
    Ok(())
}
