// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use rhino_transport::GainSlider;
use std::path::PathBuf;

use rhino_driver::DriverConfig;

#[derive(Parser)]
#[command(name = "rhino-driver")]
#[command(author, version, about = "VPforce Rhino force-feedback driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/rhino-ffb/driver.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// USB vendor ID (hex)
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pub vid: Option<u16>,

    /// USB product ID (hex, 0 = any)
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pub pid: Option<u16>,

    /// Device serial number
    #[arg(long, global = true)]
    pub serial: Option<String>,

    /// HID device path
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List matching HID devices
    #[command(visible_alias = "ls")]
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show device info and firmware version
    #[command(visible_aliases = ["version", "ver"])]
    Info,

    /// Show the global gain sliders
    #[command(visible_alias = "g")]
    Gains,

    /// Set a global gain slider (0-100%)
    SetGain {
        /// master, periodic, spring, damper, inertia, friction or constant
        slider: GainSlider,
        /// Percentage, clamped to 0-100
        #[arg(allow_negative_numbers = true)]
        percent: i32,
    },

    /// Reset the device's effect state
    Reset,

    /// Stop all playing effects
    StopAll,

    /// Run the poll loop and log input changes and device events
    #[command(visible_alias = "mon")]
    Monitor,

    /// Play a test effect
    TestEffect {
        #[arg(value_enum)]
        kind: TestEffectKind,
        /// Magnitude or coefficient (0.0-1.0)
        #[arg(long, default_value_t = 0.5)]
        strength: f32,
        /// Play time in seconds
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestEffectKind {
    Constant,
    Sine,
    Spring,
    Damper,
}

impl Cli {
    /// Apply command-line overrides on top of the file config
    pub fn apply(&self, config: &mut DriverConfig) {
        if let Some(vid) = self.vid {
            config.device.vendor_id = vid;
        }
        if let Some(pid) = self.pid {
            config.device.product_id = pid;
        }
        if let Some(serial) = &self.serial {
            config.device.serial = Some(serial.clone());
        }
        if let Some(path) = &self.path {
            config.device.path = Some(path.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex ID '{s}': {e}"))
}
