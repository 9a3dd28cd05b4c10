//! Protocol constants for the VPforce Rhino USB HID PID interface

use std::fmt;
use std::str::FromStr;

/// HID report IDs
pub mod report_id {
    // Device to host (input reports)
    pub const INPUT: u8 = 1;
    pub const PID_STATE: u8 = 2;

    // Vendor
    pub const BUTTON_LOOPBACK: u8 = 0x40;
    pub const VENDOR_CMD: u8 = 0x55;

    // Host to device (output reports)
    pub const SET_EFFECT: u8 = 101;
    pub const SET_ENVELOPE: u8 = 102;
    pub const SET_CONDITION: u8 = 103;
    pub const SET_PERIODIC: u8 = 104;
    pub const SET_CONSTANT_FORCE: u8 = 105;
    pub const SET_RAMP_FORCE: u8 = 106;
    pub const SET_CUSTOM_FORCE: u8 = 107;
    pub const SET_DOWNLOAD_SAMPLE: u8 = 108;
    pub const EFFECT_OPERATION: u8 = 110;
    pub const BLOCK_FREE: u8 = 111;
    pub const DEVICE_CONTROL: u8 = 112;
    pub const DEVICE_GAIN: u8 = 113;
    pub const SET_CUSTOM_FORCE_OUTPUT: u8 = 114;

    // Feature reports
    pub const CREATE_EFFECT: u8 = 5;
    pub const PID_BLOCK_LOAD: u8 = 6;
    pub const PID_POOL: u8 = 7;
    pub const GET_GAINS: u8 = 0x56;
    pub const SET_GAIN: u8 = 0x57;

    /// Get human-readable name for a report ID
    pub fn name(id: u8) -> &'static str {
        match id {
            INPUT => "INPUT",
            PID_STATE => "PID_STATE",
            BUTTON_LOOPBACK => "BUTTON_LOOPBACK",
            VENDOR_CMD => "VENDOR_CMD",
            SET_EFFECT => "SET_EFFECT",
            SET_ENVELOPE => "SET_ENVELOPE",
            SET_CONDITION => "SET_CONDITION",
            SET_PERIODIC => "SET_PERIODIC",
            SET_CONSTANT_FORCE => "SET_CONSTANT_FORCE",
            SET_RAMP_FORCE => "SET_RAMP_FORCE",
            SET_CUSTOM_FORCE => "SET_CUSTOM_FORCE",
            SET_DOWNLOAD_SAMPLE => "SET_DOWNLOAD_SAMPLE",
            EFFECT_OPERATION => "EFFECT_OPERATION",
            BLOCK_FREE => "BLOCK_FREE",
            DEVICE_CONTROL => "DEVICE_CONTROL",
            DEVICE_GAIN => "DEVICE_GAIN",
            SET_CUSTOM_FORCE_OUTPUT => "SET_CUSTOM_FORCE_OUTPUT",
            CREATE_EFFECT => "CREATE_EFFECT",
            PID_BLOCK_LOAD => "PID_BLOCK_LOAD",
            PID_POOL => "PID_POOL",
            GET_GAINS => "GET_GAINS",
            SET_GAIN => "SET_GAIN",
            _ => "UNKNOWN",
        }
    }
}

/// Fixed-point full scale used by magnitude, coefficient and gain fields
pub const FULL_SCALE: i16 = 4096;

/// Maximum size of any input report read from the device
pub const INPUT_BUFFER_SIZE: usize = 64;

/// Hardware effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EffectType {
    Constant = 1,
    Ramp = 2,
    Square = 3,
    Sine = 4,
    Triangle = 5,
    SawtoothUp = 6,
    SawtoothDown = 7,
    Spring = 8,
    Damper = 9,
    Inertia = 10,
    Friction = 11,
    Custom = 12,
}

impl EffectType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Constant),
            2 => Some(Self::Ramp),
            3 => Some(Self::Square),
            4 => Some(Self::Sine),
            5 => Some(Self::Triangle),
            6 => Some(Self::SawtoothUp),
            7 => Some(Self::SawtoothDown),
            8 => Some(Self::Spring),
            9 => Some(Self::Damper),
            10 => Some(Self::Inertia),
            11 => Some(Self::Friction),
            12 => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "Constant",
            Self::Ramp => "Ramp",
            Self::Square => "Square",
            Self::Sine => "Sine",
            Self::Triangle => "Triangle",
            Self::SawtoothUp => "Sawtooth Up",
            Self::SawtoothDown => "Sawtooth Down",
            Self::Spring => "Spring",
            Self::Damper => "Damper",
            Self::Inertia => "Inertia",
            Self::Friction => "Friction",
            Self::Custom => "Custom",
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(
            self,
            Self::Square | Self::Sine | Self::Triangle | Self::SawtoothUp | Self::SawtoothDown
        )
    }

    pub fn is_condition(&self) -> bool {
        matches!(
            self,
            Self::Spring | Self::Damper | Self::Inertia | Self::Friction
        )
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device control commands (report 112)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceControl {
    DisableActuators = 1,
    EnableActuators = 2,
    StopAllEffects = 3,
    Reset = 4,
    Pause = 5,
    Continue = 6,
}

/// Effect operation codes (report 110)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EffectOp {
    Start = 1,
    StartSolo = 2,
    Stop = 3,
    StartOverride = 4,
}

impl EffectOp {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Start),
            2 => Some(Self::StartSolo),
            3 => Some(Self::Stop),
            4 => Some(Self::StartOverride),
            _ => None,
        }
    }
}

/// Status returned in the PID block load feature report
pub mod load_status {
    pub const SUCCESS: u8 = 1;
    pub const FULL: u8 = 2;
    pub const ERROR: u8 = 3;
}

/// `axes_enable` bits of the set-effect report
pub mod axis_enable {
    pub const X: u8 = 1;
    pub const Y: u8 = 2;
    pub const DIRECTION: u8 = 4;
}

/// USB vendor control requests
pub mod usb {
    pub const REQ_GET_VERSION: u8 = 16;
    pub const VERSION_LENGTH: usize = 64;
    pub const TIMEOUT_MS: u64 = 500;
}

/// Global gain sliders (as shown in VPforce Configurator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GainSlider {
    Master = 1,
    Periodic = 2,
    Spring = 3,
    Damper = 4,
    Inertia = 5,
    Friction = 6,
    Constant = 7,
}

impl GainSlider {
    pub const ALL: [GainSlider; 7] = [
        Self::Master,
        Self::Periodic,
        Self::Spring,
        Self::Damper,
        Self::Inertia,
        Self::Friction,
        Self::Constant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Periodic => "periodic",
            Self::Spring => "spring",
            Self::Damper => "damper",
            Self::Inertia => "inertia",
            Self::Friction => "friction",
            Self::Constant => "constant",
        }
    }
}

impl fmt::Display for GainSlider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GainSlider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.name() == lower)
            .ok_or_else(|| format!("unknown gain slider: {s}"))
    }
}
