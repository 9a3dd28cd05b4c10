//! Force-feedback effect engine for VPforce Rhino joysticks
//!
//! This crate sits on top of `rhino-transport` and manages the lifecycle of
//! hardware effect slots: allocation, parameter updates with write
//! suppression, start/stop, and invalidation on device reset or disconnect.
//!
//! ```no_run
//! use rhino_ffb::{ConnectionConfig, DeviceConnection, EffectRegistry, PollLoop};
//! use rhino_transport::DeviceSelector;
//!
//! let conn = DeviceConnection::open(DeviceSelector::default(), ConnectionConfig::default())?;
//! let _poll = PollLoop::spawn(conn.clone())?;
//!
//! let mut effects = EffectRegistry::new(conn);
//! effects.get("spring").spring(Some(2048), Some(2048)).start(false);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod connection;
pub mod effect;
pub mod error;
pub mod haptic;
pub mod modulator;
pub mod poll;
pub mod registry;

pub use connection::{ConnectionConfig, DeviceConnection, DeviceEvent, LinkState};
pub use effect::{EffectHandle, EffectParams, PeriodicParams};
pub use error::{FfbError, Result};
pub use haptic::{
    ConditionKind, Direction, EffectFamily, HapticEffect, Periodic, PeriodicKind,
    DEFAULT_DESTROY_AFTER,
};
pub use modulator::{DirectionModulator, RandomDirectionModulator};
pub use poll::PollLoop;
pub use registry::EffectRegistry;

// Types callers need alongside the engine API
pub use rhino_transport::{
    ConditionAxis, ConditionParams, DeviceInfo, DeviceSelector, EffectType, GainSlider,
    GainsReport, InputReport, PidStateReport,
};
