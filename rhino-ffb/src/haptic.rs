//! High-level effect façade used by telemetry code
//!
//! A `HapticEffect` holds at most one effect handle. Asking for the family it
//! already holds updates parameters in place (with write suppression), asking
//! for a different family destroys the old handle and allocates a new one.
//! When the device invalidated the handle (reset, reconnect), the next
//! parameter update allocates a fresh slot.

use std::time::{Duration, Instant};

use rhino_transport::{ConditionAxis, ConditionParams, EffectType};
use tracing::{debug, info, warn};

use crate::connection::DeviceConnection;
use crate::effect::{EffectHandle, EffectParams, PeriodicParams};
use crate::error::FfbError;
use crate::modulator::{DirectionModulator, RandomDirectionModulator};

/// Idle time after which a stopped effect is destroyed by default
pub const DEFAULT_DESTROY_AFTER: Duration = Duration::from_secs(10);

/// Periodic waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodicKind {
    Square,
    #[default]
    Sine,
    Triangle,
    SawtoothUp,
    SawtoothDown,
}

impl PeriodicKind {
    pub fn effect_type(self) -> EffectType {
        match self {
            Self::Square => EffectType::Square,
            Self::Sine => EffectType::Sine,
            Self::Triangle => EffectType::Triangle,
            Self::SawtoothUp => EffectType::SawtoothUp,
            Self::SawtoothDown => EffectType::SawtoothDown,
        }
    }
}

/// Condition effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Spring,
    Damper,
    Inertia,
    Friction,
}

impl ConditionKind {
    pub fn effect_type(self) -> EffectType {
        match self {
            Self::Spring => EffectType::Spring,
            Self::Damper => EffectType::Damper,
            Self::Inertia => EffectType::Inertia,
            Self::Friction => EffectType::Friction,
        }
    }
}

/// Where an effect points
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    /// Fixed angle in degrees
    Angle(f32),
    /// New random angle every `period`
    Random { period: Duration },
}

impl Direction {
    pub fn random() -> Self {
        Self::Random {
            period: crate::modulator::DEFAULT_RANDOM_PERIOD,
        }
    }
}

impl From<f32> for Direction {
    fn from(degrees: f32) -> Self {
        Self::Angle(degrees)
    }
}

/// Periodic effect request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodic {
    pub kind: PeriodicKind,
    pub frequency_hz: f32,
    /// Unipolar [0.0, 1.0]
    pub magnitude: f32,
    pub direction: Direction,
    /// Duration in milliseconds, 0 = until stopped
    pub duration_ms: u16,
    pub phase_deg: f32,
    /// Bipolar [-1.0, 1.0]
    pub offset: f32,
}

impl Default for Periodic {
    fn default() -> Self {
        Self {
            kind: PeriodicKind::Sine,
            frequency_hz: 0.0,
            magnitude: 0.0,
            direction: Direction::Angle(0.0),
            duration_ms: 0,
            phase_deg: 0.0,
            offset: 0.0,
        }
    }
}

/// A fully resolved effect request (direction already evaluated)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectFamily {
    Constant {
        magnitude: f32,
        direction: f32,
    },
    Periodic {
        kind: PeriodicKind,
        waveform: PeriodicParams,
        direction: f32,
        duration_ms: u16,
    },
    Condition {
        kind: ConditionKind,
        x: Option<ConditionParams>,
        y: Option<ConditionParams>,
    },
}

impl EffectFamily {
    pub fn effect_type(&self) -> EffectType {
        match self {
            Self::Constant { .. } => EffectType::Constant,
            Self::Periodic { kind, .. } => kind.effect_type(),
            Self::Condition { kind, .. } => kind.effect_type(),
        }
    }
}

/// Named, reusable effect slot-of-slots
pub struct HapticEffect {
    name: Option<String>,
    connection: DeviceConnection,
    handle: Option<EffectHandle>,
    modulator: Option<Box<dyn DirectionModulator>>,
    stopped_at: Option<Instant>,
}

impl std::fmt::Debug for HapticEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HapticEffect({:?})", self.handle)
    }
}

impl HapticEffect {
    pub fn new(connection: DeviceConnection) -> Self {
        Self {
            name: None,
            connection,
            handle: None,
            modulator: None,
            stopped_at: None,
        }
    }

    pub fn named(connection: DeviceConnection, name: impl Into<String>) -> Self {
        let mut effect = Self::new(connection);
        effect.name = Some(name.into());
        effect
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Install a custom direction modulator, replacing any existing one
    pub fn set_modulator(&mut self, modulator: Box<dyn DirectionModulator>) {
        self.modulator = Some(modulator);
    }

    /// Type of the currently held handle
    pub fn effect_type(&self) -> Option<EffectType> {
        self.handle.as_ref().map(EffectHandle::effect_type)
    }

    /// Slot of the held handle, 0 when none or invalidated
    pub fn slot(&self) -> u8 {
        self.handle.as_ref().map_or(0, EffectHandle::slot)
    }

    pub fn is_allocated(&self) -> bool {
        self.slot() != 0
    }

    pub fn started(&self) -> bool {
        self.handle.as_ref().is_some_and(EffectHandle::started)
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!(" (\"{name}\")"),
            None => String::new(),
        }
    }

    fn resolve_direction(&mut self, direction: Direction) -> f32 {
        match direction {
            Direction::Angle(degrees) => degrees,
            Direction::Random { period } => self
                .modulator
                .get_or_insert_with(|| Box::new(RandomDirectionModulator::new(period)))
                .update(Instant::now()),
        }
    }

    /// Make sure a valid handle of `effect_type` is held
    fn ensure_handle(&mut self, effect_type: EffectType) -> Option<&mut EffectHandle> {
        if let Some(handle) = &self.handle {
            if handle.effect_type() != effect_type {
                debug!(
                    "Effect family change {} -> {}{}",
                    handle.effect_type(),
                    effect_type,
                    self.label()
                );
                self.destroy();
            } else if !handle.is_valid() {
                debug!("Re-creating invalidated {} effect{}", effect_type, self.label());
                self.handle = None;
            }
        }

        if self.handle.is_none() {
            match self.connection.create_effect(effect_type) {
                Ok(mut handle) => {
                    if effect_type.is_condition() {
                        handle.set_effect(EffectParams::default());
                    }
                    self.handle = Some(handle);
                }
                Err(FfbError::PoolExhausted { .. }) => {
                    warn!("No free effect slot for {}{}", effect_type, self.label());
                    return None;
                }
                Err(e) => {
                    debug!("Cannot create {} effect{}: {}", effect_type, self.label(), e);
                    return None;
                }
            }
        }
        self.handle.as_mut()
    }

    /// Apply a resolved request, allocating or switching handles as needed
    pub fn apply(&mut self, family: EffectFamily) -> &mut Self {
        let Some(handle) = self.ensure_handle(family.effect_type()) else {
            return self;
        };

        match family {
            EffectFamily::Constant {
                magnitude,
                direction,
            } => {
                handle
                    .set_effect(EffectParams::directional(direction))
                    .set_constant_force(magnitude);
            }
            EffectFamily::Periodic {
                waveform,
                direction,
                duration_ms,
                ..
            } => {
                handle
                    .set_effect(EffectParams::directional(direction).with_duration(duration_ms))
                    .set_periodic(&waveform);
            }
            EffectFamily::Condition { x, y, .. } => {
                if let Some(x) = x {
                    handle.set_condition(ConditionAxis::X, &x);
                }
                if let Some(y) = y {
                    handle.set_condition(ConditionAxis::Y, &y);
                }
            }
        }
        self
    }

    /// Constant force
    ///
    /// # Arguments
    /// * `magnitude` - Bipolar [-1.0, 1.0], clamped
    /// * `direction` - Angle in degrees or a modulator
    pub fn constant(&mut self, magnitude: f32, direction: impl Into<Direction>) -> &mut Self {
        let direction = self.resolve_direction(direction.into());
        self.apply(EffectFamily::Constant {
            magnitude,
            direction,
        })
    }

    /// Periodic waveform
    pub fn periodic(&mut self, periodic: Periodic) -> &mut Self {
        let direction = self.resolve_direction(periodic.direction);
        self.apply(EffectFamily::Periodic {
            kind: periodic.kind,
            waveform: PeriodicParams {
                frequency_hz: periodic.frequency_hz,
                magnitude: periodic.magnitude,
                offset: periodic.offset,
                phase_deg: periodic.phase_deg,
            },
            direction,
            duration_ms: periodic.duration_ms,
        })
    }

    /// Condition effect with full per-axis parameter blocks
    pub fn condition(
        &mut self,
        kind: ConditionKind,
        x: Option<ConditionParams>,
        y: Option<ConditionParams>,
    ) -> &mut Self {
        self.apply(EffectFamily::Condition { kind, x, y })
    }

    fn coefficients(&mut self, kind: ConditionKind, x: Option<i32>, y: Option<i32>) -> &mut Self {
        self.condition(
            kind,
            x.map(ConditionParams::coefficient),
            y.map(ConditionParams::coefficient),
        )
    }

    /// Spring with symmetric per-axis coefficients in device units (±4096)
    pub fn spring(&mut self, x: Option<i32>, y: Option<i32>) -> &mut Self {
        self.coefficients(ConditionKind::Spring, x, y)
    }

    pub fn damper(&mut self, x: Option<i32>, y: Option<i32>) -> &mut Self {
        self.coefficients(ConditionKind::Damper, x, y)
    }

    pub fn inertia(&mut self, x: Option<i32>, y: Option<i32>) -> &mut Self {
        self.coefficients(ConditionKind::Inertia, x, y)
    }

    pub fn friction(&mut self, x: Option<i32>, y: Option<i32>) -> &mut Self {
        self.coefficients(ConditionKind::Friction, x, y)
    }

    /// Start the held effect unless it is already playing (or `force`)
    pub fn start(&mut self, force: bool) -> &mut Self {
        self.start_with(force, 1, false)
    }

    /// Start with an explicit loop count and override flag
    pub fn start_with(&mut self, force: bool, loop_count: u8, override_others: bool) -> &mut Self {
        let label = self.label();
        if let Some(handle) = self.handle.as_mut() {
            if !handle.started() || force {
                info!("Start effect {} ({}){}", handle.slot(), handle.name(), label);
                handle.start(loop_count, override_others);
                self.stopped_at = None;
            }
        }
        self
    }

    /// Stop the held effect
    ///
    /// With `destroy_after` set, the effect is destroyed on a later `stop`
    /// call once it has been idle that long.
    pub fn stop(&mut self, destroy_after: Option<Duration>) -> &mut Self {
        self.stop_at(Instant::now(), destroy_after)
    }

    /// [`HapticEffect::stop`] with an explicit clock
    pub fn stop_at(&mut self, now: Instant, destroy_after: Option<Duration>) -> &mut Self {
        let label = self.label();
        if let Some(handle) = self.handle.as_mut() {
            if handle.started() {
                info!("Stop effect {} ({}){}", handle.slot(), handle.name(), label);
                handle.stop();
            }
            // also covers effects the device stopped on its own
            if destroy_after.is_some() && self.stopped_at.is_none() {
                self.stopped_at = Some(now);
            }
        }

        if let (Some(stopped), Some(after)) = (self.stopped_at, destroy_after) {
            if now.saturating_duration_since(stopped) >= after {
                self.stopped_at = None;
                self.destroy();
            }
        }
        self
    }

    /// Free the held handle, if any
    pub fn destroy(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            info!(
                "Destroying effect {} ({}){}",
                handle.slot(),
                handle.name(),
                self.label()
            );
            handle.destroy();
        }
        self.stopped_at = None;
    }
}
