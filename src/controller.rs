//! Burner and fan decision logic.
//!
//! The controller is a pure function of the latest [`SensorSnapshot`] and the
//! fixed [`Thresholds`]. It keeps no state between cycles: no hysteresis, no
//! debouncing, no history.

use crate::{FAN_SPEED, HUMIDITY_THRESHOLD, TEMPERATURE_THRESHOLD};

/// Turns a raw sensor value into a reading, or `None` if the sensor failed.
///
/// This is the one "is invalid" test in the firmware. The controller and the
/// status display both work from snapshots built with it.
pub fn reading(raw: f32) -> Option<f32> {
    if raw.is_nan() {
        None
    } else {
        Some(raw)
    }
}

/// Sensor values taken at the start of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
}

impl SensorSnapshot {
    pub fn new(temperature_c: Option<f32>, humidity_pct: Option<f32>) -> Self {
        Self {
            temperature_c,
            humidity_pct,
        }
    }

    /// Build a snapshot from raw values where NaN marks a failed read.
    pub fn from_raw(temperature_c: f32, humidity_pct: f32) -> Self {
        Self::new(reading(temperature_c), reading(humidity_pct))
    }

    /// `(temperature_c, humidity_pct)` when both sensors produced a value.
    pub fn readings(&self) -> Option<(f32, f32)> {
        Some((self.temperature_c?, self.humidity_pct?))
    }

    pub fn is_valid(&self) -> bool {
        self.readings().is_some()
    }
}

/// What to do with the burner dial and the fan for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorCommand {
    pub burner_high: bool,
    pub fan_speed: u8,
}

/// The three situations the pot can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoilPhase {
    /// Still heating up (or the water probe failed): full heat, fan off.
    BelowBoiling,
    /// Boiling with too much steam: turn the heat down and vent.
    Overboiling,
    /// Boiling with steam under control: full heat and vent.
    Boiling,
}

impl BoilPhase {
    pub fn command(self, thresholds: &Thresholds) -> ActuatorCommand {
        match self {
            BoilPhase::BelowBoiling => ActuatorCommand {
                burner_high: true,
                fan_speed: 0,
            },
            BoilPhase::Overboiling => ActuatorCommand {
                burner_high: false,
                fan_speed: thresholds.fan_speed,
            },
            BoilPhase::Boiling => ActuatorCommand {
                burner_high: true,
                fan_speed: thresholds.fan_speed,
            },
        }
    }
}

/// Fixed control limits, built once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    /// Boiling point; at or below this the pot is still heating.
    pub temperature_c: f32,
    /// Humidity above this while boiling means the pot is about to overflow.
    pub humidity_pct: f32,
    /// Fan duty used whenever the fan runs.
    pub fan_speed: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_c: TEMPERATURE_THRESHOLD,
            humidity_pct: HUMIDITY_THRESHOLD,
            fan_speed: FAN_SPEED,
        }
    }
}

impl Thresholds {
    /// Classify a snapshot. The checks run in priority order and the first
    /// match wins.
    pub fn classify(&self, snapshot: &SensorSnapshot) -> BoilPhase {
        let boiling = match snapshot.temperature_c {
            Some(t) => t > self.temperature_c,
            // A failed water probe counts as cold: full heat, never vent.
            None => false,
        };
        if !boiling {
            return BoilPhase::BelowBoiling;
        }

        let steaming = match snapshot.humidity_pct {
            Some(h) => h > self.humidity_pct,
            // Inherited, not redesigned: a failed humidity read while boiling
            // counts as "steam under control", the same result as a NaN
            // comparing false. Intent unconfirmed.
            None => false,
        };
        if steaming {
            BoilPhase::Overboiling
        } else {
            BoilPhase::Boiling
        }
    }

    pub fn decide(&self, snapshot: &SensorSnapshot) -> ActuatorCommand {
        self.classify(snapshot).command(self)
    }
}
