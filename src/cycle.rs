//! One pass of the control loop: read, decide, actuate, display.
//!
//! Every cycle starts from fresh sensor reads. Nothing but the thresholds
//! survives from one cycle to the next, and a cycle never fails: bad sensor
//! data picks a safe command, and actuator or display faults are logged and
//! skipped.

#[cfg(feature = "defmt")]
use defmt::{debug, warn};

use crate::actuator::ActuatorSink;
use crate::controller::{ActuatorCommand, BoilPhase, SensorSnapshot, Thresholds};
use crate::presentation::{present, StatusDisplay};
use crate::sensor::SensorSource;

/// What a cycle saw and did.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    pub uptime_ms: u64,
    pub snapshot: SensorSnapshot,
    pub phase: BoilPhase,
    pub command: ActuatorCommand,
}

/// The pot: its sensors, the burner rig and the status display.
pub struct Boiler<S, A, P> {
    sensors: S,
    actuators: A,
    display: P,
    thresholds: Thresholds,
}

impl<S, A, P> Boiler<S, A, P>
where
    S: SensorSource,
    A: ActuatorSink,
    P: StatusDisplay,
{
    pub fn new(sensors: S, actuators: A, display: P, thresholds: Thresholds) -> Self {
        Self {
            sensors,
            actuators,
            display,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Park the burner low with the fan off before the first cycle.
    pub async fn start(&mut self) {
        if self.actuators.park().await.is_err() {
            #[cfg(feature = "defmt")]
            warn!("could not park the burner");
        }
    }

    pub async fn cycle(&mut self, uptime_ms: u64) -> CycleReport {
        #[cfg(feature = "defmt")]
        debug!("System Time: {=u64} ms", uptime_ms);

        let temperature_c = self.sensors.read_temperature_c().await;
        let humidity_pct = self.sensors.read_humidity_pct().await;
        let snapshot = SensorSnapshot::new(temperature_c, humidity_pct);

        let phase = self.thresholds.classify(&snapshot);
        let command = phase.command(&self.thresholds);

        if self.actuators.apply(&command).await.is_err() {
            #[cfg(feature = "defmt")]
            warn!("actuator write failed for {}", command);
        }

        if present(&snapshot, &mut self.display).await.is_err() {
            #[cfg(feature = "defmt")]
            warn!("status display update failed");
        }

        #[cfg(feature = "defmt")]
        debug!("{} {} -> {}", snapshot, phase, command);

        CycleReport {
            uptime_ms,
            snapshot,
            phase,
            command,
        }
    }

    pub fn release(self) -> (S, A, P) {
        (self.sensors, self.actuators, self.display)
    }
}
