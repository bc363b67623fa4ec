//! Host-side properties of the control decision and the full cycle.

use embassy_futures::block_on;
use proptest::prelude::*;

use pasta_boil_rs::actuator::ActuatorSink;
use pasta_boil_rs::controller::{ActuatorCommand, SensorSnapshot, Thresholds};
use pasta_boil_rs::cycle::Boiler;
use pasta_boil_rs::presentation::{StatusDisplay, StatusLines};
use pasta_boil_rs::sensor::SensorSource;

const HEAT: ActuatorCommand = ActuatorCommand {
    burner_high: true,
    fan_speed: 0,
};

fn humidity() -> impl Strategy<Value = f32> {
    prop_oneof![4 => 0.0f32..=100.0, 1 => Just(f32::NAN)]
}

fn decide(t: f32, h: f32) -> ActuatorCommand {
    Thresholds::default().decide(&SensorSnapshot::from_raw(t, h))
}

proptest! {
    #[test]
    fn at_or_below_boiling_always_heats_with_fan_off(
        t in prop_oneof![4 => -40.0f32..=90.0, 1 => Just(f32::NAN)],
        h in humidity(),
    ) {
        prop_assert_eq!(decide(t, h), HEAT);
    }

    #[test]
    fn boiling_with_steam_turns_burner_low(t in 90.001f32..=150.0, h in 40.001f32..=100.0) {
        prop_assert_eq!(decide(t, h), ActuatorCommand { burner_high: false, fan_speed: 255 });
    }

    #[test]
    fn boiling_without_steam_keeps_burner_high(
        t in 90.001f32..=150.0,
        h in prop_oneof![4 => 0.0f32..=40.0, 1 => Just(f32::NAN)],
    ) {
        prop_assert_eq!(decide(t, h), ActuatorCommand { burner_high: true, fan_speed: 255 });
    }

    #[test]
    fn same_snapshot_same_command(t in prop_oneof![-40.0f32..=150.0, Just(f32::NAN)], h in humidity()) {
        let thresholds = Thresholds::default();
        let snapshot = SensorSnapshot::from_raw(t, h);
        prop_assert_eq!(thresholds.decide(&snapshot), thresholds.decide(&snapshot));
    }

    #[test]
    fn display_failure_tracks_invalid_input(t in prop_oneof![-40.0f32..=150.0, Just(f32::NAN)], h in humidity()) {
        let snapshot = SensorSnapshot::from_raw(t, h);
        let failed = StatusLines::for_snapshot(&snapshot) == StatusLines::failure();
        prop_assert_eq!(failed, t.is_nan() || h.is_nan());
    }
}

/// Sensor stub that plays back one pair of raw values, NaN meaning a failed read.
struct Bench {
    temperature_c: f32,
    humidity_pct: f32,
}

impl SensorSource for Bench {
    async fn read_temperature_c(&mut self) -> Option<f32> {
        pasta_boil_rs::controller::reading(self.temperature_c)
    }

    async fn read_humidity_pct(&mut self) -> Option<f32> {
        pasta_boil_rs::controller::reading(self.humidity_pct)
    }
}

#[derive(Default)]
struct Rig {
    burner_high: Option<bool>,
    fan: Option<u8>,
}

impl ActuatorSink for Rig {
    type Error = ();

    async fn set_burner_position(&mut self, high: bool) -> Result<(), ()> {
        self.burner_high = Some(high);
        Ok(())
    }

    async fn set_fan_duty(&mut self, duty: u8) -> Result<(), ()> {
        self.fan = Some(duty);
        Ok(())
    }
}

#[derive(Default)]
struct Panel {
    lines: Option<StatusLines>,
}

impl StatusDisplay for Panel {
    type Error = ();

    async fn show_failure(&mut self) -> Result<(), ()> {
        self.lines = Some(StatusLines::failure());
        Ok(())
    }

    async fn show_readings(&mut self, humidity_pct: f32, temperature_c: f32) -> Result<(), ()> {
        self.lines = Some(StatusLines::readings(humidity_pct, temperature_c));
        Ok(())
    }
}

fn run(temperature_c: f32, humidity_pct: f32) -> (Rig, StatusLines) {
    let sensors = Bench {
        temperature_c,
        humidity_pct,
    };
    let mut boiler = Boiler::new(sensors, Rig::default(), Panel::default(), Thresholds::default());
    block_on(boiler.cycle(0));
    let (_, rig, panel) = boiler.release();
    (rig, panel.lines.expect("display was not updated"))
}

fn shown(lines: &StatusLines) -> (&str, &str) {
    (lines.top.as_str(), lines.bottom.as_str())
}

#[test]
fn heating_up() {
    let (rig, lines) = run(25.0, 30.0);
    assert_eq!((rig.burner_high, rig.fan), (Some(true), Some(0)));
    assert_eq!(shown(&lines), ("Humidity: 30.00%", "Temp: 25.00 C"));
}

#[test]
fn about_to_boil_over() {
    let (rig, lines) = run(95.0, 50.0);
    assert_eq!((rig.burner_high, rig.fan), (Some(false), Some(255)));
    assert_eq!(shown(&lines), ("Humidity: 50.00%", "Temp: 95.00 C"));
}

#[test]
fn rolling_boil() {
    let (rig, _) = run(95.0, 20.0);
    assert_eq!((rig.burner_high, rig.fan), (Some(true), Some(255)));
}

#[test]
fn water_probe_failure() {
    let (rig, lines) = run(f32::NAN, 20.0);
    assert_eq!((rig.burner_high, rig.fan), (Some(true), Some(0)));
    assert_eq!(shown(&lines), ("Failed", "Read"));
}

#[test]
fn humidity_failure_while_boiling() {
    let (rig, lines) = run(95.0, f32::NAN);
    assert_eq!((rig.burner_high, rig.fan), (Some(true), Some(255)));
    assert_eq!(shown(&lines), ("Failed", "Read"));
}

#[test]
fn boiling_point_itself_is_still_heating() {
    let (rig, _) = run(90.0, 99.0);
    assert_eq!((rig.burner_high, rig.fan), (Some(true), Some(0)));
}
