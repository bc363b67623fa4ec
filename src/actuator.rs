//! Burner dial servo and steam fan.
//!
//! The dial has two positions only. Their servo angles are calibration values
//! found on the stove and live here, not in the controller.

use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;

use crate::controller::ActuatorCommand;
use crate::{DIAL_SETTLE_MS, SERVO_HIGH_ANGLE, SERVO_LOW_ANGLE};

pub const SERVO_FRAME_US: u16 = 20_000; // 50 Hz
pub const SERVO_MIN_PULSE_US: u16 = 544;
pub const SERVO_MAX_PULSE_US: u16 = 2400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    Dial,
    Fan,
}

/// Where actuation commands go.
#[allow(async_fn_in_trait)]
pub trait ActuatorSink {
    type Error;

    async fn set_burner_position(&mut self, high: bool) -> Result<(), Self::Error>;
    async fn set_fan_duty(&mut self, duty: u8) -> Result<(), Self::Error>;

    async fn apply(&mut self, command: &ActuatorCommand) -> Result<(), Self::Error> {
        self.set_burner_position(command.burner_high).await?;
        self.set_fan_duty(command.fan_speed).await
    }

    /// Burner low, fan off. Used once at power up.
    async fn park(&mut self) -> Result<(), Self::Error> {
        self.set_burner_position(false).await?;
        self.set_fan_duty(0).await
    }
}

/// Servo angles for the two dial positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DialCalibration {
    pub high_angle: u8,
    pub low_angle: u8,
    pub settle_ms: u32,
}

impl Default for DialCalibration {
    fn default() -> Self {
        Self {
            high_angle: SERVO_HIGH_ANGLE,
            low_angle: SERVO_LOW_ANGLE,
            settle_ms: DIAL_SETTLE_MS,
        }
    }
}

impl DialCalibration {
    pub fn angle(&self, high: bool) -> u8 {
        if high {
            self.high_angle
        } else {
            self.low_angle
        }
    }
}

/// Hobby servo pulse width for an angle in degrees (clamped to 0..=180).
pub fn servo_pulse_us(angle: u8) -> u16 {
    let angle = angle.min(180) as u32;
    let span = (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US) as u32;
    SERVO_MIN_PULSE_US + (angle * span / 180) as u16
}

/// The dial servo and fan on two PWM channels.
pub struct BurnerRig<DIAL, FAN, D> {
    dial: DIAL,
    fan: FAN,
    delay: D,
    calibration: DialCalibration,
}

impl<DIAL, FAN, D> BurnerRig<DIAL, FAN, D>
where
    DIAL: SetDutyCycle,
    FAN: SetDutyCycle,
    D: DelayNs,
{
    /// `dial` must already run at a 20 ms period.
    pub fn new(dial: DIAL, fan: FAN, delay: D, calibration: DialCalibration) -> Self {
        Self {
            dial,
            fan,
            delay,
            calibration,
        }
    }
}

impl<DIAL, FAN, D> ActuatorSink for BurnerRig<DIAL, FAN, D>
where
    DIAL: SetDutyCycle,
    FAN: SetDutyCycle,
    D: DelayNs,
{
    type Error = ActuatorError;

    async fn set_burner_position(&mut self, high: bool) -> Result<(), ActuatorError> {
        let pulse = servo_pulse_us(self.calibration.angle(high));
        self.dial
            .set_duty_cycle_fraction(pulse, SERVO_FRAME_US)
            .map_err(|_| ActuatorError::Dial)?;
        self.delay.delay_ms(self.calibration.settle_ms).await;
        Ok(())
    }

    async fn set_fan_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.fan
            .set_duty_cycle_fraction(duty as u16, u8::MAX as u16)
            .map_err(|_| ActuatorError::Fan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;

    struct MockPwm {
        max: u16,
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        waited_ms: u32,
    }

    impl DelayNs for MockDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ms += ns / 1_000_000;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.waited_ms += ms;
        }
    }

    fn rig() -> BurnerRig<MockPwm, MockPwm, MockDelay> {
        // 1 us per count on the dial, 8 bit fan
        let dial = MockPwm { max: 20_000, duty: 0 };
        let fan = MockPwm { max: 255, duty: 0 };
        BurnerRig::new(dial, fan, MockDelay::default(), DialCalibration::default())
    }

    #[test]
    fn pulse_width_spans_servo_range() {
        assert_eq!(servo_pulse_us(0), 544);
        assert_eq!(servo_pulse_us(90), 1472);
        assert_eq!(servo_pulse_us(180), 2400);
        assert_eq!(servo_pulse_us(255), 2400);
    }

    #[test]
    fn burner_positions_use_calibrated_angles() {
        let mut rig = rig();
        block_on(rig.set_burner_position(true)).unwrap();
        assert_eq!(rig.dial.duty, 544);
        block_on(rig.set_burner_position(false)).unwrap();
        assert_eq!(rig.dial.duty, servo_pulse_us(135));
        assert_eq!(rig.dial.duty, 1936);
        assert_eq!(rig.delay.waited_ms, 2 * DIAL_SETTLE_MS);
    }

    #[test]
    fn apply_drives_dial_and_fan() {
        let mut rig = rig();
        let command = ActuatorCommand {
            burner_high: false,
            fan_speed: 255,
        };
        block_on(rig.apply(&command)).unwrap();
        assert_eq!(rig.dial.duty, 1936);
        assert_eq!(rig.fan.duty, 255);

        block_on(rig.set_fan_duty(0)).unwrap();
        assert_eq!(rig.fan.duty, 0);
    }

    #[test]
    fn fan_duty_scales_to_channel_resolution() {
        let mut rig = BurnerRig::new(
            MockPwm { max: 20_000, duty: 0 },
            MockPwm { max: 1000, duty: 0 },
            MockDelay::default(),
            DialCalibration::default(),
        );
        block_on(rig.set_fan_duty(51)).unwrap();
        assert_eq!(rig.fan.duty, 200);
    }

    #[test]
    fn park_turns_burner_low_and_fan_off() {
        let mut rig = rig();
        rig.fan.duty = 255;
        block_on(rig.park()).unwrap();
        assert_eq!(rig.dial.duty, 1936);
        assert_eq!(rig.fan.duty, 0);
    }
}
