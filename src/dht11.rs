//! Bit-banged DHT11 humidity sensor driver.
//!
//! The data line is open drain with an external pull-up: `set_low` drives it,
//! `set_high` releases it so the sensor can talk. Pulse widths are measured by
//! polling the pin once per microsecond of delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::sensor::SensorError;

const START_LOW_MS: u32 = 18;
const RESPONSE_TIMEOUT_US: u32 = 100;
const BIT_TIMEOUT_US: u32 = 100;
const ONE_THRESHOLD_US: u32 = 40; // 26-28us high is a 0, 70us high is a 1

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dht11Reading {
    pub humidity_pct: f32,
    pub temperature_c: f32,
}

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Run one bus transaction. The sensor needs 2 s between reads.
    pub fn read(&mut self) -> Result<Dht11Reading, SensorError> {
        let frame = self.read_frame()?;
        decode(frame)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Pin)?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| SensorError::Pin)?;

        // Sensor answers with 80us low then 80us high
        match self.wait_while(true, RESPONSE_TIMEOUT_US) {
            Err(SensorError::Timeout) => return Err(SensorError::NoResponse),
            other => other?,
        };
        self.wait_while(false, RESPONSE_TIMEOUT_US)?;
        self.wait_while(true, RESPONSE_TIMEOUT_US)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_while(false, BIT_TIMEOUT_US)?;
            let high_us = self.wait_while(true, BIT_TIMEOUT_US)?;
            if high_us > ONE_THRESHOLD_US {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }

    /// Wait until the line leaves `high`, returning how long that took in us.
    fn wait_while(&mut self, high: bool, timeout_us: u32) -> Result<u32, SensorError> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(|_| SensorError::Pin)? == high {
            if elapsed >= timeout_us {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}

/// Check and convert a 40 bit DHT11 frame.
pub fn decode(frame: [u8; 5]) -> Result<Dht11Reading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity_pct = frame[0] as f32 + frame[1] as f32 / 10.0;
    let mut temperature_c = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
    if frame[3] & 0x80 != 0 {
        temperature_c = -temperature_c;
    }
    Ok(Dht11Reading {
        humidity_pct,
        temperature_c,
    })
}
