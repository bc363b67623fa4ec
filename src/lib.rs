#![cfg_attr(not(test), no_std)]

pub mod actuator;
pub mod controller;
pub mod cycle;
pub mod dht11;
pub mod presentation;
pub mod sensor;
pub mod sh1107;

pub const TEMPERATURE_THRESHOLD: f32 = 90.0; // Boiling point of the pot water (deg C)
pub const HUMIDITY_THRESHOLD: f32 = 40.0; // Steam above the pot that means it is about to boil over (%)
pub const FAN_SPEED: u8 = 255; // Fan duty whenever the fan is on

pub const SERVO_HIGH_ANGLE: u8 = 0; // Dial angle for burner on high (found while testing)
pub const SERVO_LOW_ANGLE: u8 = 135; // Dial angle for burner on low (found while testing)
pub const DIAL_SETTLE_MS: u32 = 20; // Time given to the servo after each write

pub const DHT11_MIN_INTERVAL_MS: u64 = 2000; // The DHT11 cannot be sampled faster than this
