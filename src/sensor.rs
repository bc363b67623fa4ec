//! Sensor side of the control loop: the [`SensorSource`] seam and the DS18B20
//! water probe driver.

/// Why a sensor read produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Scratchpad CRC did not match.
    Crc,
    /// DHT11 frame checksum did not match.
    Checksum,
    /// Nothing answered on the bus.
    NoResponse,
    /// The sensor stopped toggling the line mid-frame.
    Timeout,
    /// Pin access failed.
    Pin,
}

/// Where the controller gets its readings from. One call to each method per
/// cycle; `None` means the read failed this cycle.
#[allow(async_fn_in_trait)]
pub trait SensorSource {
    async fn read_temperature_c(&mut self) -> Option<f32>;
    async fn read_humidity_pct(&mut self) -> Option<f32>;
}

/// Byte level access to a 1-Wire bus. Every write starts with a bus reset.
#[allow(async_fn_in_trait)]
pub trait OneWire {
    async fn write_bytes(&mut self, bytes: &[u8]);
    async fn read_bytes(&mut self, bytes: &mut [u8]);
}

#[cfg(feature = "rp2040")]
impl<'d, PIO: embassy_rp::pio::Instance, const SM: usize> OneWire
    for embassy_rp::pio_programs::onewire::PioOneWire<'d, PIO, SM>
{
    async fn write_bytes(&mut self, bytes: &[u8]) {
        embassy_rp::pio_programs::onewire::PioOneWire::write_bytes(self, bytes).await
    }

    async fn read_bytes(&mut self, bytes: &mut [u8]) {
        embassy_rp::pio_programs::onewire::PioOneWire::read_bytes(self, bytes).await
    }
}

const SKIP_ROM: u8 = 0xCC;
const CONVERT_T: u8 = 0x44;
const WRITE_SCRATCHPAD: u8 = 0x4E;
const READ_SCRATCHPAD: u8 = 0xBE;

/// Resolution settings for temperature readings
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits9 = 0x1F,  // 0.5°C resolution, 93.75ms conversion time
    Bits10 = 0x3F, // 0.25°C resolution, 187.5ms conversion time
    Bits11 = 0x5F, // 0.125°C resolution, 375ms conversion time
    Bits12 = 0x7F, // 0.0625°C resolution, 750ms conversion time
}

impl Resolution {
    /// Worst case time between `start` and a valid `temperature`.
    pub fn conversion_ms(self) -> u64 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }
}

/// DS18B20 temperature sensor driver. Only supports a single probe on the bus.
pub struct Ds18b20<W> {
    wire: W,
}

impl<W: OneWire> Ds18b20<W> {
    pub fn new(wire: W) -> Self {
        Self { wire }
    }

    /// Set the resolution of the probe. High and low alarm registers are cleared.
    pub async fn set_resolution(&mut self, resolution: Resolution) {
        self.wire
            .write_bytes(&[SKIP_ROM, WRITE_SCRATCHPAD, 0x00, 0x00, resolution as u8])
            .await;
    }

    /// Start a new measurement. Allow `Resolution::conversion_ms` before calling `temperature`.
    pub async fn start(&mut self) {
        self.wire.write_bytes(&[SKIP_ROM, CONVERT_T]).await;
    }

    /// Read the last converted temperature in degrees C.
    pub async fn temperature(&mut self) -> Result<f32, SensorError> {
        self.wire.write_bytes(&[SKIP_ROM, READ_SCRATCHPAD]).await;
        let mut data = [0; 9];
        self.wire.read_bytes(&mut data).await;
        decode_scratchpad(&data)
    }
}

/// Check and convert a 9 byte scratchpad.
pub fn decode_scratchpad(data: &[u8; 9]) -> Result<f32, SensorError> {
    // The low five bits of the config register always read back as 1, so a
    // floating (0xFF) or shorted (0x00) bus never looks like a probe.
    if data.iter().all(|b| *b == 0xFF) || data[4] & 0x1F != 0x1F {
        return Err(SensorError::NoResponse);
    }
    if crc8(data) != 0 {
        return Err(SensorError::Crc);
    }
    Ok(i16::from_le_bytes([data[0], data[1]]) as f32 / 16.0)
}

/// Dallas/Maxim CRC-8. Running it over data with its CRC appended gives 0.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for b in data {
        let mut data_byte = *b;
        for _ in 0..8 {
            let mix = (crc ^ data_byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            data_byte >>= 1;
        }
    }
    crc
}
