#![no_std]
#![no_main]

use defmt::*;

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Instant, Timer};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, OutputOpenDrain};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_rp::pio_programs::onewire::{PioOneWire, PioOneWireProgram};
use embassy_rp::pwm::{self, Pwm};
use embassy_rp::spi::{Config, Phase, Polarity, Spi};

use embedded_hal_bus::spi::ExclusiveDevice;
use display_interface_spi::SPIInterface;

use {defmt_rtt as _, panic_probe as _};

use pasta_boil_rs::actuator::{BurnerRig, DialCalibration, SERVO_FRAME_US};
use pasta_boil_rs::controller::{reading, Thresholds};
use pasta_boil_rs::cycle::Boiler;
use pasta_boil_rs::dht11::Dht11;
use pasta_boil_rs::sensor::{Ds18b20, Resolution, SensorSource};
use pasta_boil_rs::sh1107::Sh1107;
use pasta_boil_rs::DHT11_MIN_INTERVAL_MS;

const PROBE_RESOLUTION: Resolution = Resolution::Bits12;
const FAN_PWM_HZ: u32 = 25_000;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

/// Water probe on the PIO one-wire bus and the DHT11 above the pot.
struct PotSensors<'d> {
    probe: Ds18b20<PioOneWire<'d, PIO0, 0>>,
    dht: Dht11<OutputOpenDrain<'d>, Delay>,
    last_humidity: Option<(Instant, Option<f32>)>,
}

impl SensorSource for PotSensors<'_> {
    async fn read_temperature_c(&mut self) -> Option<f32> {
        self.probe.start().await;
        Timer::after_millis(PROBE_RESOLUTION.conversion_ms()).await;
        match self.probe.temperature().await {
            Ok(temp) => reading(temp),
            Err(e) => {
                warn!("water probe read failed: {}", e);
                None
            }
        }
    }

    async fn read_humidity_pct(&mut self) -> Option<f32> {
        // The DHT11 only refreshes every 2 s; inside that window hand back the
        // last frame.
        if let Some((at, humidity)) = self.last_humidity {
            if at.elapsed() < Duration::from_millis(DHT11_MIN_INTERVAL_MS) {
                return humidity;
            }
        }
        let humidity = match self.dht.read() {
            Ok(frame) => reading(frame.humidity_pct),
            Err(e) => {
                warn!("humidity sensor read failed: {}", e);
                None
            }
        };
        self.last_humidity = Some((Instant::now(), humidity));
        humidity
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("start");
    let peripherals = embassy_rp::init(Default::default());
    let mut delay = Delay;

    // Display pins
    let dc = Output::new(peripherals.PIN_8, Level::Low); // Data/Command
    let cs = Output::new(peripherals.PIN_9, Level::High); // Chip Select
    let sclk = peripherals.PIN_10; // Serial Clock
    let mosi = peripherals.PIN_11; // Master Out Slave In
    let rst = Output::new(peripherals.PIN_12, Level::Low); // Reset

    // Thermometer pins
    let mut pio = Pio::new(peripherals.PIO0, Irqs);
    let prg = PioOneWireProgram::new(&mut pio.common);
    let onewire = PioOneWire::new(&mut pio.common, pio.sm0, peripherals.PIN_16, &prg);
    let mut probe = Ds18b20::new(onewire);
    probe.set_resolution(PROBE_RESOLUTION).await;

    // Humidity sensor, open drain with the module's pull-up
    let dht_pin = OutputOpenDrain::new(peripherals.PIN_2, Level::High);
    let dht = Dht11::new(dht_pin, Delay);

    // Dial servo: 1 MHz PWM tick so one count is one microsecond
    let mut dial_config = pwm::Config::default();
    dial_config.divider = 125u8.into();
    dial_config.top = SERVO_FRAME_US - 1;
    let (_, dial) = Pwm::new_output_b(peripherals.PWM_SLICE1, peripherals.PIN_3, dial_config).split();
    let dial = unwrap!(dial);

    // Fan: above the audible range
    let mut fan_config = pwm::Config::default();
    fan_config.top = (embassy_rp::clocks::clk_sys_freq() / FAN_PWM_HZ - 1) as u16;
    let (fan, _) = Pwm::new_output_a(peripherals.PWM_SLICE2, peripherals.PIN_4, fan_config).split();
    let fan = unwrap!(fan);

    let rig = BurnerRig::new(dial, fan, Delay, DialCalibration::default());

    let mut spi_config = Config::default();
    spi_config.frequency = 2_000_000;
    spi_config.phase = Phase::CaptureOnSecondTransition;
    spi_config.polarity = Polarity::IdleHigh;

    let spi = Spi::new_txonly(peripherals.SPI1, sclk, mosi, peripherals.DMA_CH0, spi_config);
    let spi_device = unwrap!(ExclusiveDevice::new(spi, cs, Delay));
    let mut display = Sh1107::new(SPIInterface::new(spi_device, dc), rst);
    if display.init(&mut delay).await.is_err() {
        // Control does not depend on the display; keep going without it
        error!("display init failed");
    }

    let sensors = PotSensors {
        probe,
        dht,
        last_humidity: None,
    };
    let thresholds = Thresholds::default();
    info!("thresholds: {}", thresholds);

    let mut boiler = Boiler::new(sensors, rig, display, thresholds);
    boiler.start().await;

    let mut phase = None;
    loop {
        let report = boiler.cycle(Instant::now().as_millis()).await;
        if phase != Some(report.phase) {
            info!("{} at {=u64} ms", report.phase, report.uptime_ms);
            phase = Some(report.phase);
        }
    }
}
