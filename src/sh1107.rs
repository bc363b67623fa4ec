use display_interface::{AsyncWriteOnlyDataCommand, DataFormat, DisplayError};
use embedded_graphics::mono_font::{ascii::FONT_8X13, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::presentation::{StatusDisplay, StatusLines};

const WIDTH: u8 = 128;
const HEIGHT: u8 = 64;
const BUFFER_SIZE: usize = (WIDTH as usize * HEIGHT as usize) / 8;
const ROW_BYTES: usize = WIDTH as usize / 8;

const STATUS_TOP_Y: i32 = 16; // Top edge of the first status line
const STATUS_LINE_PITCH: i32 = 20;

/// SH1107 128x64 OLED with a local frame buffer. Drawing only touches the
/// buffer; `show` pushes it to the panel.
pub struct Sh1107<DI, RESET> {
    interface: DI,
    rst: RESET,
    buffer: [u8; BUFFER_SIZE],
}

impl<DI, RESET> Sh1107<DI, RESET>
where
    DI: AsyncWriteOnlyDataCommand,
    RESET: OutputPin,
{
    pub fn new(interface: DI, rst: RESET) -> Self {
        Self {
            interface,
            rst,
            buffer: [0; BUFFER_SIZE],
        }
    }

    pub async fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.reset(delay).await?;
        self.off().await?;
        self.send_commands(&[0x00]).await?; // Set lower column address
        self.send_commands(&[0x10]).await?; // Set higher column address
        self.send_commands(&[0xB0]).await?; // Set page address
        self.send_commands(&[0xDC, 0x00]).await?; // Set display start line
        self.send_commands(&[0x81, 0x6F]).await?; // Set contrast control
        self.send_commands(&[0x21]).await?; // Set memory addressing mode (0x20 = Horizontal / 0x21 = Vertical)
        self.send_commands(&[0xA0]).await?; // Set segment remap (0xA0 / 0xA1)
        self.send_commands(&[0xC0]).await?; // Set common output scan direction (0xC0 / 0xC8)
        self.send_commands(&[0xA4]).await?; // Set entire display on (0xA4 = false / 0xA5 = true)
        self.send_commands(&[0xA6]).await?; // Set normal or reverse display on (0xA6 = Normal / 0xA7 = Reverse)
        self.send_commands(&[0xA8, 0x3F]).await?; // Set multiplex ratio (Display height - 1)
        self.send_commands(&[0xD3, 0x60]).await?; // Set display offset
        self.send_commands(&[0xD5, 0x50]).await?; // Clock divide ratio / oscillator frequency mode
        self.send_commands(&[0xD9, 0x22]).await?; // Set discharge / precharge period
        self.send_commands(&[0xDB, 0x35]).await?; // Set VCOM deselect level
        self.send_commands(&[0xAD, 0x81]).await?; // Set DC-DC control mode (0x81 = On / 0x80 = Off)
        self.on().await?;
        delay.delay_ms(10).await;
        Ok(())
    }

    async fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.rst.set_high().map_err(|_| DisplayError::RSError)?;
        delay.delay_ms(1).await;
        self.rst.set_low().map_err(|_| DisplayError::RSError)?;
        delay.delay_ms(10).await;
        self.rst.set_high().map_err(|_| DisplayError::RSError)?;
        Ok(())
    }

    pub async fn off(&mut self) -> Result<(), DisplayError> {
        self.send_commands(&[0xAE]).await // Display OFF
    }

    pub async fn on(&mut self) -> Result<(), DisplayError> {
        self.send_commands(&[0xAF]).await // Display ON
    }

    async fn send_commands(&mut self, commands: &[u8]) -> Result<(), DisplayError> {
        self.interface.send_commands(DataFormat::U8(commands)).await
    }

    /// Push the frame buffer to the panel, one 128 pixel row at a time.
    pub async fn show(&mut self) -> Result<(), DisplayError> {
        self.send_commands(&[0xB0]).await?; // Set page address
        for row in 0..HEIGHT {
            let column = (HEIGHT - 1) - row;
            self.send_commands(&[column & 0x0f]).await?;
            self.send_commands(&[0x10 + (column >> 4)]).await?;
            let start = row as usize * ROW_BYTES;
            self.interface
                .send_data(DataFormat::U8(&self.buffer[start..start + ROW_BYTES]))
                .await?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0x00);
    }

    pub fn draw_text(&mut self, text: &str, top_left: Point, colour: BinaryColor) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(&FONT_8X13, colour);
        Text::with_baseline(text, top_left, style, Baseline::Top).draw(self)?;
        Ok(())
    }

    /// Replace the whole screen with the two status lines.
    pub async fn draw_status(&mut self, lines: &StatusLines) -> Result<(), DisplayError> {
        self.clear();
        self.draw_text(&lines.top, Point::new(0, STATUS_TOP_Y), BinaryColor::On)?;
        self.draw_text(
            &lines.bottom,
            Point::new(0, STATUS_TOP_Y + STATUS_LINE_PITCH),
            BinaryColor::On,
        )?;
        self.show().await
    }
}

impl<DI, RESET> StatusDisplay for Sh1107<DI, RESET>
where
    DI: AsyncWriteOnlyDataCommand,
    RESET: OutputPin,
{
    type Error = DisplayError;

    async fn show_failure(&mut self) -> Result<(), DisplayError> {
        self.draw_status(&StatusLines::failure()).await
    }

    async fn show_readings(&mut self, humidity_pct: f32, temperature_c: f32) -> Result<(), DisplayError> {
        self.draw_status(&StatusLines::readings(humidity_pct, temperature_c))
            .await
    }
}

impl<DI, RESET> DrawTarget for Sh1107<DI, RESET> {
    type Color = BinaryColor;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, colour) in pixels {
            let (x, y) = (coord.x, coord.y);
            if x >= 0 && x < WIDTH as i32 && y >= 0 && y < HEIGHT as i32 {
                let index = (y as usize * WIDTH as usize + x as usize) / 8;
                if colour == BinaryColor::On {
                    self.buffer[index] |= 1 << (x % 8);
                } else {
                    self.buffer[index] &= !(1 << (x % 8));
                }
            }
        }
        Ok(())
    }
}

impl<DI, RESET> Dimensions for Sh1107<DI, RESET> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(WIDTH as u32, HEIGHT as u32))
    }
}
