//! Two line status text: the latest readings, or a failure notice.
//!
//! Nothing here feeds back into control. A failed read shows "Failed" /
//! "Read" no matter what the burner was told to do.

use core::fmt::{self, Write};

use heapless::String;

use crate::controller::SensorSnapshot;

pub const COLUMNS: usize = 16;

pub type Line = String<COLUMNS>;

/// Something that can show the status text. Each call replaces whatever was
/// shown before.
#[allow(async_fn_in_trait)]
pub trait StatusDisplay {
    type Error;

    async fn show_failure(&mut self) -> Result<(), Self::Error>;
    async fn show_readings(&mut self, humidity_pct: f32, temperature_c: f32) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLines {
    pub top: Line,
    pub bottom: Line,
}

impl StatusLines {
    pub fn failure() -> Self {
        Self {
            top: line(format_args!("Failed")),
            bottom: line(format_args!("Read")),
        }
    }

    pub fn readings(humidity_pct: f32, temperature_c: f32) -> Self {
        Self {
            top: line(format_args!("Humidity: {:.2}%", humidity_pct)),
            bottom: line(format_args!("Temp: {:.2} C", temperature_c)),
        }
    }

    pub fn for_snapshot(snapshot: &SensorSnapshot) -> Self {
        match snapshot.readings() {
            Some((temperature_c, humidity_pct)) => Self::readings(humidity_pct, temperature_c),
            None => Self::failure(),
        }
    }
}

/// Show a snapshot on `display`.
pub async fn present<S: StatusDisplay>(snapshot: &SensorSnapshot, display: &mut S) -> Result<(), S::Error> {
    match snapshot.readings() {
        Some((temperature_c, humidity_pct)) => display.show_readings(humidity_pct, temperature_c).await,
        None => display.show_failure().await,
    }
}

/// Format into one display line, cutting off anything past the last column.
fn line(args: fmt::Arguments<'_>) -> Line {
    let mut clipped = Clip::default();
    // Clip never reports an error, it just stops storing
    let _ = clipped.write_fmt(args);
    clipped.line
}

#[derive(Default)]
struct Clip {
    line: Line,
}

impl Write for Clip {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.line.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}
