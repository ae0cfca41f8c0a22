//! Hardware Abstraction Layer for MorseGestureLink.
//!
//! The core never touches registers. It talks to the board through the
//! primitives below; the firmware binary implements them on ESP-IDF and the
//! tests implement them with recording fakes.
//!
//! Blocking waits go through [`embedded_hal::delay::DelayNs`].

pub mod icm42670;
pub mod imu;

pub use icm42670::{Icm42670, Icm42670Config};
pub use imu::{MotionSample, MotionSensor};

/// Hardware error reported by a board primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Sensor did not answer or returned a bad identity.
    SensorNotReady,
    /// Bus transfer failed.
    BusError,
}

impl HalError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::SensorNotReady => "H01",
            Self::BusError => "H02",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::SensorNotReady => "sensor not ready",
            Self::BusError => "bus error",
        }
    }
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Feedback surface shared by the LED, the text display and the buzzer.
///
/// All calls are synchronous. `play_tone` blocks for `duration_ms`.
pub trait Panel {
    /// Drive the indicator LED.
    fn set_indicator(&mut self, on: bool);

    /// Blank the text display.
    fn clear_surface(&mut self);

    /// Write text at the display cursor.
    fn write_glyph(&mut self, text: &str);

    /// Sound the buzzer at `frequency_hz` for `duration_ms`, then silence it.
    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32);
}

impl<P: Panel + ?Sized> Panel for &mut P {
    fn set_indicator(&mut self, on: bool) {
        (**self).set_indicator(on)
    }

    fn clear_surface(&mut self) {
        (**self).clear_surface()
    }

    fn write_glyph(&mut self, text: &str) {
        (**self).write_glyph(text)
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        (**self).play_tone(frequency_hz, duration_ms)
    }
}
