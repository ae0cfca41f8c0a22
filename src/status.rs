//! Idle indicators: status blinker and counter display.
//!
//! Both run only while the device is `Waiting` and only when they can get
//! the surface lease, so they never interleave with a render.

use core::fmt::Write;
use core::sync::atomic::Ordering;

use crate::device::DeviceState;
use crate::hal::Panel;
use crate::logging::BufWriter;
use crate::mode::Mode;
use crate::surface::Surface;

/// Fixed-period scheduler shared by the indicators.
#[derive(Debug, Clone, Copy)]
struct Period {
    next_ms: u64,
}

impl Period {
    const fn new() -> Self {
        Self { next_ms: 0 }
    }

    /// True if the period elapsed; re-arms from `now_ms`.
    fn due(&mut self, now_ms: u64, period_ms: u32) -> bool {
        if now_ms < self.next_ms {
            return false;
        }
        self.next_ms = now_ms + period_ms.max(1) as u64;
        true
    }
}

fn idle(device: &DeviceState) -> bool {
    device.mode.read() == Mode::Waiting
}

/// Toggles the LED while idle.
///
/// Leaves the LED off outside `Waiting`, and restarts from off on
/// re-entry since renders and blips also end with it off.
pub struct StatusBlinker {
    period: Period,
    on: bool,
    was_idle: bool,
}

impl StatusBlinker {
    pub const fn new() -> Self {
        Self {
            period: Period::new(),
            on: false,
            was_idle: true,
        }
    }

    /// Returns the LED state written this tick, if any.
    pub fn tick<P: Panel>(
        &mut self,
        now_ms: u64,
        device: &DeviceState,
        surface: &Surface<P>,
    ) -> Option<bool> {
        let idle = idle(device);
        let entered = idle && !self.was_idle;
        self.was_idle = idle;

        if !idle {
            if !self.on {
                return None;
            }
            let mut panel = surface.try_lease()?;
            panel.set_indicator(false);
            self.on = false;
            return Some(false);
        }

        if entered {
            self.on = false;
        }
        let mut panel = surface.try_lease()?;
        if !self.period.due(now_ms, device.config.status_ms.load(Ordering::Relaxed)) {
            return None;
        }

        self.on = !self.on;
        panel.set_indicator(self.on);
        Some(self.on)
    }
}

impl Default for StatusBlinker {
    fn default() -> Self {
        Self::new()
    }
}

/// Shows an incrementing counter while idle.
pub struct CounterDisplay {
    period: Period,
    counter: u32,
}

impl CounterDisplay {
    pub const fn new() -> Self {
        Self {
            period: Period::new(),
            counter: 0,
        }
    }

    /// Returns the value shown this tick, if any.
    pub fn tick<P: Panel>(
        &mut self,
        now_ms: u64,
        device: &DeviceState,
        surface: &Surface<P>,
    ) -> Option<u32> {
        if !idle(device) {
            return None;
        }
        let mut panel = surface.try_lease()?;
        if !self.period.due(now_ms, device.config.status_ms.load(Ordering::Relaxed)) {
            return None;
        }

        let shown = self.counter;
        let mut buf = [0u8; 12];
        let mut w = BufWriter::new(&mut buf);
        let _ = write!(w, "{}", shown);

        panel.clear_surface();
        panel.write_glyph(core::str::from_utf8(w.written()).unwrap_or(""));
        self.counter = self.counter.wrapping_add(1);
        Some(shown)
    }
}

impl Default for CounterDisplay {
    fn default() -> Self {
        Self::new()
    }
}
