//! Output coordinator.
//!
//! Polls the mode register at a fixed cadence and, for each
//! render-eligible mode, performs one blocking render followed by the
//! forward transition:
//!
//! ```text
//! MessageReceived ──render Morse──▶ ReadyToPrint
//! ReadyToPrint    ──show text─────▶ Printed
//! Printed         ──cooldown──────▶ Waiting
//! Sent            ──melody────────▶ (cooldown) ──▶ Waiting
//! ```
//!
//! Renders hold the surface lease for their whole duration and cannot be
//! cancelled. A button abort that lands mid-render wins: forward
//! transitions use `ModeRegister::advance`, which refuses a stale mode.

use core::sync::atomic::Ordering;

use embedded_hal::delay::DelayNs;

use crate::device::{DeviceState, MESSAGE_CAPACITY};
use crate::fault::FaultCode;
use crate::hal::Panel;
use crate::link::{send, LinkTx, SENTINEL, TERMINATOR};
use crate::melody::{self, Melody, NOTE_GAP_MS};
use crate::mode::{Event, Mode};
use crate::morse::{encode, Timing};
use crate::surface::Surface;

/// Totals from one Morse render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub pulses: u32,
    pub tones: u32,
    pub units: u32,
}

/// Play `text` as Morse on buzzer, LED and display.
///
/// Each glyph-bearing pulse replaces the display content with that glyph.
/// Blocks for the full duration.
pub fn render_morse<P, D>(text: &[u8], timing: &Timing, panel: &mut P, delay: &mut D) -> RenderStats
where
    P: Panel + ?Sized,
    D: DelayNs,
{
    let mut stats = RenderStats::default();

    for pulse in encode(text) {
        if let Some(glyph) = pulse.symbol.glyph() {
            let buf = [glyph];
            panel.clear_surface();
            panel.write_glyph(core::str::from_utf8(&buf).unwrap_or("?"));
        }

        let ms = timing.ms(pulse.units);
        if pulse.tone {
            panel.set_indicator(true);
            panel.play_tone(timing.tone_hz, ms);
            panel.set_indicator(false);
            stats.tones += 1;
        } else {
            delay.delay_ms(ms);
        }

        stats.pulses += 1;
        stats.units += pulse.units;
    }

    stats
}

/// Play a melody table on the buzzer.
pub fn play_melody<P, D>(melody: &Melody, panel: &mut P, delay: &mut D)
where
    P: Panel + ?Sized,
    D: DelayNs,
{
    for (hz, ms) in melody.steps() {
        if hz == 0 {
            delay.delay_ms(ms);
        } else {
            panel.play_tone(hz, ms);
        }
        delay.delay_ms(NOTE_GAP_MS);
    }
}

/// The playback task.
pub struct OutputCoordinator<'a> {
    device: &'a DeviceState,
    message: [u8; MESSAGE_CAPACITY],
    len: usize,
    /// Mode whose cooldown is running, and when it ends.
    cooldown: Option<(Mode, u64)>,
}

impl<'a> OutputCoordinator<'a> {
    pub fn new(device: &'a DeviceState) -> Self {
        Self {
            device,
            message: [0u8; MESSAGE_CAPACITY],
            len: 0,
            cooldown: None,
        }
    }

    /// Last message taken from the mailbox.
    pub fn message(&self) -> &[u8] {
        &self.message[..self.len]
    }

    /// Run one poll cycle.
    ///
    /// Returns the mode this cycle transitioned to, if any.
    pub fn poll<P, L, D>(
        &mut self,
        now_ms: u64,
        surface: &Surface<P>,
        link: &L,
        delay: &mut D,
    ) -> Option<Mode>
    where
        P: Panel,
        L: LinkTx,
        D: DelayNs,
    {
        let device = self.device;

        let raw = device.mode.read_raw();
        let mode = match Mode::try_from_u8(raw) {
            Some(mode) => mode,
            None => {
                device.faults.record(FaultCode::UnknownMode, raw as u32);
                crate::diag_error!(device.log, now_ms, "unknown mode {}, resetting", raw);
                device.mode.write(Mode::Waiting);
                return Some(Mode::Waiting);
            }
        };

        if let Some((cooling, _)) = self.cooldown {
            if cooling != mode {
                self.cooldown = None;
            }
        }

        let next = match mode {
            Mode::Waiting => self.recover_pending(),
            Mode::Collecting => None,
            Mode::MessageReceived => self.play_message(now_ms, surface, delay),
            Mode::ReadyToPrint => self.show_message(surface, delay),
            Mode::Printed => self.cool_down(now_ms, Mode::Printed, link),
            Mode::Sent => self.finish_send(now_ms, surface, link, delay),
        };

        if let Some(next) = next {
            crate::diag_info!(device.log, now_ms, "mode {} -> {}", mode, next);
        }
        next
    }

    /// A line that landed between the post-render check and the forward
    /// transition is still flagged; pick it up.
    fn recover_pending(&mut self) -> Option<Mode> {
        if self.device.pending.is_pending() {
            self.device.mode.advance(Mode::Waiting, Event::LineReceived).ok()
        } else {
            None
        }
    }

    fn play_message<P: Panel, D: DelayNs>(
        &mut self,
        now_ms: u64,
        surface: &Surface<P>,
        delay: &mut D,
    ) -> Option<Mode> {
        let device = self.device;
        let mut panel = surface.try_lease()?;

        match device.pending.take(&mut self.message) {
            Some(len) => self.len = len,
            None if device.pending.is_pending() => return None,
            None => {
                crate::diag_warn!(device.log, now_ms, "received mode without message");
                self.len = 0;
            }
        }

        let timing = device.config.timing();
        let stats = render_morse(self.message(), &timing, &mut *panel, delay);
        drop(panel);

        crate::diag_debug!(
            device.log,
            now_ms,
            "played {} pulses, {} units",
            stats.pulses,
            stats.units
        );

        // A newer line is waiting: stay and play it next poll
        if device.pending.is_pending() {
            return None;
        }
        device.mode.advance(Mode::MessageReceived, Event::Rendered).ok()
    }

    fn show_message<P: Panel, D: DelayNs>(
        &mut self,
        surface: &Surface<P>,
        delay: &mut D,
    ) -> Option<Mode> {
        let mut panel = surface.try_lease()?;

        let text = self.message();
        let end = text
            .iter()
            .position(|&b| b == TERMINATOR || b == b'\r')
            .unwrap_or(text.len());

        panel.clear_surface();
        panel.write_glyph(printable(&text[..end]));
        play_melody(&melody::RECEIVED, &mut *panel, delay);
        drop(panel);

        self.device.mode.advance(Mode::ReadyToPrint, Event::Printed).ok()
    }

    fn finish_send<P, L, D>(
        &mut self,
        now_ms: u64,
        surface: &Surface<P>,
        link: &L,
        delay: &mut D,
    ) -> Option<Mode>
    where
        P: Panel,
        L: LinkTx,
        D: DelayNs,
    {
        if self.cooldown.is_none() {
            let mut panel = surface.try_lease()?;
            panel.clear_surface();
            panel.write_glyph("SENT");
            play_melody(&melody::SENT, &mut *panel, delay);
        }
        self.cool_down(now_ms, Mode::Sent, link)
    }

    /// First call emits the sentinel and arms the timer; later calls
    /// advance once it expires.
    fn cool_down<L: LinkTx>(&mut self, now_ms: u64, mode: Mode, link: &L) -> Option<Mode> {
        let device = self.device;

        match self.cooldown {
            None => {
                send(link, SENTINEL, device);
                let ms = device.config.cooldown_ms.load(Ordering::Relaxed) as u64;
                self.cooldown = Some((mode, now_ms + ms));
                None
            }
            Some((_, until)) if now_ms >= until => {
                self.cooldown = None;
                device.mode.advance(mode, Event::CooldownElapsed).ok()
            }
            Some(_) => None,
        }
    }
}

/// Longest valid UTF-8 prefix.
fn printable(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_cuts_invalid_tail() {
        assert_eq!(printable(b"abc"), "abc");
        assert_eq!(printable(&[b'o', b'k', 0xFF, b'x']), "ok");
    }
}
