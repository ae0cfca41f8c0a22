//! Module: mode
//!
//! Purpose: The device operating mode and its transition table.
//!
//! Architecture:
//! - `Mode` is a one-byte enum, stored in an `AtomicU8`
//! - `Mode::next` is a total pure function over (mode, event)
//! - Three writers: button ISR, link assembler, output coordinator
//! - Everyone else only reads
//!
//! Safety: Lock-free. Safe to call from interrupt context.

use core::sync::atomic::{AtomicU8, Ordering};

/// Device operating mode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Idle, waiting for a button press or a host message.
    Waiting = 0,
    /// Sampling gestures and sending symbols to the host.
    Collecting = 1,
    /// A complete host message is pending playback.
    MessageReceived = 2,
    /// Playback finished, text not yet shown.
    ReadyToPrint = 3,
    /// Text shown, cooling down.
    Printed = 4,
    /// User closed a transmission, cooling down.
    Sent = 5,
}

/// Every mode, in discriminant order.
pub const ALL_MODES: [Mode; 6] = [
    Mode::Waiting,
    Mode::Collecting,
    Mode::MessageReceived,
    Mode::ReadyToPrint,
    Mode::Printed,
    Mode::Sent,
];

/// Something that moves the mode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Falling edge on the primary button.
    ButtonPress,
    /// The link assembler completed a line.
    LineReceived,
    /// Morse playback of the pending message finished.
    Rendered,
    /// Message text written to the display.
    Printed,
    /// Post-cycle cooldown expired.
    CooldownElapsed,
}

/// Every event.
pub const ALL_EVENTS: [Event; 5] = [
    Event::ButtonPress,
    Event::LineReceived,
    Event::Rendered,
    Event::Printed,
    Event::CooldownElapsed,
];

impl Mode {
    /// Convert from raw u8 value. Unknown values decode to `Waiting`.
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Mode::Collecting,
            2 => Mode::MessageReceived,
            3 => Mode::ReadyToPrint,
            4 => Mode::Printed,
            5 => Mode::Sent,
            _ => Mode::Waiting,
        }
    }

    /// Strict conversion: `None` for values outside the enum.
    #[inline]
    pub fn try_from_u8(value: u8) -> Option<Self> {
        match value {
            0..=5 => Some(Self::from_u8(value)),
            _ => None,
        }
    }

    /// Short name for logs and the heartbeat line.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Waiting => "WAITING",
            Mode::Collecting => "COLLECTING",
            Mode::MessageReceived => "RECEIVED",
            Mode::ReadyToPrint => "READY",
            Mode::Printed => "PRINTED",
            Mode::Sent => "SENT",
        }
    }

    /// Transition table.
    ///
    /// A press advances `Waiting -> Collecting -> Sent` and aborts anything
    /// else back to `Waiting`. A completed line always wins. Coordinator
    /// events seen in a mode they don't belong to fall back to `Waiting`.
    pub fn next(self, event: Event) -> Mode {
        match (self, event) {
            (Mode::Waiting, Event::ButtonPress) => Mode::Collecting,
            (Mode::Collecting, Event::ButtonPress) => Mode::Sent,
            (_, Event::ButtonPress) => Mode::Waiting,

            (_, Event::LineReceived) => Mode::MessageReceived,

            (Mode::MessageReceived, Event::Rendered) => Mode::ReadyToPrint,
            (Mode::ReadyToPrint, Event::Printed) => Mode::Printed,
            (Mode::Printed, Event::CooldownElapsed) | (Mode::Sent, Event::CooldownElapsed) => {
                Mode::Waiting
            }

            (_, Event::Rendered) | (_, Event::Printed) | (_, Event::CooldownElapsed) => {
                Mode::Waiting
            }
        }
    }
}

impl From<Mode> for u8 {
    fn from(m: Mode) -> Self {
        m as u8
    }
}

impl From<u8> for Mode {
    fn from(v: u8) -> Self {
        Self::from_u8(v)
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single shared mode cell.
///
/// Reads never block. Writes are single atomic operations, so the button
/// ISR can preempt any task mid-poll without tearing the value.
pub struct ModeRegister {
    mode: AtomicU8,
}

impl ModeRegister {
    /// Create register in `Waiting`.
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(Mode::Waiting as u8),
        }
    }

    /// Current mode.
    #[inline]
    pub fn read(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Raw stored byte, for callers that want to spot corruption.
    #[inline]
    pub fn read_raw(&self) -> u8 {
        self.mode.load(Ordering::Acquire)
    }

    /// Overwrite the mode.
    #[inline]
    pub fn write(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Apply `event` to whatever the current mode is.
    ///
    /// Returns `(previous, new)`.
    #[inline]
    pub fn apply(&self, event: Event) -> (Mode, Mode) {
        let prev = self
            .mode
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(Mode::from_u8(raw).next(event) as u8)
            })
            .unwrap_or_else(|raw| raw);
        let prev = Mode::from_u8(prev);
        (prev, prev.next(event))
    }

    /// Apply `event` only if the mode is still `from`.
    ///
    /// Used by the output coordinator after a blocking render: if the button
    /// aborted or a new line arrived meanwhile, that write stands.
    #[inline]
    pub fn advance(&self, from: Mode, event: Event) -> Result<Mode, Mode> {
        let to = from.next(event);
        self.mode
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| to)
            .map_err(Mode::from_u8)
    }
}

impl Default for ModeRegister {
    fn default() -> Self {
        Self::new()
    }
}
