//! Melody tables.
//!
//! Parallel frequency/duration sequences fixed at compile time. A
//! frequency of 0 is a rest.

/// Pause between consecutive notes.
pub const NOTE_GAP_MS: u32 = 30;

/// A tune as parallel note and duration tables.
#[derive(Debug, Clone, Copy)]
pub struct Melody {
    pub notes_hz: &'static [u32],
    pub durations_ms: &'static [u32],
}

impl Melody {
    /// Number of steps (rests included).
    pub fn len(&self) -> usize {
        self.notes_hz.len().min(self.durations_ms.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(frequency_hz, duration_ms)` pairs.
    pub fn steps(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.notes_hz
            .iter()
            .copied()
            .zip(self.durations_ms.iter().copied())
    }

    /// Total play time including note gaps.
    pub fn duration_ms(&self) -> u32 {
        self.steps().map(|(_, d)| d + NOTE_GAP_MS).sum()
    }
}

/// Played when the user closes a transmission ("The Good, the Bad and the
/// Ugly" intro).
pub const SENT: Melody = Melody {
    notes_hz: &[440, 587, 440, 587, 440, 349, 392, 293],
    durations_ms: &[150, 150, 150, 150, 900, 600, 600, 1200],
};

/// Played once a host message has been shown.
pub const RECEIVED: Melody = Melody {
    notes_hz: &[880, 0, 1175],
    durations_ms: &[80, 40, 120],
};
