//! Morse pulse encoder.
//!
//! Pure logic, no hardware dependencies. Turns a line of host text into a
//! lazy sequence of timed pulses. Rendering lives in `output`.
//!
//! # Alphabet
//!
//! | input          | pulse                              |
//! |----------------|------------------------------------|
//! | `.`            | tone 1 unit, silence 1 unit        |
//! | `-`            | tone 3 units, silence 1 unit       |
//! | `' '`          | silence 3 units (letter gap)       |
//! | `"  "`         | silence 7 units (word gap)         |
//! | `\n`, `\r`     | end of message                     |
//! | anything else  | shown literally, silence 1 unit    |

/// Units of tone for a dot.
pub const DOT_UNITS: u32 = 1;
/// Units of tone for a dash.
pub const DASH_UNITS: u32 = 3;
/// Units of silence after every dot or dash.
pub const ELEMENT_GAP_UNITS: u32 = 1;
/// Units of silence for a single space.
pub const LETTER_GAP_UNITS: u32 = 3;
/// Units of silence for a double space.
pub const WORD_GAP_UNITS: u32 = 7;
/// Units of silence for a literal pass-through byte.
pub const LITERAL_UNITS: u32 = 1;

/// Playback timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Length of one Morse unit in milliseconds.
    pub unit_ms: u32,
    /// Buzzer pitch for tone pulses.
    pub tone_hz: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            unit_ms: crate::config::DEFAULT_UNIT_MS,
            tone_hz: crate::config::DEFAULT_TONE_HZ,
        }
    }
}

impl Timing {
    /// Duration of `units` in milliseconds.
    #[inline]
    pub fn ms(&self, units: u32) -> u32 {
        units.saturating_mul(self.unit_ms)
    }
}

/// What a pulse represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    Dot,
    Dash,
    /// Silence separating two dots/dashes.
    ElementGap,
    LetterGap,
    WordGap,
    /// Byte outside the alphabet, passed through to the display.
    Literal(u8),
}

impl Symbol {
    /// Byte to show on the display for this pulse, if any.
    pub fn glyph(self) -> Option<u8> {
        match self {
            Symbol::Dot => Some(b'.'),
            Symbol::Dash => Some(b'-'),
            Symbol::LetterGap | Symbol::WordGap => Some(b' '),
            Symbol::Literal(b) => Some(b),
            Symbol::ElementGap => None,
        }
    }
}

/// One timed step of playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pulse {
    pub symbol: Symbol,
    /// Buzzer and LED on for the whole pulse.
    pub tone: bool,
    pub units: u32,
}

impl Pulse {
    const fn tone(symbol: Symbol, units: u32) -> Self {
        Self { symbol, tone: true, units }
    }

    const fn silence(symbol: Symbol, units: u32) -> Self {
        Self { symbol, tone: false, units }
    }
}

/// Lazy pulse iterator over a text line.
///
/// # Example
///
/// ```
/// use morse_gesture_link::morse::encode;
///
/// let units: Vec<u32> = encode(b".- .-").map(|p| p.units).collect();
/// assert_eq!(units, [1, 1, 3, 1, 3, 1, 1, 3, 1]);
/// ```
#[derive(Clone, Debug)]
pub struct Encoder<'a> {
    text: &'a [u8],
    pos: usize,
    /// Gap owed after the tone just emitted.
    pending_gap: bool,
}

/// Encode `text` into pulses.
pub fn encode(text: &[u8]) -> Encoder<'_> {
    Encoder {
        text,
        pos: 0,
        pending_gap: false,
    }
}

impl<'a> Iterator for Encoder<'a> {
    type Item = Pulse;

    fn next(&mut self) -> Option<Pulse> {
        if self.pending_gap {
            self.pending_gap = false;
            return Some(Pulse::silence(Symbol::ElementGap, ELEMENT_GAP_UNITS));
        }

        let byte = *self.text.get(self.pos)?;
        self.pos += 1;

        let pulse = match byte {
            b'.' => {
                self.pending_gap = true;
                Pulse::tone(Symbol::Dot, DOT_UNITS)
            }
            b'-' => {
                self.pending_gap = true;
                Pulse::tone(Symbol::Dash, DASH_UNITS)
            }
            b' ' if self.text.get(self.pos) == Some(&b' ') => {
                self.pos += 1;
                Pulse::silence(Symbol::WordGap, WORD_GAP_UNITS)
            }
            b' ' => Pulse::silence(Symbol::LetterGap, LETTER_GAP_UNITS),
            b'\n' | b'\r' => {
                self.pos = self.text.len();
                return None;
            }
            other => Pulse::silence(Symbol::Literal(other), LITERAL_UNITS),
        };

        Some(pulse)
    }
}

/// Total length of `text` in units.
pub fn total_units(text: &[u8]) -> u32 {
    encode(text).map(|p| p.units).sum()
}

/// Number of tone pulses in `text`.
pub fn tone_count(text: &[u8]) -> usize {
    encode(text).filter(|p| p.tone).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_then_gap() {
        let pulses: Vec<Pulse> = encode(b".").collect();
        assert_eq!(
            pulses,
            [
                Pulse::tone(Symbol::Dot, 1),
                Pulse::silence(Symbol::ElementGap, 1)
            ]
        );
    }

    #[test]
    fn test_double_space_is_one_word_gap() {
        let pulses: Vec<Pulse> = encode(b"  ").collect();
        assert_eq!(pulses, [Pulse::silence(Symbol::WordGap, 7)]);
    }

    #[test]
    fn test_triple_space() {
        let units: Vec<u32> = encode(b"   ").map(|p| p.units).collect();
        assert_eq!(units, [7, 3]);
    }

    #[test]
    fn test_terminator_stops() {
        assert_eq!(total_units(b".\n-"), 2);
        assert_eq!(total_units(b"-\r\n."), 4);
    }

    #[test]
    fn test_literal_passthrough() {
        let pulses: Vec<Pulse> = encode(b"A").collect();
        assert_eq!(pulses, [Pulse::silence(Symbol::Literal(b'A'), 1)]);
        assert_eq!(pulses[0].symbol.glyph(), Some(b'A'));
    }

    #[test]
    fn test_timing_ms() {
        let t = Timing { unit_ms: 100, tone_hz: 700 };
        assert_eq!(t.ms(DASH_UNITS), 300);
        assert_eq!(t.ms(WORD_GAP_UNITS), 700);
    }
}
