//! Recording fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use embedded_hal::delay::DelayNs;

use morse_gesture_link::hal::{HalError, MotionSample, MotionSensor, Panel};
use morse_gesture_link::link::LinkError;
use morse_gesture_link::LinkTx;

/// One call on the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Indicator(bool),
    Clear,
    Glyph(String),
    Tone(u32, u32),
}

/// Panel that records every call.
#[derive(Debug, Default)]
pub struct RecordingPanel {
    pub events: Vec<PanelEvent>,
}

impl RecordingPanel {
    pub fn tones(&self) -> Vec<(u32, u32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PanelEvent::Tone(hz, ms) => Some((*hz, *ms)),
                _ => None,
            })
            .collect()
    }

    pub fn glyphs(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PanelEvent::Glyph(g) => Some(g.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn indicator_writes(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PanelEvent::Indicator(on) => Some(*on),
                _ => None,
            })
            .collect()
    }
}

impl Panel for RecordingPanel {
    fn set_indicator(&mut self, on: bool) {
        self.events.push(PanelEvent::Indicator(on));
    }

    fn clear_surface(&mut self) {
        self.events.push(PanelEvent::Clear);
    }

    fn write_glyph(&mut self, text: &str) {
        self.events.push(PanelEvent::Glyph(text.to_string()));
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        self.events.push(PanelEvent::Tone(frequency_hz, duration_ms));
    }
}

/// Link that captures outbound bytes.
pub struct MockLink {
    sent: Mutex<Vec<u8>>,
    connected: AtomicBool,
}

impl MockLink {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn disconnected() -> Self {
        let link = Self::new();
        link.set_connected(false);
        link
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<u8> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_str(&self) -> String {
        String::from_utf8_lossy(&self.sent()).into_owned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl LinkTx for MockLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), LinkError> {
        self.sent.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }
}

/// Delay that only accumulates.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += ms as u64 * 1_000_000;
    }
}

/// Sensor replaying a scripted sequence. Holds the last sample once the
/// script runs out.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    pub samples: VecDeque<MotionSample>,
    pub last: MotionSample,
    /// Remaining `init_motion` calls that fail.
    pub init_failures: u32,
    pub init_calls: u32,
    /// Next `read_motion` fails.
    pub fail_next_read: bool,
}

impl ScriptedSensor {
    pub fn with_samples(samples: &[(f32, f32)]) -> Self {
        Self {
            samples: samples
                .iter()
                .map(|&(ax, ay)| MotionSample::planar(ax, ay))
                .collect(),
            ..Self::default()
        }
    }
}

impl MotionSensor for ScriptedSensor {
    fn init_motion(&mut self) -> Result<(), HalError> {
        self.init_calls += 1;
        if self.init_failures > 0 {
            self.init_failures -= 1;
            return Err(HalError::SensorNotReady);
        }
        Ok(())
    }

    fn read_motion(&mut self) -> Result<MotionSample, HalError> {
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(HalError::BusError);
        }
        if let Some(sample) = self.samples.pop_front() {
            self.last = sample;
        }
        Ok(self.last)
    }
}
