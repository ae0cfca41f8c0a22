//! Module: config
//!
//! Purpose: Runtime-tunable constants for MorseGestureLink.
//!
//! Architecture:
//! - One `DeviceConfig` inside the device state, every field an atomic
//! - `generation` bumps on each change so pollers can re-snapshot
//! - Gesture thresholds stored in milli-g
//! - No persistence: values reset to defaults at boot
//!
//! Safety: Lock-free. All access via atomics, no locks.

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use crate::gesture::GestureConfig;
use crate::morse::Timing;

/// Default Morse unit in milliseconds.
pub const DEFAULT_UNIT_MS: u32 = 100;
/// Default mode poll cadence in milliseconds.
pub const DEFAULT_POLL_MS: u32 = 100;
/// Default motion sample cadence in milliseconds.
pub const DEFAULT_SAMPLE_MS: u32 = 50;
/// Default buzzer pitch for Morse tones.
pub const DEFAULT_TONE_HZ: u32 = 700;
/// Default length of the gesture feedback blip.
pub const DEFAULT_BLIP_MS: u32 = 60;
/// Default pause after a playback or send cycle.
pub const DEFAULT_COOLDOWN_MS: u32 = 1000;
/// Default heartbeat period (0 disables).
pub const DEFAULT_HEARTBEAT_MS: u32 = 1000;
/// Default wait before retrying sensor init.
pub const DEFAULT_SENSOR_BACKOFF_MS: u32 = 2000;
/// Default status blinker / counter display period.
pub const DEFAULT_STATUS_MS: u32 = 500;
/// Default dot trigger (Δ on the dot axis), milli-g.
pub const DEFAULT_DOT_THRESHOLD_MG: u32 = 600;
/// Default dot release, milli-g.
pub const DEFAULT_DOT_RELEASE_MG: u32 = 200;
/// Default dash trigger (Δ on the dash axis), milli-g.
pub const DEFAULT_DASH_THRESHOLD_MG: u32 = 600;
/// Default dash release, milli-g.
pub const DEFAULT_DASH_RELEASE_MG: u32 = 200;

/// Device configuration.
pub struct DeviceConfig {
    pub unit_ms: AtomicU32,
    pub poll_ms: AtomicU32,
    pub sample_ms: AtomicU32,
    pub tone_hz: AtomicU32,
    pub blip_ms: AtomicU32,
    pub cooldown_ms: AtomicU32,
    pub heartbeat_ms: AtomicU32,
    pub sensor_backoff_ms: AtomicU32,
    pub status_ms: AtomicU32,
    dot_threshold: AtomicU32,
    dot_release: AtomicU32,
    dash_threshold: AtomicU32,
    dash_release: AtomicU32,
    generation: AtomicU16,
}

impl DeviceConfig {
    /// Configuration with factory defaults.
    pub const fn new() -> Self {
        Self {
            unit_ms: AtomicU32::new(DEFAULT_UNIT_MS),
            poll_ms: AtomicU32::new(DEFAULT_POLL_MS),
            sample_ms: AtomicU32::new(DEFAULT_SAMPLE_MS),
            tone_hz: AtomicU32::new(DEFAULT_TONE_HZ),
            blip_ms: AtomicU32::new(DEFAULT_BLIP_MS),
            cooldown_ms: AtomicU32::new(DEFAULT_COOLDOWN_MS),
            heartbeat_ms: AtomicU32::new(DEFAULT_HEARTBEAT_MS),
            sensor_backoff_ms: AtomicU32::new(DEFAULT_SENSOR_BACKOFF_MS),
            status_ms: AtomicU32::new(DEFAULT_STATUS_MS),
            dot_threshold: AtomicU32::new(DEFAULT_DOT_THRESHOLD_MG),
            dot_release: AtomicU32::new(DEFAULT_DOT_RELEASE_MG),
            dash_threshold: AtomicU32::new(DEFAULT_DASH_THRESHOLD_MG),
            dash_release: AtomicU32::new(DEFAULT_DASH_RELEASE_MG),
            generation: AtomicU16::new(0),
        }
    }

    /// Snapshot of the Morse timing parameters.
    pub fn timing(&self) -> Timing {
        Timing {
            unit_ms: self.unit_ms.load(Ordering::Relaxed),
            tone_hz: self.tone_hz.load(Ordering::Relaxed),
        }
    }

    /// Snapshot of the gesture thresholds.
    pub fn gesture(&self) -> GestureConfig {
        let g = |cell: &AtomicU32| cell.load(Ordering::Relaxed) as f32 / 1000.0;
        GestureConfig {
            dot_threshold: g(&self.dot_threshold),
            dot_release: g(&self.dot_release),
            dash_threshold: g(&self.dash_threshold),
            dash_release: g(&self.dash_release),
        }
    }

    /// Replace the gesture thresholds (milli-g).
    pub fn set_gesture_mg(&self, dot: (u32, u32), dash: (u32, u32)) {
        self.dot_threshold.store(dot.0, Ordering::Relaxed);
        self.dot_release.store(dot.1.min(dot.0), Ordering::Relaxed);
        self.dash_threshold.store(dash.0, Ordering::Relaxed);
        self.dash_release.store(dash.1.min(dash.0), Ordering::Relaxed);
        self.bump_generation();
    }

    /// Set the Morse unit length.
    pub fn set_unit_ms(&self, unit_ms: u32) {
        self.unit_ms.store(unit_ms.max(1), Ordering::Relaxed);
        self.bump_generation();
    }

    /// Current configuration generation.
    #[inline]
    pub fn generation(&self) -> u16 {
        self.generation.load(Ordering::Acquire)
    }

    /// Mark configuration as changed.
    #[inline]
    pub fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}
