//! Input sources: buttons and the motion sampler.
//!
//! The button handler runs in interrupt context and only touches atomics.
//! The motion sampler is a polling task that turns IMU jerks into Morse
//! symbols while the device is collecting.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::device::DeviceState;
use crate::fault::FaultCode;
use crate::gesture::{Gesture, GestureClassifier};
use crate::hal::{MotionSensor, Panel};
use crate::link::{send, LinkTx};
use crate::mode::{Event, Mode};
use crate::surface::Surface;

/// Physical buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Advances or aborts the mode sequence.
    Primary,
    /// Requests an explicit word space.
    Secondary,
}

/// "Send a space" request raised by the secondary button.
pub struct SecondaryAction {
    requested: AtomicBool,
}

impl SecondaryAction {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }

    /// Raise the request (ISR).
    #[inline]
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Check without consuming.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Consume the request.
    #[inline]
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }
}

impl Default for SecondaryAction {
    fn default() -> Self {
        Self::new()
    }
}

/// Falling-edge handler. Interrupt-safe: no blocking, no allocation.
///
/// Returns the mode after the edge.
pub fn on_button_edge(device: &DeviceState, button: Button, now_ms: u64) -> Mode {
    match button {
        Button::Primary => {
            let (prev, next) = device.mode.apply(Event::ButtonPress);
            // An abort also drops the message, or Waiting would replay it
            if !matches!(prev, Mode::Waiting | Mode::Collecting) && device.pending.discard() {
                crate::diag_debug!(device.log, now_ms, "button: pending message dropped");
            }
            crate::diag_debug!(device.log, now_ms, "button: {} -> {}", prev, next);
            next
        }
        Button::Secondary => {
            device.secondary.request();
            device.mode.read()
        }
    }
}

/// What one sampler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerStep {
    /// Not collecting; nothing sampled.
    Idle,
    /// Sensor down, waiting out the backoff.
    SensorBackoff,
    /// Sampled, nothing classified.
    Quiet,
    /// A gesture was classified and sent.
    Symbol(Gesture),
    /// The secondary button's space was sent.
    Space,
}

/// Polls the IMU while collecting and forwards classified symbols.
pub struct MotionSampler {
    classifier: GestureClassifier,
    sensor_ready: bool,
    retry_at_ms: u64,
    config_gen: u16,
}

impl MotionSampler {
    pub fn new(device: &DeviceState) -> Self {
        Self {
            classifier: GestureClassifier::new(device.config.gesture()),
            sensor_ready: false,
            retry_at_ms: 0,
            config_gen: device.config.generation(),
        }
    }

    /// True once the sensor has been initialised.
    pub fn sensor_ready(&self) -> bool {
        self.sensor_ready
    }

    /// One sampler cycle.
    pub fn tick<S, P, L>(
        &mut self,
        now_ms: u64,
        device: &DeviceState,
        sensor: &mut S,
        surface: &Surface<P>,
        link: &L,
    ) -> SamplerStep
    where
        S: MotionSensor,
        P: Panel,
        L: LinkTx,
    {
        if device.mode.read() != Mode::Collecting {
            // Stale history would fake a jerk on re-entry
            self.classifier.reset();
            device.secondary.take();
            return SamplerStep::Idle;
        }

        if !self.ensure_sensor(now_ms, device, sensor) {
            return SamplerStep::SensorBackoff;
        }

        let gen = device.config.generation();
        if gen != self.config_gen {
            self.classifier.set_config(device.config.gesture());
            self.config_gen = gen;
        }

        let mut step = SamplerStep::Quiet;

        match sensor.read_motion() {
            Ok(sample) => {
                if let Some(gesture) = self.classifier.push(sample) {
                    blip(device, surface);
                    send(link, &[gesture.as_byte()], device);
                    crate::diag_debug!(device.log, now_ms, "gesture {:?}", gesture);
                    step = SamplerStep::Symbol(gesture);
                }
            }
            Err(e) => {
                device.faults.record(FaultCode::SensorUnavailable, 0);
                crate::diag_warn!(device.log, now_ms, "imu read: {}", e);
                self.sensor_ready = false;
                self.retry_at_ms = now_ms + backoff_ms(device);
                self.classifier.reset();
                return SamplerStep::SensorBackoff;
            }
        }

        if device.secondary.take() {
            blip(device, surface);
            send(link, b" ", device);
            if step == SamplerStep::Quiet {
                step = SamplerStep::Space;
            }
        }

        step
    }

    fn ensure_sensor<S: MotionSensor>(
        &mut self,
        now_ms: u64,
        device: &DeviceState,
        sensor: &mut S,
    ) -> bool {
        if self.sensor_ready {
            return true;
        }
        if now_ms < self.retry_at_ms {
            return false;
        }

        match sensor.init_motion() {
            Ok(()) => {
                crate::diag_info!(device.log, now_ms, "imu ready");
                self.sensor_ready = true;
                self.classifier.reset();
                true
            }
            Err(e) => {
                let backoff = backoff_ms(device);
                device.faults.record(FaultCode::SensorUnavailable, backoff as u32);
                crate::diag_warn!(device.log, now_ms, "imu init: {}, retry in {} ms", e, backoff);
                self.retry_at_ms = now_ms + backoff;
                false
            }
        }
    }
}

fn backoff_ms(device: &DeviceState) -> u64 {
    device.config.sensor_backoff_ms.load(Ordering::Relaxed) as u64
}

/// Short tone+light acknowledgement of a symbol. Skipped if the surface is
/// busy; the symbol is still sent.
fn blip<P: Panel>(device: &DeviceState, surface: &Surface<P>) {
    let Some(mut panel) = surface.try_lease() else {
        return;
    };
    let timing = device.config.timing();
    let ms = device.config.blip_ms.load(Ordering::Relaxed);

    panel.set_indicator(true);
    panel.play_tone(timing.tone_hz, ms);
    panel.set_indicator(false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_cycles_modes() {
        let device = DeviceState::new();
        assert_eq!(on_button_edge(&device, Button::Primary, 0), Mode::Collecting);
        assert_eq!(on_button_edge(&device, Button::Primary, 1), Mode::Sent);
        assert_eq!(on_button_edge(&device, Button::Primary, 2), Mode::Waiting);
    }

    #[test]
    fn test_abort_drops_pending_message() {
        let device = DeviceState::new();
        device.pending.publish(b"...");
        device.mode.write(Mode::MessageReceived);

        assert_eq!(on_button_edge(&device, Button::Primary, 0), Mode::Waiting);
        assert!(!device.pending.is_pending());
    }

    #[test]
    fn test_start_collecting_keeps_pending_message() {
        let device = DeviceState::new();
        device.pending.publish(b".");

        assert_eq!(on_button_edge(&device, Button::Primary, 0), Mode::Collecting);
        assert!(device.pending.is_pending());
    }

    #[test]
    fn test_secondary_leaves_mode_alone() {
        let device = DeviceState::new();
        device.mode.write(Mode::Collecting);

        assert_eq!(on_button_edge(&device, Button::Secondary, 0), Mode::Collecting);
        assert!(device.secondary.is_requested());
        assert!(device.secondary.take());
        assert!(!device.secondary.take());
    }
}
