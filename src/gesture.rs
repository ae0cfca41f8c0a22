//! Gesture classifier finite state machine.
//!
//! Pure logic, no hardware dependencies. Consumes consecutive motion
//! samples, produces Morse symbols. Fully testable on host.
//!
//! # Detection
//!
//! The discrete derivative of two accelerometer axes is compared against
//! fixed thresholds. A jerk on the dot axis (`ay`) is a dot, a jerk on the
//! dash axis (`ax`) is a dash. After firing, the classifier holds until the
//! same delta drops under a lower release threshold, so one sustained
//! motion yields exactly one symbol.

use crate::hal::MotionSample;

/// Classified gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    Dot,
    Dash,
}

impl Gesture {
    /// Byte sent over the link for this gesture.
    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Gesture::Dot => b'.',
            Gesture::Dash => b'-',
        }
    }
}

/// Classifier state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    DotInProgress,
    DashInProgress,
}

/// Thresholds in g.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Δay above this fires a dot.
    pub dot_threshold: f32,
    /// Δay below this ends the dot.
    pub dot_release: f32,
    /// Δax above this fires a dash.
    pub dash_threshold: f32,
    /// Δax below this ends the dash.
    pub dash_release: f32,
}

impl GestureConfig {
    pub const DEFAULT: Self = Self {
        dot_threshold: 0.6,
        dot_release: 0.2,
        dash_threshold: 0.6,
        dash_release: 0.2,
    };
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One classifier step.
///
/// Returns the next state and the symbol to emit, if any. Dots win when
/// both axes fire on the same sample.
pub fn classify_motion(
    state: GestureState,
    prev: &MotionSample,
    curr: &MotionSample,
    config: &GestureConfig,
) -> (GestureState, Option<Gesture>) {
    let d_dash = (curr.ax - prev.ax).abs();
    let d_dot = (curr.ay - prev.ay).abs();

    match state {
        GestureState::Idle => {
            if d_dot > config.dot_threshold {
                (GestureState::DotInProgress, Some(Gesture::Dot))
            } else if d_dash > config.dash_threshold {
                (GestureState::DashInProgress, Some(Gesture::Dash))
            } else {
                (GestureState::Idle, None)
            }
        }
        GestureState::DotInProgress if d_dot < config.dot_release => (GestureState::Idle, None),
        GestureState::DashInProgress if d_dash < config.dash_release => {
            (GestureState::Idle, None)
        }
        held => (held, None),
    }
}

/// Stateful classifier over a sample stream.
pub struct GestureClassifier {
    config: GestureConfig,
    state: GestureState,
    prev: Option<MotionSample>,
}

impl GestureClassifier {
    /// Create a new classifier with given thresholds.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
            prev: None,
        }
    }

    /// Update thresholds.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Feed one sample.
    ///
    /// The first sample after construction or `reset` only primes the
    /// derivative and never emits.
    pub fn push(&mut self, sample: MotionSample) -> Option<Gesture> {
        let out = match self.prev {
            Some(prev) => {
                let (state, out) = classify_motion(self.state, &prev, &sample, &self.config);
                self.state = state;
                out
            }
            None => None,
        };
        self.prev = Some(sample);
        out
    }

    /// Forget history (e.g. when leaving collecting mode).
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(ax: f32, ay: f32) -> MotionSample {
        MotionSample::planar(ax, ay)
    }

    #[test]
    fn test_quiet_stays_idle() {
        let cfg = GestureConfig::DEFAULT;
        let (state, out) = classify_motion(GestureState::Idle, &s(0.0, 0.0), &s(0.1, 0.1), &cfg);
        assert_eq!(state, GestureState::Idle);
        assert_eq!(out, None);
    }

    #[test]
    fn test_dot_axis_fires_dot() {
        let cfg = GestureConfig::DEFAULT;
        let (state, out) = classify_motion(GestureState::Idle, &s(0.0, 0.0), &s(0.0, 1.0), &cfg);
        assert_eq!(state, GestureState::DotInProgress);
        assert_eq!(out, Some(Gesture::Dot));
    }

    #[test]
    fn test_dash_axis_fires_dash() {
        let cfg = GestureConfig::DEFAULT;
        let (state, out) = classify_motion(GestureState::Idle, &s(0.0, 0.0), &s(-1.0, 0.0), &cfg);
        assert_eq!(state, GestureState::DashInProgress);
        assert_eq!(out, Some(Gesture::Dash));
    }

    #[test]
    fn test_dot_wins_tie() {
        let cfg = GestureConfig::DEFAULT;
        let (_, out) = classify_motion(GestureState::Idle, &s(0.0, 0.0), &s(1.0, 1.0), &cfg);
        assert_eq!(out, Some(Gesture::Dot));
    }

    #[test]
    fn test_between_release_and_trigger_holds() {
        let cfg = GestureConfig::DEFAULT;
        let (state, out) =
            classify_motion(GestureState::DotInProgress, &s(0.0, 0.0), &s(0.0, 0.4), &cfg);
        assert_eq!(state, GestureState::DotInProgress);
        assert_eq!(out, None);
    }

    #[test]
    fn test_first_sample_only_primes() {
        let mut c = GestureClassifier::new(GestureConfig::DEFAULT);
        assert_eq!(c.push(s(5.0, 5.0)), None);
        assert_eq!(c.state(), GestureState::Idle);
    }
}
