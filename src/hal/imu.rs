//! Inertial sensor primitive.

use super::HalError;

/// One reading from the accelerometer/gyroscope.
///
/// Acceleration in g, angular rate in deg/s, temperature in °C.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    pub gx: f32,
    pub gy: f32,
    pub gz: f32,
    pub temperature: f32,
}

impl MotionSample {
    /// Sample with only the two classifier axes set.
    pub const fn planar(ax: f32, ay: f32) -> Self {
        Self {
            ax,
            ay,
            az: 0.0,
            gx: 0.0,
            gy: 0.0,
            gz: 0.0,
            temperature: 0.0,
        }
    }
}

/// Accelerometer/gyroscope source.
pub trait MotionSensor {
    /// Bring the sensor up. Called again after a backoff if it fails.
    fn init_motion(&mut self) -> Result<(), HalError>;

    /// Read all seven channels.
    fn read_motion(&mut self) -> Result<MotionSample, HalError>;
}
