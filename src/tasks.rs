//! Task loops shared by the board and the simulator.
//!
//! Each loop is a fixed-cadence poller over the core. Thread creation and
//! stack sizes belong to the caller.

use std::sync::atomic::Ordering;

use embedded_hal::delay::DelayNs;

use morse_gesture_link::hal::{MotionSensor, Panel};
use morse_gesture_link::link::Heartbeat;
use morse_gesture_link::log_drain::LogDrain;
use morse_gesture_link::status::{CounterDisplay, StatusBlinker};
use morse_gesture_link::{DeviceState, LinkTx, MotionSampler, OutputCoordinator, Surface};

/// Millisecond clock since boot.
pub type Clock = fn() -> u64;

/// Polls the mode register and renders.
pub fn output_task<P, L, D>(
    device: &'static DeviceState,
    surface: &'static Surface<P>,
    link: &'static L,
    mut delay: D,
    clock: Clock,
) -> !
where
    P: Panel,
    L: LinkTx,
    D: DelayNs,
{
    let mut coordinator = OutputCoordinator::new(device);
    loop {
        coordinator.poll(clock(), surface, link, &mut delay);
        delay.delay_ms(device.config.poll_ms.load(Ordering::Relaxed));
    }
}

/// Samples the IMU while collecting.
pub fn motion_task<S, P, L, D>(
    device: &'static DeviceState,
    mut sensor: S,
    surface: &'static Surface<P>,
    link: &'static L,
    mut delay: D,
    clock: Clock,
) -> !
where
    S: MotionSensor,
    P: Panel,
    L: LinkTx,
    D: DelayNs,
{
    let mut sampler = MotionSampler::new(device);
    loop {
        sampler.tick(clock(), device, &mut sensor, surface, link);
        delay.delay_ms(device.config.sample_ms.load(Ordering::Relaxed));
    }
}

/// Idle indicators plus the link heartbeat.
pub fn status_task<P, L, D>(
    device: &'static DeviceState,
    surface: &'static Surface<P>,
    link: &'static L,
    mut delay: D,
    clock: Clock,
) -> !
where
    P: Panel,
    L: LinkTx,
    D: DelayNs,
{
    let mut blinker = StatusBlinker::new();
    let mut counter = CounterDisplay::new();
    let mut heartbeat = Heartbeat::new();
    loop {
        let now = clock();
        blinker.tick(now, device, surface);
        counter.tick(now, device, surface);
        heartbeat.poll(now, device, link);
        delay.delay_ms(device.config.poll_ms.load(Ordering::Relaxed));
    }
}

/// Drains diagnostics into a text sink.
pub fn log_task<W, D>(device: &'static DeviceState, mut out: W, mut delay: D, clock: Clock) -> !
where
    W: core::fmt::Write,
    D: DelayNs,
{
    let mut drain = LogDrain::new();
    loop {
        if drain.drain(clock(), device, &mut out) == 0 {
            delay.delay_ms(10);
        }
    }
}
