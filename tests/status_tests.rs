//! Idle indicator tests

mod common;

use common::{PanelEvent, RecordingPanel};
use morse_gesture_link::hal::Panel;
use morse_gesture_link::status::{CounterDisplay, StatusBlinker};
use morse_gesture_link::{DeviceState, Mode, Surface};

#[test]
fn test_blinker_toggles_on_period() {
    let device = DeviceState::new();
    let surface = Surface::new(RecordingPanel::default());
    let mut blinker = StatusBlinker::new();

    assert_eq!(blinker.tick(0, &device, &surface), Some(true));
    assert_eq!(blinker.tick(100, &device, &surface), None);
    assert_eq!(blinker.tick(499, &device, &surface), None);
    assert_eq!(blinker.tick(500, &device, &surface), Some(false));
    assert_eq!(blinker.tick(1000, &device, &surface), Some(true));

    assert_eq!(surface.into_inner().indicator_writes(), [true, false, true]);
}

#[test]
fn test_blinker_quiet_outside_waiting() {
    let device = DeviceState::new();
    let surface = Surface::new(RecordingPanel::default());
    let mut blinker = StatusBlinker::new();

    for mode in [Mode::Collecting, Mode::MessageReceived, Mode::Sent] {
        device.mode.write(mode);
        assert_eq!(blinker.tick(0, &device, &surface), None);
    }
    assert!(surface.into_inner().events.is_empty());
}

#[test]
fn test_indicators_yield_to_lease_holder() {
    let device = DeviceState::new();
    let surface = Surface::new(RecordingPanel::default());
    let mut blinker = StatusBlinker::new();
    let mut counter = CounterDisplay::new();

    let lease = surface.try_lease();
    assert_eq!(blinker.tick(0, &device, &surface), None);
    assert_eq!(counter.tick(0, &device, &surface), None);
    drop(lease);

    // Skipped ticks are not lost, they run on the next free poll
    assert_eq!(blinker.tick(10, &device, &surface), Some(true));
    assert_eq!(counter.tick(10, &device, &surface), Some(0));
}

#[test]
fn test_counter_increments() {
    let device = DeviceState::new();
    let surface = Surface::new(RecordingPanel::default());
    let mut counter = CounterDisplay::new();

    assert_eq!(counter.tick(0, &device, &surface), Some(0));
    assert_eq!(counter.tick(200, &device, &surface), None);
    assert_eq!(counter.tick(500, &device, &surface), Some(1));
    assert_eq!(counter.tick(1000, &device, &surface), Some(2));

    let panel = surface.into_inner();
    assert_eq!(panel.glyphs(), ["0", "1", "2"]);
    assert_eq!(panel.events[0], PanelEvent::Clear);
}

#[test]
fn test_period_follows_config() {
    let device = DeviceState::new();
    device
        .config
        .status_ms
        .store(100, std::sync::atomic::Ordering::Relaxed);
    let surface = Surface::new(RecordingPanel::default());
    let mut counter = CounterDisplay::new();

    assert_eq!(counter.tick(0, &device, &surface), Some(0));
    assert_eq!(counter.tick(100, &device, &surface), Some(1));
}

#[test]
fn test_blinker_turns_led_off_when_leaving_waiting() {
    let device = DeviceState::new();
    let surface = Surface::new(RecordingPanel::default());
    let mut blinker = StatusBlinker::new();

    assert_eq!(blinker.tick(0, &device, &surface), Some(true));

    device.mode.write(Mode::Collecting);
    assert_eq!(blinker.tick(100, &device, &surface), Some(false));
    assert_eq!(blinker.tick(200, &device, &surface), None);

    assert_eq!(surface.into_inner().indicator_writes(), [true, false]);
}

#[test]
fn test_blinker_resyncs_after_render() {
    let device = DeviceState::new();
    let surface = Surface::new(RecordingPanel::default());
    let mut blinker = StatusBlinker::new();

    assert_eq!(blinker.tick(0, &device, &surface), Some(true));

    // Render holds the surface and leaves the LED off
    device.mode.write(Mode::MessageReceived);
    {
        let mut lease = surface.try_lease().unwrap();
        assert_eq!(blinker.tick(100, &device, &surface), None);
        lease.set_indicator(false);
    }

    device.mode.write(Mode::Waiting);
    assert_eq!(blinker.tick(500, &device, &surface), Some(true));

    assert_eq!(surface.into_inner().indicator_writes(), [true, false, true]);
}
