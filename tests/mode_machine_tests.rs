//! Mode machine tests

use std::sync::Arc;
use std::thread;

use morse_gesture_link::mode::{ALL_EVENTS, ALL_MODES};
use morse_gesture_link::{Event, Mode, ModeRegister};

#[test]
fn test_next_is_total() {
    for mode in ALL_MODES {
        for event in ALL_EVENTS {
            let next = mode.next(event);
            assert!(ALL_MODES.contains(&next), "{:?} + {:?}", mode, event);
        }
    }
}

#[test]
fn test_button_cycle() {
    assert_eq!(Mode::Waiting.next(Event::ButtonPress), Mode::Collecting);
    assert_eq!(Mode::Collecting.next(Event::ButtonPress), Mode::Sent);
    assert_eq!(Mode::Sent.next(Event::ButtonPress), Mode::Waiting);
}

#[test]
fn test_button_aborts_playback() {
    for mode in [Mode::MessageReceived, Mode::ReadyToPrint, Mode::Printed] {
        assert_eq!(mode.next(Event::ButtonPress), Mode::Waiting);
    }
}

#[test]
fn test_line_received_always_wins() {
    for mode in ALL_MODES {
        assert_eq!(mode.next(Event::LineReceived), Mode::MessageReceived);
    }
}

#[test]
fn test_playback_path() {
    let mut mode = Mode::MessageReceived;
    mode = mode.next(Event::Rendered);
    assert_eq!(mode, Mode::ReadyToPrint);
    mode = mode.next(Event::Printed);
    assert_eq!(mode, Mode::Printed);
    mode = mode.next(Event::CooldownElapsed);
    assert_eq!(mode, Mode::Waiting);

    assert_eq!(Mode::Sent.next(Event::CooldownElapsed), Mode::Waiting);
}

#[test]
fn test_out_of_place_events_reset() {
    assert_eq!(Mode::Collecting.next(Event::Rendered), Mode::Waiting);
    assert_eq!(Mode::Waiting.next(Event::Printed), Mode::Waiting);
    assert_eq!(Mode::ReadyToPrint.next(Event::CooldownElapsed), Mode::Waiting);
}

#[test]
fn test_raw_decoding() {
    for mode in ALL_MODES {
        let raw: u8 = mode.into();
        assert_eq!(Mode::try_from_u8(raw), Some(mode));
        assert_eq!(Mode::from(raw), mode);
    }
    assert_eq!(Mode::try_from_u8(6), None);
    assert_eq!(Mode::from_u8(0xFF), Mode::Waiting);
}

#[test]
fn test_display_names() {
    assert_eq!(format!("{}", Mode::Waiting), "WAITING");
    assert_eq!(format!("{}", Mode::MessageReceived), "RECEIVED");
    assert_eq!(Mode::Sent.as_str(), "SENT");
}

#[test]
fn test_register_apply_reports_both_sides() {
    let reg = ModeRegister::new();
    assert_eq!(reg.read(), Mode::Waiting);

    assert_eq!(reg.apply(Event::ButtonPress), (Mode::Waiting, Mode::Collecting));
    assert_eq!(reg.apply(Event::LineReceived), (Mode::Collecting, Mode::MessageReceived));
    assert_eq!(reg.read(), Mode::MessageReceived);
}

#[test]
fn test_advance_refuses_stale_mode() {
    let reg = ModeRegister::new();
    reg.write(Mode::MessageReceived);

    // Button abort lands first
    reg.apply(Event::ButtonPress);
    assert_eq!(reg.advance(Mode::MessageReceived, Event::Rendered), Err(Mode::Waiting));
    assert_eq!(reg.read(), Mode::Waiting);
}

#[test]
fn test_advance_moves_forward() {
    let reg = ModeRegister::new();
    reg.write(Mode::ReadyToPrint);
    assert_eq!(reg.advance(Mode::ReadyToPrint, Event::Printed), Ok(Mode::Printed));
    assert_eq!(reg.read(), Mode::Printed);
}

#[test]
fn test_concurrent_writers_never_corrupt() {
    let reg = Arc::new(ModeRegister::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                for n in 0..1000 {
                    match (i + n) % 3 {
                        0 => {
                            reg.apply(Event::ButtonPress);
                        }
                        1 => {
                            reg.apply(Event::LineReceived);
                        }
                        _ => {
                            let _ = reg.advance(Mode::MessageReceived, Event::Rendered);
                        }
                    }
                    assert!(Mode::try_from_u8(reg.read_raw()).is_some());
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert!(ALL_MODES.contains(&reg.read()));
}
