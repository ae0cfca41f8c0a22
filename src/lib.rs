//! # MorseGestureLink
//!
//! Button and gesture Morse appliance with a serial host link.
//!
//! ## Architecture
//!
//! All coordination flows through [`DeviceState`]. Components are isolated:
//! - Input sources (button ISR, link framer, motion sampler) write the mode
//! - The output coordinator reads it, renders, and moves it forward
//! - No callbacks, no mutexes; every shared cell is an atomic
//!
//! The shared LED/display/buzzer is reached only through a
//! [`SurfaceLease`], released on drop.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod device;
pub mod fault;
pub mod gesture;
pub mod hal;
pub mod input;
pub mod link;
pub mod log_drain;
pub mod logging;
pub mod melody;
pub mod mode;
pub mod morse;
pub mod output;
pub mod status;
pub mod surface;

pub use device::{DeviceState, DEVICE, MESSAGE_CAPACITY};
pub use fault::{FaultCode, FaultState};
pub use gesture::{Gesture, GestureClassifier};
pub use input::{on_button_edge, Button, MotionSampler};
pub use link::{LinkFramer, LinkTx};
pub use mode::{Event, Mode, ModeRegister};
pub use output::OutputCoordinator;
pub use surface::{Surface, SurfaceLease};

/// Build version string with git hash.
pub const VERSION: &str = env!("VERSION_STRING");
