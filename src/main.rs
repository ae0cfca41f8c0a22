//! MorseGestureLink - firmware entry point
//!
//! On the board this wires ESP-IDF peripherals into the core and starts
//! the task set. On a host build the same tasks run against a console
//! simulator: stdin is the host link, panel activity goes to stderr.

mod tasks;

#[cfg(target_os = "espidf")]
mod board;

#[cfg(not(target_os = "espidf"))]
mod sim;

fn main() {
    #[cfg(target_os = "espidf")]
    if let Err(e) = board::run() {
        println!("boot failed: {}", e);
    }

    #[cfg(not(target_os = "espidf"))]
    if let Err(e) = sim::run() {
        eprintln!("simulator failed: {}", e);
        std::process::exit(1);
    }
}
