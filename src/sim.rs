//! Host simulator.
//!
//! Runs the same task set as the board. Bytes read from stdin are the
//! host link; replies go to stdout. LED, display and buzzer activity plus
//! the diagnostic log go to stderr. There is no IMU and no buttons, so
//! the device only ever plays back what it receives.
//!
//! ```text
//! $ printf 'SOS\n' | cargo run
//! OK
//! ```

use std::io::{self, Read, Write};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use morse_gesture_link::hal::{HalError, MotionSample, MotionSensor, Panel};
use morse_gesture_link::link::LinkError;
use morse_gesture_link::{LinkFramer, LinkTx, Mode, Surface, DEVICE, VERSION};

use crate::tasks;

const STARTUP_SETTLE_MS: u32 = 300;

static BOOT: OnceLock<Instant> = OnceLock::new();

fn now_ms() -> u64 {
    BOOT.get_or_init(Instant::now).elapsed().as_millis() as u64
}

/// `thread::sleep` behind the HAL delay trait.
#[derive(Clone, Copy)]
struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Panel that narrates to stderr.
struct ConsolePanel;

impl Panel for ConsolePanel {
    fn set_indicator(&mut self, on: bool) {
        eprintln!("[led] {}", if on { "on" } else { "off" });
    }

    fn clear_surface(&mut self) {}

    fn write_glyph(&mut self, text: &str) {
        eprintln!("[display] {}", text);
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        eprintln!("[buzzer] {} Hz {} ms", frequency_hz, duration_ms);
        thread::sleep(Duration::from_millis(duration_ms as u64));
    }
}

/// Stdout as the outbound link.
struct StdoutLink;

impl LinkTx for StdoutLink {
    fn is_connected(&self) -> bool {
        true
    }

    fn write(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut out = io::stdout().lock();
        out.write_all(bytes)
            .and_then(|_| out.flush())
            .map_err(|_| LinkError::Incomplete)
    }
}

/// No sensor on a host.
struct NoSensor;

impl MotionSensor for NoSensor {
    fn init_motion(&mut self) -> Result<(), HalError> {
        Err(HalError::SensorNotReady)
    }

    fn read_motion(&mut self) -> Result<MotionSample, HalError> {
        Err(HalError::SensorNotReady)
    }
}

/// Stderr sink for the log drain.
struct Stderr;

impl core::fmt::Write for Stderr {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        eprint!("{}", s);
        Ok(())
    }
}

/// Run until stdin closes and the last message has played out.
pub fn run() -> io::Result<()> {
    now_ms();
    SleepDelay.delay_ms(STARTUP_SETTLE_MS);
    morse_gesture_link::diag_info!(DEVICE.log, now_ms(), "{} (simulator)", VERSION);

    // No heartbeat noise on stdout
    DEVICE
        .config
        .heartbeat_ms
        .store(0, std::sync::atomic::Ordering::Relaxed);

    let surface: &'static Surface<ConsolePanel> = Box::leak(Box::new(Surface::new(ConsolePanel)));
    let link: &'static StdoutLink = &StdoutLink;

    thread::Builder::new()
        .name("output".into())
        .spawn(move || tasks::output_task(&DEVICE, surface, link, SleepDelay, now_ms))?;
    thread::Builder::new()
        .name("motion".into())
        .spawn(move || tasks::motion_task(&DEVICE, NoSensor, surface, link, SleepDelay, now_ms))?;
    thread::Builder::new()
        .name("status".into())
        .spawn(move || tasks::status_task(&DEVICE, surface, link, SleepDelay, now_ms))?;
    thread::Builder::new()
        .name("log".into())
        .spawn(move || tasks::log_task(&DEVICE, Stderr, SleepDelay, now_ms))?;

    let mut framer = LinkFramer::new();
    let mut stdin = io::stdin().lock();
    let mut buf = [0u8; 64];
    loop {
        let n = stdin.read(&mut buf)?;
        if n == 0 {
            break;
        }
        framer.receive(&buf[..n], now_ms(), &DEVICE, link);
    }

    while DEVICE.mode.read() != Mode::Waiting || DEVICE.pending.is_pending() {
        thread::sleep(Duration::from_millis(50));
    }
    // Let the log drain catch up
    thread::sleep(Duration::from_millis(100));
    Ok(())
}
