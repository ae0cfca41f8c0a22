//! ESP32-S3 board wiring.
//!
//! Pin map:
//! - GPIO0  primary button (active low, falling-edge interrupt)
//! - GPIO14 secondary button (active low, falling-edge interrupt)
//! - GPIO2  status LED
//! - GPIO17 buzzer (LEDC timer 0, channel 0)
//! - GPIO8/9 I2C SDA/SCL to the ICM-42670
//! - GPIO4/5 UART1 TX/RX host link, 115200 8N1
//!
//! The text display is mirrored to the USB console.

use std::sync::Mutex;
use std::thread;

use esp_idf_svc::hal::delay::{FreeRtos, NON_BLOCK};
use esp_idf_svc::hal::gpio::{AnyIOPin, Gpio2, InterruptType, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::config::Config as UartConfig;
use esp_idf_svc::hal::uart::{UartDriver, UartRxDriver, UartTxDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{self as esp_idf_sys, EspError};

use morse_gesture_link::hal::{Icm42670, Icm42670Config, Panel};
use morse_gesture_link::link::LinkError;
use morse_gesture_link::{on_button_edge, Button, LinkFramer, LinkTx, Surface, DEVICE, VERSION};

use crate::tasks;

const TASK_STACK: usize = 8 * 1024;
const STARTUP_SETTLE_MS: u32 = 300;
const BUTTON_REARM_MS: u32 = 20;

/// Boot failure.
#[derive(Debug)]
pub enum BootError {
    /// Peripheral driver setup failed
    Driver(EspError),
    /// Task could not be created
    Spawn(std::io::Error),
}

impl From<EspError> for BootError {
    fn from(e: EspError) -> Self {
        Self::Driver(e)
    }
}

impl From<std::io::Error> for BootError {
    fn from(e: std::io::Error) -> Self {
        Self::Spawn(e)
    }
}

impl core::fmt::Display for BootError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "driver: {}", e),
            Self::Spawn(e) => write!(f, "spawn: {}", e),
        }
    }
}

fn now_ms() -> u64 {
    // SAFETY: plain read of the system timer, ISR-safe.
    (unsafe { esp_idf_sys::esp_timer_get_time() } / 1000) as u64
}

/// LED, buzzer and console-mirrored display.
struct BoardPanel {
    led: PinDriver<'static, Gpio2, Output>,
    buzzer: LedcDriver<'static>,
}

impl Panel for BoardPanel {
    fn set_indicator(&mut self, on: bool) {
        let _ = if on {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
    }

    fn clear_surface(&mut self) {
        println!("[display] --");
    }

    fn write_glyph(&mut self, text: &str) {
        println!("[display] {}", text);
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        if frequency_hz == 0 {
            FreeRtos::delay_ms(duration_ms);
            return;
        }

        // SAFETY: timer 0 is configured and owned by this driver.
        unsafe {
            esp_idf_sys::ledc_set_freq(
                esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
                esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
                frequency_hz,
            );
        }
        let half = self.buzzer.get_max_duty() / 2;
        let _ = self.buzzer.set_duty(half);
        FreeRtos::delay_ms(duration_ms);
        let _ = self.buzzer.set_duty(0);
    }
}

/// UART host link. UART has no presence detect, so it always reports
/// connected; write failures still surface as `LinkDown`.
struct BoardLink {
    tx: Mutex<UartTxDriver<'static>>,
}

impl LinkTx for BoardLink {
    fn is_connected(&self) -> bool {
        true
    }

    fn write(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut tx = self.tx.lock().map_err(|_| LinkError::NotConnected)?;
        let mut rest = bytes;
        while !rest.is_empty() {
            match tx.write(rest) {
                Ok(n) if n > 0 => rest = &rest[n..],
                _ => return Err(LinkError::Incomplete),
            }
        }
        Ok(())
    }
}

/// USB console sink for the log drain.
struct Console;

impl core::fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        print!("{}", s);
        Ok(())
    }
}

fn link_rx_task(mut rx: UartRxDriver<'static>, link: &'static BoardLink) -> ! {
    let mut framer = LinkFramer::new();
    let mut buf = [0u8; 64];
    loop {
        match rx.read(&mut buf, NON_BLOCK) {
            Ok(n) if n > 0 => {
                framer.receive(&buf[..n], now_ms(), &DEVICE, link);
            }
            _ => FreeRtos::delay_ms(10),
        }
    }
}

/// Bring up the board and start every task. Only returns on failure.
pub fn run() -> Result<(), BootError> {
    esp_idf_sys::link_patches();
    FreeRtos::delay_ms(STARTUP_SETTLE_MS);
    morse_gesture_link::diag_info!(DEVICE.log, now_ms(), "{}", VERSION);

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // Feedback surface
    let led = PinDriver::output(pins.gpio2)?;
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default().frequency(Hertz(700)),
    )?;
    let mut buzzer = LedcDriver::new(peripherals.ledc.channel0, timer, pins.gpio17)?;
    buzzer.set_duty(0)?;
    let surface: &'static Surface<BoardPanel> =
        Box::leak(Box::new(Surface::new(BoardPanel { led, buzzer })));

    // Host link
    let uart = UartDriver::new(
        peripherals.uart1,
        pins.gpio4,
        pins.gpio5,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(115_200)),
    )?;
    let (tx, rx) = uart.into_split();
    let link: &'static BoardLink = Box::leak(Box::new(BoardLink { tx: Mutex::new(tx) }));

    // Motion sensor
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio8,
        pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(400_000)),
    )?;
    let imu = Icm42670::new(i2c, FreeRtos, Icm42670Config::default());

    // Buttons
    let mut primary = PinDriver::input(pins.gpio0)?;
    primary.set_pull(Pull::Up)?;
    primary.set_interrupt_type(InterruptType::NegEdge)?;
    let mut secondary = PinDriver::input(pins.gpio14)?;
    secondary.set_pull(Pull::Up)?;
    secondary.set_interrupt_type(InterruptType::NegEdge)?;

    // SAFETY: the callbacks only touch atomics in DEVICE.
    unsafe {
        primary.subscribe(|| {
            on_button_edge(&DEVICE, Button::Primary, now_ms());
        })?;
        secondary.subscribe(|| {
            on_button_edge(&DEVICE, Button::Secondary, now_ms());
        })?;
    }

    thread::Builder::new()
        .name("output".into())
        .stack_size(TASK_STACK)
        .spawn(move || tasks::output_task(&DEVICE, surface, link, FreeRtos, now_ms))?;
    thread::Builder::new()
        .name("motion".into())
        .stack_size(TASK_STACK)
        .spawn(move || tasks::motion_task(&DEVICE, imu, surface, link, FreeRtos, now_ms))?;
    thread::Builder::new()
        .name("link-rx".into())
        .stack_size(TASK_STACK)
        .spawn(move || link_rx_task(rx, link))?;
    thread::Builder::new()
        .name("status".into())
        .stack_size(TASK_STACK)
        .spawn(move || tasks::status_task(&DEVICE, surface, link, FreeRtos, now_ms))?;
    thread::Builder::new()
        .name("log".into())
        .stack_size(TASK_STACK)
        .spawn(move || tasks::log_task(&DEVICE, Console, FreeRtos, now_ms))?;

    // The GPIO driver disarms after each edge; re-arming on a slow cadence
    // doubles as debounce.
    loop {
        primary.enable_interrupt()?;
        secondary.enable_interrupt()?;
        FreeRtos::delay_ms(BUTTON_REARM_MS);
    }
}
