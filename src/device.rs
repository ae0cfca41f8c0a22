//! Shared device state.
//!
//! Every cross-task cell lives here, each one a lock-free atomic
//! structure. Tasks and the button ISR hold `&DeviceState`; nothing in
//! here is ever locked.

use crate::config::DeviceConfig;
use crate::fault::FaultState;
use crate::input::SecondaryAction;
use crate::link::PendingMessage;
use crate::logging::LogStream;
use crate::mode::ModeRegister;

/// Inbound line buffer capacity (payload is one byte less).
pub const MESSAGE_CAPACITY: usize = 256;

/// Cells shared between the ISR and the tasks.
pub struct DeviceState {
    /// Current operating mode.
    pub mode: ModeRegister,
    /// Last complete line from the host, plus its "new" flag.
    pub pending: PendingMessage<MESSAGE_CAPACITY>,
    /// Word-space request from the secondary button.
    pub secondary: SecondaryAction,
    /// Anomaly record.
    pub faults: FaultState,
    /// Diagnostic log ring.
    pub log: LogStream,
    /// Tunables.
    pub config: DeviceConfig,
}

impl DeviceState {
    pub const fn new() -> Self {
        Self {
            mode: ModeRegister::new(),
            pending: PendingMessage::new(),
            secondary: SecondaryAction::new(),
            faults: FaultState::new(),
            log: LogStream::new(),
            config: DeviceConfig::new(),
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

/// The device singleton used by the firmware and its ISR.
pub static DEVICE: DeviceState = DeviceState::new();
