//! Anomaly bookkeeping for MorseGestureLink.
//!
//! Nothing here stops the device. Every anomaly degrades to skipping the
//! current cycle or falling back to `Waiting`; this module only remembers
//! what happened so the diagnostic channel can report it.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Anomaly codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Inbound line longer than the assembly buffer.
    /// Data is the number of bytes dropped.
    InputOverflow = 1,

    /// A handler saw a mode it does not expect and reset to `Waiting`.
    /// Data is the raw mode value.
    UnknownMode = 2,

    /// Motion sensor failed to init or read.
    SensorUnavailable = 3,

    /// Write skipped because the host link is down.
    LinkDown = 4,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::InputOverflow,
            2 => FaultCode::UnknownMode,
            3 => FaultCode::SensorUnavailable,
            4 => FaultCode::LinkDown,
            _ => FaultCode::None,
        }
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "none",
            FaultCode::InputOverflow => "input overflow",
            FaultCode::UnknownMode => "unknown mode",
            FaultCode::SensorUnavailable => "sensor unavailable",
            FaultCode::LinkDown => "link down",
        }
    }
}

/// Last anomaly plus a running count.
///
/// Written from any task or the ISR, read by the diagnostic drain.
pub struct FaultState {
    /// True until acknowledged by the drain.
    active: AtomicBool,

    /// Code of the last anomaly.
    code: AtomicU8,

    /// Additional data (meaning depends on code).
    data: AtomicU32,

    /// Total anomaly count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record an anomaly.
    #[inline]
    pub fn record(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Check if an unacknowledged anomaly exists.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Code of the last anomaly.
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Data of the last anomaly.
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Total anomaly count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Acknowledge the last anomaly. The counter is kept.
    #[inline]
    pub fn acknowledge(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Take the last anomaly if one is unacknowledged.
    pub fn take(&self) -> Option<FaultSnapshot> {
        if self.active.swap(false, Ordering::AcqRel) {
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Get a snapshot of the current state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_state_basic() {
        let fault = FaultState::new();

        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);
        assert_eq!(fault.count(), 0);

        fault.record(FaultCode::InputOverflow, 42);

        assert!(fault.is_active());
        assert_eq!(fault.code(), FaultCode::InputOverflow);
        assert_eq!(fault.data(), 42);
        assert_eq!(fault.count(), 1);

        fault.acknowledge();

        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1); // Count preserved
    }

    #[test]
    fn test_take_acknowledges() {
        let fault = FaultState::new();
        fault.record(FaultCode::SensorUnavailable, 0);

        let snap = fault.take().unwrap();
        assert_eq!(snap.code, FaultCode::SensorUnavailable);
        assert!(fault.take().is_none());
    }

    #[test]
    fn test_fault_count_accumulates() {
        let fault = FaultState::new();

        fault.record(FaultCode::LinkDown, 1);
        fault.acknowledge();
        fault.record(FaultCode::UnknownMode, 2);
        fault.acknowledge();
        fault.record(FaultCode::LinkDown, 3);

        assert_eq!(fault.count(), 3);
    }
}
