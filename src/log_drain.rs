//! Diagnostic log drain.
//!
//! Empties the device log ring into a blocking text sink (USB-serial
//! console on the board, stderr in the simulator). Runs in the lowest
//! priority task; nothing upstream ever waits on it.
//!
//! # Output
//!
//! ```text
//! [     12345] INFO: mode WAITING -> COLLECTING
//! [     12400] WARN: dropped 3 log messages
//! ```

use core::fmt::Write;

use crate::device::DeviceState;
use crate::logging::LogEntry;

/// How often dropped-message and anomaly summaries are emitted.
pub const REPORT_PERIOD_MS: u64 = 10_000;

/// Format log entry as `[timestamp_ms] LEVEL: message\n`.
pub fn format_log_entry<W: Write>(entry: &LogEntry, out: &mut W) -> core::fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}",
        entry.timestamp_ms,
        entry.level.as_str(),
        entry.text()
    )
}

/// Drain state.
pub struct LogDrain {
    last_report_ms: u64,
}

impl LogDrain {
    pub const fn new() -> Self {
        Self { last_report_ms: 0 }
    }

    /// Write every pending entry to `out`, plus a periodic summary of
    /// dropped messages and the last anomaly.
    ///
    /// Returns the number of entries written.
    pub fn drain<W: Write>(&mut self, now_ms: u64, device: &DeviceState, out: &mut W) -> usize {
        let mut written = 0;

        while let Some(entry) = device.log.drain() {
            let _ = format_log_entry(&entry, out);
            written += 1;
        }

        if now_ms.saturating_sub(self.last_report_ms) >= REPORT_PERIOD_MS {
            let dropped = device.log.dropped();
            if dropped > 0 {
                let _ = writeln!(out, "[{:10}] WARN: dropped {} log messages", now_ms, dropped);
                device.log.reset_dropped();
            }

            if let Some(fault) = device.faults.take() {
                let _ = writeln!(
                    out,
                    "[{:10}] WARN: last anomaly {} ({}), {} since boot",
                    now_ms,
                    fault.code.as_str(),
                    fault.data,
                    fault.count
                );
            }

            self.last_report_ms = now_ms;
        }

        written
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultCode;
    use crate::logging::{LogLevel, MAX_MSG_LEN};

    #[test]
    fn test_format_log_entry() {
        let entry = LogEntry {
            timestamp_ms: 1234567,
            level: LogLevel::Info,
            len: 11,
            msg: {
                let mut msg = [0u8; MAX_MSG_LEN];
                msg[..11].copy_from_slice(b"Hello world");
                msg
            },
        };

        let mut out = String::new();
        format_log_entry(&entry, &mut out).unwrap();

        assert!(out.contains("1234567"));
        assert!(out.contains("INFO"));
        assert!(out.contains("Hello world"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_format_truncated_message() {
        let entry = LogEntry {
            timestamp_ms: 999,
            level: LogLevel::Error,
            len: 5,
            msg: {
                let mut msg = [0u8; MAX_MSG_LEN];
                msg[..10].copy_from_slice(b"TEST12345X"); // Only first 5 used
                msg
            },
        };

        let mut out = String::new();
        format_log_entry(&entry, &mut out).unwrap();

        assert!(out.contains("ERROR"));
        assert!(out.contains("TEST1"));
        assert!(!out.contains('X'));
    }

    #[test]
    fn test_drain_reports_anomaly() {
        let device = DeviceState::new();
        device.log.push(5, LogLevel::Info, b"hello");
        device.faults.record(FaultCode::InputOverflow, 17);

        let mut drain = LogDrain::new();
        let mut out = String::new();
        assert_eq!(drain.drain(REPORT_PERIOD_MS, &device, &mut out), 1);

        assert!(out.contains("hello"));
        assert!(out.contains("input overflow (17)"));
        assert!(!device.faults.is_active());
    }
}
