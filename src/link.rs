//! Module: link
//!
//! Purpose: Line framing over the host serial link.
//!
//! Architecture:
//! - `LineAssembler`: fixed buffer, keeps at most `N - 1` payload bytes
//! - `PendingMessage`: single-slot mailbox, seqlock over atomic bytes
//! - `LinkFramer`: per-byte framing, `OK\n` per line, heartbeat
//! - `LinkTx`: best-effort transport, writes skipped while disconnected
//!
//! Ordering: message bytes → pending flag → mode, each a Release store.
//! Anyone who observes `MessageReceived` sees a valid flag and message.
//!
//! Safety: Lock-free. The mailbox has one writer (link task) and one
//! reader (output coordinator).

use core::fmt::Write;
use core::sync::atomic::{fence, AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};

use crate::device::{DeviceState, MESSAGE_CAPACITY};
use crate::fault::FaultCode;
use crate::logging::BufWriter;
use crate::mode::{Event, Mode};

/// Line terminator.
pub const TERMINATOR: u8 = b'\n';
/// Reply to every completed line.
pub const ACK: &[u8] = b"OK\n";
/// End-of-transmission marker.
pub const SENTINEL: &[u8] = b"  \n";

/// Transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Host not attached.
    NotConnected,
    /// Transport accepted fewer bytes than offered.
    Incomplete,
}

impl LinkError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotConnected => "not connected",
            Self::Incomplete => "incomplete write",
        }
    }
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outbound side of the host link.
///
/// Shared by several tasks, hence `&self`.
pub trait LinkTx {
    /// True when a host is attached.
    fn is_connected(&self) -> bool;

    /// Write raw bytes, unbuffered.
    fn write(&self, bytes: &[u8]) -> Result<(), LinkError>;
}

impl<T: LinkTx + ?Sized> LinkTx for &T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn write(&self, bytes: &[u8]) -> Result<(), LinkError> {
        (**self).write(bytes)
    }
}

/// Best-effort send.
///
/// A disconnected link is skipped without retry; the skip is only counted.
pub fn send(link: &impl LinkTx, bytes: &[u8], device: &DeviceState) -> bool {
    if !link.is_connected() {
        device.faults.record(FaultCode::LinkDown, bytes.len() as u32);
        return false;
    }
    match link.write(bytes) {
        Ok(()) => true,
        Err(_) => {
            device.faults.record(FaultCode::LinkDown, bytes.len() as u32);
            false
        }
    }
}

/// Result of pushing one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Byte appended.
    Stored,
    /// Buffer full, byte discarded.
    Dropped,
    /// Terminator seen; `line()` holds the frame until `clear()`.
    Line,
}

/// Fixed-capacity line buffer.
///
/// Holds at most `N - 1` bytes. Excess bytes before the terminator are
/// dropped; the buffer never grows.
pub struct LineAssembler<const N: usize> {
    buf: [u8; N],
    len: usize,
    dropped: usize,
}

impl<const N: usize> LineAssembler<N> {
    /// Payload bytes kept per line.
    pub const LIMIT: usize = N - 1;

    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
            dropped: 0,
        }
    }

    /// Push one byte.
    pub fn push(&mut self, byte: u8) -> Push {
        if byte == TERMINATOR {
            return Push::Line;
        }
        if self.len < Self::LIMIT {
            self.buf[self.len] = byte;
            self.len += 1;
            Push::Stored
        } else {
            self.dropped += 1;
            Push::Dropped
        }
    }

    /// Current contents.
    pub fn line(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Bytes dropped since the last `clear`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reset to empty.
    pub fn clear(&mut self) {
        self.len = 0;
        self.dropped = 0;
    }
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader attempts before giving up on a torn snapshot.
const READ_RETRIES: usize = 8;

/// Single-slot message mailbox.
///
/// Last write wins; nothing is queued. The writer bumps `seq` to odd while
/// copying so the reader can detect and retry a torn copy.
pub struct PendingMessage<const N: usize> {
    bytes: [AtomicU8; N],
    len: AtomicUsize,
    seq: AtomicU32,
    flag: AtomicBool,
}

impl<const N: usize> PendingMessage<N> {
    /// Create an empty mailbox.
    pub const fn new() -> Self {
        const ZERO: AtomicU8 = AtomicU8::new(0);
        Self {
            bytes: [ZERO; N],
            len: AtomicUsize::new(0),
            seq: AtomicU32::new(0),
            flag: AtomicBool::new(false),
        }
    }

    /// Overwrite the message and raise the flag. Single writer only.
    pub fn publish(&self, msg: &[u8]) {
        let n = msg.len().min(N);
        let seq = self.seq.load(Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for (cell, &b) in self.bytes.iter().zip(&msg[..n]) {
            cell.store(b, Ordering::Relaxed);
        }
        self.len.store(n, Ordering::Relaxed);

        // Flag before the closing seq so a reader that sees the new seq also
        // sees this flag and can clear it
        self.flag.store(true, Ordering::Release);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// True if a message is waiting.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Drop the waiting message, if any, without reading it.
    #[inline]
    pub fn discard(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Consume the waiting message into `out`.
    ///
    /// Clears the flag first. Returns the message length, or `None` if
    /// nothing is waiting or the writer kept racing the copy (the flag is
    /// then raised again for the next poll).
    pub fn take(&self, out: &mut [u8; N]) -> Option<usize> {
        if !self.flag.swap(false, Ordering::AcqRel) {
            return None;
        }
        let start = self.seq.load(Ordering::Acquire);

        for _ in 0..READ_RETRIES {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }

            let n = self.len.load(Ordering::Relaxed).min(N);
            for (dst, cell) in out[..n].iter_mut().zip(&self.bytes) {
                *dst = cell.load(Ordering::Relaxed);
            }

            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                if before != start {
                    // The copy already holds what the racing publish flagged
                    self.flag.swap(false, Ordering::AcqRel);
                    if self.seq.load(Ordering::Acquire) != before {
                        self.flag.store(true, Ordering::Release);
                    }
                }
                return Some(n);
            }
        }

        self.flag.store(true, Ordering::Release);
        None
    }
}

impl<const N: usize> Default for PendingMessage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic liveness line.
pub struct Heartbeat {
    next_ms: u64,
}

impl Heartbeat {
    pub const fn new() -> Self {
        Self { next_ms: 0 }
    }

    /// Emit `HB <mode>\n` if the period elapsed and the host is attached.
    ///
    /// Returns `true` if a line was written. A period of 0 disables it.
    pub fn poll(&mut self, now_ms: u64, device: &DeviceState, link: &impl LinkTx) -> bool {
        let period = device.config.heartbeat_ms.load(Ordering::Relaxed);
        if period == 0 || now_ms < self.next_ms {
            return false;
        }
        self.next_ms = now_ms + period as u64;

        if !link.is_connected() {
            return false;
        }

        let mut buf = [0u8; 24];
        let mut w = BufWriter::new(&mut buf);
        let _ = writeln!(w, "HB {}", device.mode.read());
        link.write(w.written()).is_ok()
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbound framing for the host link.
pub struct LinkFramer {
    assembler: LineAssembler<MESSAGE_CAPACITY>,
    frames: u32,
}

impl LinkFramer {
    pub const fn new() -> Self {
        Self {
            assembler: LineAssembler::new(),
            frames: 0,
        }
    }

    /// Feed a batch of received bytes.
    ///
    /// Each terminator completes its own frame: publish, raise
    /// `MessageReceived`, acknowledge once, reset. Returns the number of
    /// frames completed in this batch.
    pub fn receive(
        &mut self,
        bytes: &[u8],
        now_ms: u64,
        device: &DeviceState,
        link: &impl LinkTx,
    ) -> usize {
        let mut completed = 0;

        for &byte in bytes {
            if self.assembler.push(byte) != Push::Line {
                continue;
            }

            let dropped = self.assembler.dropped();
            if dropped > 0 {
                device.faults.record(FaultCode::InputOverflow, dropped as u32);
                crate::diag_warn!(device.log, now_ms, "line overflow, {} bytes dropped", dropped);
            }

            device.pending.publish(self.assembler.line());
            let (prev, _) = device.mode.apply(Event::LineReceived);
            if prev != Mode::MessageReceived {
                crate::diag_info!(device.log, now_ms, "mode {} -> {}", prev, Mode::MessageReceived);
            }

            send(link, ACK, device);
            self.assembler.clear();
            self.frames = self.frames.wrapping_add(1);
            completed += 1;
        }

        completed
    }

    /// Bytes buffered toward the next frame.
    pub fn buffered(&self) -> &[u8] {
        self.assembler.line()
    }

    /// Frames completed since boot.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Default for LinkFramer {
    fn default() -> Self {
        Self::new()
    }
}
