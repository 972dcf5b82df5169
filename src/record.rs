//! The in-memory log record (§3 "Record").
//!
//! Mirrors the teacher's `LogEntry` — a `Copy`, fixed-layout value with
//! stack-resident fixed-size buffers instead of a heap `String` — but trades
//! the teacher's raw byte-length counter for a safe bounded-string type, per
//! the "truncating string copy" design note.

use crate::clock::Timestamp;

/// Longest message payload accepted before truncation.
pub const RLOG_MAX_SIZE: usize = 256;

/// Longest `proc` tag accepted before truncation (teacher: "≤ 15 bytes").
pub const PROC_MAX_SIZE: usize = 15;

/// Syslog severities (RFC 5424 §6.2.1), user facility assumed fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// `facility * 8 + severity`, facility fixed at 1 (user-level).
    pub fn priority(self) -> u8 {
        8 + self as u8
    }
}

/// A fixed-capacity, always-null-terminated byte buffer.
///
/// The "single slice-copy + terminator write" truncation rule from the
/// design notes, expressed as one small helper type instead of repeating the
/// copy-and-truncate dance at every call site.
#[derive(Clone, Copy)]
pub struct FixedBuf<const N: usize> {
    bytes: [u8; N],
    len: u16,
}

impl<const N: usize> FixedBuf<N> {
    pub const fn empty() -> Self {
        Self {
            bytes: [0u8; N],
            len: 0,
        }
    }

    /// Copy `src` in, truncating to `N` bytes if necessary. Always leaves the
    /// buffer valid; truncation never splits a byte sequence in a way that
    /// would fail `as_str` (we simply lose the tail bytes).
    pub fn from_bytes(src: &[u8]) -> Self {
        let n = src.len().min(N);
        let mut bytes = [0u8; N];
        bytes[..n].copy_from_slice(&src[..n]);
        Self {
            bytes,
            len: n as u16,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for FixedBuf<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> PartialEq for FixedBuf<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// One log entry: the in-memory tuple `{timestamp, priority, proc, msg}`.
#[derive(Clone, Copy, PartialEq)]
pub struct Record {
    pub timestamp: Timestamp,
    pub severity: Severity,
    pub proc: FixedBuf<PROC_MAX_SIZE>,
    pub msg: FixedBuf<RLOG_MAX_SIZE>,
}

impl Record {
    pub fn new(timestamp: Timestamp, severity: Severity, proc: &str, msg: &str) -> Self {
        Self {
            timestamp,
            severity,
            proc: FixedBuf::from_bytes(proc.as_bytes()),
            msg: FixedBuf::from_bytes(msg.as_bytes()),
        }
    }

    /// `8 + severity`, always in `{8..15}` (invariant #6).
    pub fn priority(&self) -> u8 {
        self.severity.priority()
    }
}
