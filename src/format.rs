//! Formatter adapter (§4.4): renders a [`Record`] into a wire line, per the
//! selected syslog variant.
//!
//! Grounded on the teacher's `uart_logger::format_log_entry`, which renders
//! into a fixed buffer via a small `core::fmt::Write` adapter instead of
//! allocating a `String`; reused here verbatim as `BufWriter`.

use core::fmt::Write as _;

use crate::error::FormatError;
use crate::record::Record;

/// Wire format selected at init (§1, §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// BSD syslog (RFC 3164).
    Rfc3164,
    /// Structured syslog (RFC 5424).
    Rfc5424,
}

/// Output buffer size: `RLOG_MAX_SIZE + 80` (§4.4).
pub const FORMAT_BUF_SIZE: usize = crate::record::RLOG_MAX_SIZE + 80;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    overflowed: bool,
}

impl<'a> core::fmt::Write for BufWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        if bytes.len() > remaining {
            self.overflowed = true;
            return Err(core::fmt::Error);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }
}

/// Replace spaces with underscores, the rule shared by hostname and `proc`
/// rendering (§4.4, S6). Truncation backs off to the nearest preceding
/// UTF-8 character boundary rather than cutting at a raw byte count, so a
/// multi-byte `s` longer than `out` never produces invalid UTF-8.
fn space_to_underscore(s: &str, out: &mut [u8]) -> usize {
    let mut n = s.len().min(out.len());
    while n > 0 && !s.is_char_boundary(n) {
        n -= 1;
    }
    let bytes = s.as_bytes();
    for i in 0..n {
        out[i] = if bytes[i] == b' ' { b'_' } else { bytes[i] };
    }
    n
}

/// Render `record` into `buf` per `format`. Returns the number of bytes
/// written (excluding any terminator), or `FormatError::Overflow` if the
/// rendered line would not fit in the fixed-size buffer (§4.4, §7).
pub fn render(
    record: &Record,
    hostname: &str,
    format: WireFormat,
    buf: &mut [u8],
) -> Result<usize, FormatError> {
    let mut host_buf = [0u8; 19];
    let host_len = space_to_underscore(hostname, &mut host_buf);
    let host = core::str::from_utf8(&host_buf[..host_len]).unwrap_or("");

    let mut proc_buf = [0u8; crate::record::PROC_MAX_SIZE];
    let proc_len = space_to_underscore(record.proc.as_str(), &mut proc_buf);
    let proc = core::str::from_utf8(&proc_buf[..proc_len]).unwrap_or("");

    let (year, month, day, hour, minute, second) = record.timestamp.to_utc_parts();
    let pri = record.priority();

    let mut writer = BufWriter {
        buf,
        pos: 0,
        overflowed: false,
    };

    let result = match format {
        WireFormat::Rfc3164 => {
            let month_name = MONTHS[(month as usize - 1).min(11)];
            if proc.is_empty() {
                write!(
                    writer,
                    "<{pri}>{month_name} {day:02} {hour:02}:{minute:02}:{second:02} {host} -: {msg}\r\n",
                    msg = record.msg.as_str()
                )
            } else {
                write!(
                    writer,
                    "<{pri}>{month_name} {day:02} {hour:02}:{minute:02}:{second:02} {host} {proc}: {msg}\r\n",
                    msg = record.msg.as_str()
                )
            }
        }
        WireFormat::Rfc5424 => {
            if proc.is_empty() {
                write!(
                    writer,
                    "<{pri}>1 {year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02} {host} - - - {msg}\r\n",
                    msg = record.msg.as_str()
                )
            } else {
                write!(
                    writer,
                    "<{pri}>1 {year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02} {host} {proc} - - {msg}\r\n",
                    msg = record.msg.as_str()
                )
            }
        }
    };

    match result {
        Ok(()) => Ok(writer.pos),
        Err(_) => Err(FormatError::Overflow),
    }
}

/// The fields a rendered line carries, recovered by [`parse`].
///
/// Timestamp is intentionally not part of this (the wire format only ever
/// carries second resolution, so round-tripping it requires comparing at
/// that resolution rather than the microsecond `Timestamp` the formatter
/// was given).
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedLine {
    pub priority: u8,
    pub hostname: String,
    pub proc: String,
    pub msg: String,
}

/// Parse a line rendered by [`render`] back into its fields. Only
/// understands this crate's own output; not a general syslog parser.
pub fn parse(line: &str, format: WireFormat) -> Option<ParsedLine> {
    let line = line.strip_suffix("\r\n")?;
    let rest = line.strip_prefix('<')?;
    let (pri_str, rest) = rest.split_once('>')?;
    let priority: u8 = pri_str.parse().ok()?;

    match format {
        WireFormat::Rfc3164 => {
            // "MMM dd HH:MM:SS HOST PROC: MSG" (or "HOST -: MSG")
            let mut tokens = rest.splitn(5, ' ');
            let _month = tokens.next()?;
            let _day = tokens.next()?;
            let _time = tokens.next()?;
            let hostname = tokens.next()?.to_string();
            let tail = tokens.next()?; // "PROC: MSG" or "-: MSG"
            let (proc_tok, msg) = tail.split_once(": ")?;
            let proc = if proc_tok == "-" { String::new() } else { proc_tok.to_string() };
            Some(ParsedLine {
                priority,
                hostname,
                proc,
                msg: msg.to_string(),
            })
        }
        WireFormat::Rfc5424 => {
            // "1 TIME HOST PROC - - MSG" (or "1 TIME HOST - - - MSG")
            let rest = rest.strip_prefix("1 ")?;
            let mut tokens = rest.splitn(6, ' ');
            let _time = tokens.next()?;
            let hostname = tokens.next()?.to_string();
            let field2 = tokens.next()?;
            let _dash1 = tokens.next()?;
            let _dash2 = tokens.next()?;
            let rest_after = tokens.next()?;
            let proc = if field2 == "-" { String::new() } else { field2.to_string() };
            Some(ParsedLine {
                priority,
                hostname,
                proc,
                msg: rest_after.to_string(),
            })
        }
    }
}
