//! Reference [`Sink`] writing to standard output.
//!
//! Grounded on the teacher's `uart_logger::uart_logger_task`: a consumer that
//! drains formatted lines and writes them out, always considering the
//! transport live once open. This is the one transport this crate ships
//! directly; UDP/TCP/serial sinks are left as implementations of the same
//! trait for callers to supply (§1, §6).

use std::io::{self, Write};

use crate::error::SinkError;
use crate::sink::Sink;

/// Writes every line to `stdout`, CR/LF included. Never reports not-live;
/// a write failure (e.g. a closed pipe) is the only thing that marks a send
/// as unsuccessful.
pub struct StdoutSink {
    stdout: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { stdout: io::stdout() }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StdoutSink {
    fn init(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn poll(&mut self) -> bool {
        true
    }

    fn send(&mut self, bytes: &[u8]) -> bool {
        let mut handle = self.stdout.lock();
        handle.write_all(bytes).is_ok() && handle.flush().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_reports_success() {
        let mut sink = StdoutSink::new();
        assert!(sink.init().is_ok());
        assert!(sink.poll());
        assert!(sink.send(b"hello\r\n"));
    }
}
