//! Process-wide default logger (§2 item 9 "Handle / global singleton",
//! DESIGN NOTES "Process-wide singletons via pointers").
//!
//! The explicit [`crate::RemoteLogger`] handle remains the primary API; this
//! module is the thin forwarding layer for call sites that don't want to
//! thread one through, the same role the teacher's global `rt_log!` macro
//! family played over a single static stream — generalized here to a
//! lazily-initialized default instance behind a `OnceLock` instead of a
//! `static mut`.

use std::sync::OnceLock;

use crate::{Config, RemoteLogger, Severity, StdoutSink};

static DEFAULT: OnceLock<RemoteLogger> = OnceLock::new();

/// Install `logger` as the process-wide default. Only the first call wins
/// (matching `OnceLock::set`); later calls, or any call after the default
/// has already been lazily created by [`log`]/[`logf!`], return `logger`
/// back unused.
pub fn init_default(logger: RemoteLogger) -> Result<(), RemoteLogger> {
    DEFAULT.set(logger)
}

fn default_logger() -> &'static RemoteLogger {
    DEFAULT.get_or_init(|| {
        let config = Config::builder()
            .device_name("rlogd")
            .build()
            .expect("default config is always valid");
        let mut logger = RemoteLogger::init(config).expect("default init is infallible");
        logger
            .install_interface(Box::new(StdoutSink::new()))
            .expect("installing before start always succeeds");
        logger.start();
        logger
    })
}

/// Forward to the process-wide default logger, lazily creating it (stdout
/// sink, default config) on first use if [`init_default`] was never called.
pub fn log(severity: Severity, msg: &str) {
    default_logger().log(severity, msg);
}

#[doc(hidden)]
macro_rules! logf_impl {
    ($severity:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let mut buf = $crate::FmtBuf::new();
        let _ = write!(buf, $($arg)*);
        $crate::log::log($severity, buf.as_str());
    }};
}

/// Render a formatted message and forward it to the process-wide default
/// logger. The module-level counterpart to [`crate::logf!`], which targets
/// an explicit handle.
pub use logf_impl as logf;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logf_forwards_to_default_without_panicking() {
        logf!(Severity::Info, "pid={}", 42);
    }

    #[test]
    fn log_forwards_to_default_without_panicking() {
        log(Severity::Warning, "default logger reachable");
    }
}
