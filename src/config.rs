//! Startup configuration (§3 "Global state", §4.8, §6).
//!
//! The teacher generated its parameter table from `parameters.yaml` at build
//! time (`config/mod.rs`'s `generated_config` module). There is no longer a
//! parameters domain to generate from, so this is a hand-written struct with
//! a builder and a validator — optionally overlaid from a file/environment
//! via the `config` crate when the `config-file` feature is enabled, the
//! same layered-sources idea the generator served, just hand-rolled.

use std::time::Duration;

use crate::error::InitError;
use crate::format::WireFormat;
use crate::record::Severity;

/// Default ring-queue capacity (§3 "RingQueue", default N=10).
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default sink registry capacity (§3 "SinkRegistry", default K=2).
pub const DEFAULT_MAX_SINKS: usize = 2;
/// Default dispatcher tick (§4.5, default 1s).
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
/// Default heartbeat period, expressed in ticks (§4.7).
pub const DEFAULT_HEARTBEAT_TICKS: u32 = 60;

/// Validated startup configuration for [`crate::RemoteLogger::init`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub device_name: String,
    pub thread_priority: i32,
    pub spool_max_entries: usize,
    pub format: WireFormat,
    pub min_severity: Severity,
    pub queue_capacity: usize,
    pub max_sinks: usize,
    pub heartbeat_ticks: u32,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Configuration-errors taxonomy (§7): invalid name, zero capacities.
    /// Fatal to startup; never raised after init.
    pub fn validate(&self) -> Result<(), InitError> {
        if self.device_name.trim().is_empty() {
            return Err(InitError::EmptyDeviceName);
        }
        if self.queue_capacity == 0 {
            return Err(InitError::ZeroQueueCapacity);
        }
        if self.spool_max_entries == 0 {
            return Err(InitError::ZeroSpoolCapacity);
        }
        if self.max_sinks == 0 {
            return Err(InitError::ZeroMaxSinks);
        }
        Ok(())
    }

    /// Hostname with spaces rewritten to underscore, truncated to 19 bytes
    /// (§3 "Global state"). Truncates on a UTF-8 boundary rather than a char
    /// count, so the result is never more than 19 bytes even for multi-byte
    /// device names — callers like `format::render` can rely on the length
    /// without needing to re-truncate.
    pub fn hostname(&self) -> String {
        let replaced = self.device_name.replace(' ', "_");
        truncate_utf8(&replaced, 19).to_string()
    }
}

/// Truncate `s` to at most `max_bytes` bytes, backing off to the nearest
/// preceding UTF-8 character boundary so the result is always valid `str`.
fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Builder for [`Config`], matching the teacher's preference for explicit,
/// chainable construction over a bag of positional arguments.
#[derive(Debug)]
pub struct ConfigBuilder {
    device_name: String,
    thread_priority: i32,
    spool_max_entries: usize,
    format: WireFormat,
    min_severity: Severity,
    queue_capacity: usize,
    max_sinks: usize,
    heartbeat_ticks: u32,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            device_name: String::new(),
            thread_priority: 0,
            spool_max_entries: 64,
            format: WireFormat::Rfc3164,
            min_severity: Severity::Info,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_sinks: DEFAULT_MAX_SINKS,
            heartbeat_ticks: DEFAULT_HEARTBEAT_TICKS,
        }
    }
}

impl ConfigBuilder {
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn thread_priority(mut self, priority: i32) -> Self {
        self.thread_priority = priority;
        self
    }

    pub fn spool_max_entries(mut self, max: usize) -> Self {
        self.spool_max_entries = max;
        self
    }

    pub fn format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn max_sinks(mut self, max: usize) -> Self {
        self.max_sinks = max;
        self
    }

    pub fn heartbeat_ticks(mut self, ticks: u32) -> Self {
        self.heartbeat_ticks = ticks;
        self
    }

    pub fn build(self) -> Result<Config, InitError> {
        let config = Config {
            device_name: self.device_name,
            thread_priority: self.thread_priority,
            spool_max_entries: self.spool_max_entries,
            format: self.format,
            min_severity: self.min_severity,
            queue_capacity: self.queue_capacity,
            max_sinks: self.max_sinks,
            heartbeat_ticks: self.heartbeat_ticks,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Layered file/environment configuration, enabled by the `config-file`
/// feature. Mirrors the `config` crate usage in the wider corpus (a
/// `defaults -> file -> environment` overlay), converted into our own
/// `Config` and re-validated rather than trusted blindly.
#[cfg(feature = "config-file")]
pub mod layered {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct RawConfig {
        device_name: String,
        #[serde(default)]
        thread_priority: i32,
        #[serde(default = "default_spool_entries")]
        spool_max_entries: usize,
        #[serde(default)]
        format: RawFormat,
        #[serde(default)]
        min_severity: RawSeverity,
        #[serde(default = "default_queue_capacity")]
        queue_capacity: usize,
        #[serde(default = "default_max_sinks")]
        max_sinks: usize,
        #[serde(default = "default_heartbeat_ticks")]
        heartbeat_ticks: u32,
    }

    fn default_spool_entries() -> usize {
        64
    }
    fn default_queue_capacity() -> usize {
        DEFAULT_QUEUE_CAPACITY
    }
    fn default_max_sinks() -> usize {
        DEFAULT_MAX_SINKS
    }
    fn default_heartbeat_ticks() -> u32 {
        DEFAULT_HEARTBEAT_TICKS
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum RawFormat {
        #[default]
        Rfc3164,
        Rfc5424,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum RawSeverity {
        Emergency,
        Alert,
        Critical,
        Error,
        Warning,
        Notice,
        #[default]
        Info,
        Debug,
    }

    /// Load configuration from `path` (and environment variables prefixed
    /// `RLOGD_`), falling back to built-in defaults for anything unset, then
    /// validate the result the same way a programmatically-built `Config` is.
    pub fn load(path: Option<&str>) -> Result<Config, InitError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("RLOGD"));

        let raw: RawConfig = builder
            .build()
            .map_err(|_| InitError::ConfigLoadFailed)?
            .try_deserialize()
            .map_err(|_| InitError::ConfigLoadFailed)?;

        let format = match raw.format {
            RawFormat::Rfc3164 => WireFormat::Rfc3164,
            RawFormat::Rfc5424 => WireFormat::Rfc5424,
        };
        let min_severity = match raw.min_severity {
            RawSeverity::Emergency => Severity::Emergency,
            RawSeverity::Alert => Severity::Alert,
            RawSeverity::Critical => Severity::Critical,
            RawSeverity::Error => Severity::Error,
            RawSeverity::Warning => Severity::Warning,
            RawSeverity::Notice => Severity::Notice,
            RawSeverity::Info => Severity::Info,
            RawSeverity::Debug => Severity::Debug,
        };

        let config = Config {
            device_name: raw.device_name,
            thread_priority: raw.thread_priority,
            spool_max_entries: raw.spool_max_entries,
            format,
            min_severity,
            queue_capacity: raw.queue_capacity,
            max_sinks: raw.max_sinks,
            heartbeat_ticks: raw.heartbeat_ticks,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_valid_config() {
        let config = Config::builder().device_name("dev1").build().unwrap();
        assert_eq!(config.device_name, "dev1");
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn empty_device_name_rejected() {
        let err = Config::builder().build().unwrap_err();
        assert_eq!(err, InitError::EmptyDeviceName);
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let err = Config::builder()
            .device_name("dev1")
            .queue_capacity(0)
            .build()
            .unwrap_err();
        assert_eq!(err, InitError::ZeroQueueCapacity);
    }

    #[test]
    fn zero_spool_capacity_rejected() {
        let err = Config::builder()
            .device_name("dev1")
            .spool_max_entries(0)
            .build()
            .unwrap_err();
        assert_eq!(err, InitError::ZeroSpoolCapacity);
    }

    #[test]
    fn zero_max_sinks_rejected() {
        let err = Config::builder()
            .device_name("dev1")
            .max_sinks(0)
            .build()
            .unwrap_err();
        assert_eq!(err, InitError::ZeroMaxSinks);
    }

    #[test]
    fn s6_hostname_rewrites_spaces() {
        let config = Config::builder().device_name("my device").build().unwrap();
        assert_eq!(config.hostname(), "my_device");
    }

    #[test]
    fn hostname_truncated_to_19_bytes() {
        let config = Config::builder()
            .device_name("a-device-name-that-is-very-long")
            .build()
            .unwrap();
        assert_eq!(config.hostname().len(), 19);
    }

    #[test]
    fn hostname_truncation_never_splits_a_multibyte_char() {
        // Each 'é' is 2 bytes; 18 of them is 36 bytes, well past the 19-byte
        // limit, and an odd byte count can't land on a char boundary if
        // truncation is done at a raw byte count instead of backing off.
        let long_name: String = std::iter::repeat('é').take(18).collect();
        let config = Config::builder().device_name(long_name).build().unwrap();
        let host = config.hostname();
        assert!(host.len() <= 19);
        assert!(std::str::from_utf8(host.as_bytes()).is_ok());
        assert!(!host.is_empty());
    }
}
