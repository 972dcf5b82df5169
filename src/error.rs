//! Error types for the dispatcher pipeline.
//!
//! Every fallible boundary in this crate returns one of these enums rather
//! than a raw `bool`/sentinel, the way the teacher's `EspError`/`ConsoleError`
//! wrappers do for their own collaborators.

use thiserror::Error;

/// Errors returned by [`crate::config::Config::validate`] and by
/// [`crate::RemoteLogger::init`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("device name must not be empty")]
    EmptyDeviceName,
    #[error("queue_capacity must be nonzero")]
    ZeroQueueCapacity,
    #[error("spool_max_entries must be nonzero")]
    ZeroSpoolCapacity,
    #[error("max_sinks must be nonzero")]
    ZeroMaxSinks,
    #[error("spool backend failed to open: {0}")]
    SpoolOpenFailed(#[from] SpoolError),
    #[cfg(feature = "config-file")]
    #[error("failed to load layered configuration")]
    ConfigLoadFailed,
}

/// Errors from the sink registry boundary (§4.2).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink registry is full (max {max} sinks)")]
    RegistryFull { max: usize },
    #[error("sink failed to initialize")]
    InitFailed,
    #[error("dispatcher has already started; install sinks before start()")]
    AlreadyStarted,
}

/// Errors from the spool adapter boundary (§4.3), representing failures in
/// the collaborator's durable-FIFO backend. These are treated as bugs in the
/// collaborator, not expected failures (§7).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpoolError {
    #[error("spool backend failed to open")]
    OpenFailed,
    #[error("spool backend write failed")]
    WriteFailed,
    #[error("spool backend read failed")]
    ReadFailed,
}

/// Errors from rendering a [`crate::record::Record`] into a wire line (§4.4).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("rendered line would exceed the fixed output buffer")]
    Overflow,
}
