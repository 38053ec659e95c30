//! Formatters turning log events into message payloads.
//!
//! Provides the core [`Formatter`] trait alongside a shared trait-object
//! wrapper so one formatter instance can back several sinks across threads.
//! Structured encodings live in [`structured`].

use std::{fmt, io, sync::Arc};

use thiserror::Error;

use crate::log_record::LogEvent;

mod structured;

pub use structured::{JsonFormatter, MsgPackFormatter};

/// Raised when an event cannot be rendered into a payload.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to encode event as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode event as MessagePack: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait for formatting log events into byte payloads.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// shared by sinks invoked from any logging thread.
pub trait Formatter: Send + Sync {
    /// Render an event into the bytes published on the wire.
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError>;
}

/// Shared formatter trait object used across sinks.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn Formatter>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: Formatter + 'static,
    {
        Self {
            inner: Arc::new(formatter),
        }
    }

    /// Wrap an existing shared formatter trait object.
    pub fn from_arc(inner: Arc<dyn Formatter>) -> Self {
        Self { inner }
    }

    pub fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        self.inner.format(event)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn Formatter>)")
    }
}

impl<F: Formatter + 'static> From<F> for SharedFormatter {
    fn from(formatter: F) -> Self {
        Self::new(formatter)
    }
}

/// Plain-text layout: `logger [LEVEL] message`, UTF-8 encoded.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        Ok(format!("{} [{}] {}", event.logger(), event.level_str(), event.message()).into_bytes())
    }
}

impl Formatter for Arc<dyn Formatter> {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        (**self).format(event)
    }
}

impl Formatter for Box<dyn Formatter> {
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>, FormatError> {
        (**self).format(event)
    }
}
