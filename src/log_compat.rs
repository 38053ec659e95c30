//! Compatibility bridge for the Rust `log` crate.
//!
//! `SinkLogAdapter` implements `log::Log` and forwards each record to a
//! [`Sink`], so an appender can be installed as the process-wide logger.
//! Records emitted by this crate or the broker client stack are skipped;
//! otherwise the appender's own status reports would loop back into it.

use std::borrow::Cow;
use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::level::LogLevel;
use crate::log_record::{EventMetadata, LogEvent};
use crate::sink::{Sink, is_internal_target};

/// Adapter implementing the Rust `log::Log` trait on top of a sink.
pub struct SinkLogAdapter {
    sink: Arc<dyn Sink>,
    max_level: LevelFilter,
}

impl SinkLogAdapter {
    pub fn new(sink: Arc<dyn Sink>, max_level: LevelFilter) -> Self {
        Self { sink, max_level }
    }
}

fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

impl log::Log for SinkLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level && !is_internal_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let metadata = EventMetadata {
            module_path: record.module_path().unwrap_or_default().to_string(),
            filename: record.file().unwrap_or_default().to_string(),
            line_number: record.line().unwrap_or(0),
            ..Default::default()
        };

        let event = LogEvent::with_metadata(
            &normalise_target(record.target()),
            LogLevel::from(record.level()),
            &record.args().to_string(),
            metadata,
        );
        self.sink.append(&event);
    }

    fn flush(&self) {}
}

/// Install `sink` as the global Rust logger.
///
/// Fails when a global logger is already set. The adapter lives for the rest
/// of the process.
pub fn install_global_logger(
    sink: Arc<dyn Sink>,
    max_level: LevelFilter,
) -> Result<(), SetLoggerError> {
    let adapter: &'static SinkLogAdapter =
        Box::leak(Box::new(SinkLogAdapter::new(sink, max_level)));
    log::set_logger(adapter)?;
    log::set_max_level(max_level);
    Ok(())
}
