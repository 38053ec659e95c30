//! `tracing` layer forwarding events into a sink.
//!
//! The `message` field becomes the event message; every other field is
//! recorded as a key-value pair. Events from this crate or the broker client
//! stack are skipped.

use std::{collections::BTreeMap, fmt, sync::Arc};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{layer::Context, Layer};

use crate::{
    level::LogLevel,
    log_record::{EventMetadata, LogEvent},
    sink::{Sink, is_internal_target},
};

pub struct SinkLayer {
    sink: Arc<dyn Sink>,
}

impl SinkLayer {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self { sink }
    }
}

fn map_level(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        _ => LogLevel::Error,
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.insert(field.name().to_owned(), value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_owned(), format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal_target(meta.target()) {
            return;
        }
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let metadata = EventMetadata {
            module_path: meta.module_path().unwrap_or_default().to_owned(),
            filename: meta.file().unwrap_or_default().to_owned(),
            line_number: meta.line().unwrap_or(0),
            key_values: collector.fields,
            ..Default::default()
        };
        let log_event = LogEvent::with_metadata(
            meta.target(),
            map_level(meta.level()),
            &collector.message,
            metadata,
        );
        self.sink.append(&log_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::CollectingSink;
    use tracing_subscriber::prelude::*;

    #[test]
    fn forwards_message_and_fields() {
        let sink = CollectingSink::named("tracing");
        let subscriber =
            tracing_subscriber::registry().with(SinkLayer::new(Arc::new(sink.clone())));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "billing", invoice = 42, "payment retried");
        });

        let events = sink.collected();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.logger(), "billing");
        assert_eq!(event.level(), LogLevel::Warn);
        assert_eq!(event.message(), "payment retried");
        assert_eq!(
            event.metadata().key_values.get("invoice").map(String::as_str),
            Some("42")
        );
    }

    #[test]
    fn skips_internal_targets() {
        let sink = CollectingSink::named("tracing");
        let subscriber =
            tracing_subscriber::registry().with(SinkLayer::new(Arc::new(sink.clone())));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "lapin::channel", "socket closed");
        });

        assert!(sink.collected().is_empty());
    }
}
