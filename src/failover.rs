//! Failure-intercepting sink decorator.
//!
//! [`FailoverSink`] wraps an error-prone [`Delivery`] and guarantees that
//! nothing it raises reaches the caller of [`Sink::append`]. A failed event
//! is replayed once through the single fallback sink, if one is attached,
//! and then dropped.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use delegate::delegate;
use log::warn;
use thiserror::Error;

use crate::{
    broker::BrokerError, fallback::FallbackSlot, formatter::FormatError, log_record::LogEvent,
    rate_limited_warner::RateLimitedWarner, sink::Sink,
};

/// Failure raised by a delivery attempt.
///
/// Every variant except [`DeliveryError::Stopped`] takes the same failover
/// path; the distinction only shows up in status reports. `Stopped` means
/// the append raced `stop()` and the event is dropped.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("unable to connect: {0}")]
    Connect(#[source] BrokerError),
    #[error("unable to publish: {0}")]
    Publish(#[source] BrokerError),
    #[error("unable to format event: {0}")]
    Format(#[from] FormatError),
    #[error("delivery stopped")]
    Stopped,
}

/// Error-prone delivery wrapped by a [`FailoverSink`].
pub trait Delivery: Send + Sync {
    fn start(&self) {}

    /// Attempt to deliver `event`.
    fn deliver(&self, event: &LogEvent) -> Result<(), DeliveryError>;

    /// Side effects run after a failed delivery and before the fallback
    /// replay.
    fn on_failure(&self, _event: &LogEvent, _error: &DeliveryError) {}

    fn stop(&self) {}
}

/// Sink decorator adding failure interception and a single fallback.
pub struct FailoverSink<D> {
    name: String,
    delivery: D,
    fallback: FallbackSlot,
    started: AtomicBool,
    unhandled: RateLimitedWarner,
    not_started: RateLimitedWarner,
}

impl<D: Delivery> FailoverSink<D> {
    pub fn new(name: impl Into<String>, delivery: D) -> Self {
        let name = name.into();
        Self {
            fallback: FallbackSlot::new(name.clone()),
            name,
            delivery,
            started: AtomicBool::new(false),
            unhandled: RateLimitedWarner::default(),
            not_started: RateLimitedWarner::default(),
        }
    }

    /// Override the spacing between dropped-event warnings.
    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.unhandled = RateLimitedWarner::new(interval);
        self.not_started = RateLimitedWarner::new(interval);
        self
    }

    /// The wrapped delivery implementation.
    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Attach the fallback sink.
    ///
    /// Only one fallback may be attached; later attempts are ignored with a
    /// warning and return `false`.
    pub fn attach_fallback(&self, sink: Arc<dyn Sink>) -> bool {
        self.fallback.attach(sink)
    }

    delegate! {
        to self.fallback {
            #[call(detach)]
            pub fn detach_fallback(&self, sink: &Arc<dyn Sink>) -> bool;
            #[call(detach_named)]
            pub fn detach_fallback_named(&self, name: &str) -> bool;
            pub fn detach_and_stop_all(&self);
            #[call(get)]
            pub fn fallback_named(&self, name: &str) -> Option<Arc<dyn Sink>>;
            pub fn is_attached(&self, sink: &Arc<dyn Sink>) -> bool;
            #[call(sinks)]
            pub fn fallbacks(&self) -> Vec<Arc<dyn Sink>>;
            #[call(count)]
            pub fn fallback_count(&self) -> usize;
        }
    }

    /// Handle a failed delivery of `event`.
    ///
    /// Runs the delivery's failure hook and then replays the event through
    /// the fallback. With no fallback attached the event is dropped.
    pub fn append_failed(&self, event: &LogEvent, error: &DeliveryError) {
        self.delivery.on_failure(event, error);
        if self.fallback.replay(event) == 0 {
            self.unhandled.record_drop();
            self.unhandled.warn_if_due(|count| {
                warn!(
                    "[{}] dropped {count} events with no fallback sink attached",
                    self.name
                );
            });
        }
    }
}

impl<D> FailoverSink<D> {
    fn drop_inactive(&self) {
        self.not_started.record_drop();
        self.not_started.warn_if_due(|count| {
            warn!(
                "[{}] dropped {count} events appended before start or after stop",
                self.name
            );
        });
    }
}

impl<D: Delivery> Sink for FailoverSink<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        self.delivery.start();
        self.started.store(true, Ordering::Release);
    }

    fn append(&self, event: &LogEvent) {
        if !self.is_started() {
            self.drop_inactive();
            return;
        }
        match self.delivery.deliver(event) {
            Ok(()) => {}
            Err(DeliveryError::Stopped) => self.drop_inactive(),
            Err(err) => self.append_failed(event, &err),
        }
    }

    fn stop(&self) {
        self.delivery.stop();
        self.started.store(false, Ordering::Release);
        self.unhandled.flush(|count| {
            warn!(
                "[{}] dropped {count} events with no fallback sink attached",
                self.name
            );
        });
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl<D> std::fmt::Debug for FailoverSink<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverSink")
            .field("name", &self.name)
            .field("fallback", &self.fallback)
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish()
    }
}
