//! A sink that accumulates events in memory for test assertions.
//!
//! Shared across test modules so each one does not need its own copy of
//! the same boilerplate. Clones share their storage.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use crate::{log_record::LogEvent, sink::Sink};

/// Sink that stores every event it receives for later inspection.
#[derive(Clone, Debug)]
pub struct CollectingSink {
    name: String,
    events: Arc<Mutex<Vec<LogEvent>>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::named("collecting")
    }
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Arc::default(),
            starts: Arc::default(),
            stops: Arc::default(),
        }
    }

    /// Return a snapshot of all events received so far.
    pub fn collected(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Sink for CollectingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn append(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
