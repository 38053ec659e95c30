//! Single-slot registry holding the fallback sink of a failover sink.
//!
//! The slot accepts exactly one sink. Further attach attempts are refused
//! with a warning and leave the existing sink untouched.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::RwLock;

use crate::{log_record::LogEvent, sink::Sink};

pub struct FallbackSlot {
    owner: String,
    slot: RwLock<Option<Arc<dyn Sink>>>,
}

impl FallbackSlot {
    /// Create an empty slot. `owner` names the sink in status reports.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            slot: RwLock::new(None),
        }
    }

    /// Attach `sink` if the slot is empty.
    ///
    /// Returns `false` and warns when a fallback is already attached.
    pub fn attach(&self, sink: Arc<dyn Sink>) -> bool {
        let mut slot = self.slot.write();
        if slot.is_some() {
            warn!(
                "One and only one fallback sink may be attached to [{}].",
                self.owner
            );
            warn!("Ignoring additional sink named [{}]", sink.name());
            return false;
        }
        info!(
            "Attaching sink named [{}] to failover sink [{}].",
            sink.name(),
            self.owner
        );
        *slot = Some(sink);
        true
    }

    /// Detach `sink` if it is the attached instance.
    pub fn detach(&self, sink: &Arc<dyn Sink>) -> bool {
        let mut slot = self.slot.write();
        match slot.as_ref() {
            Some(current) if Arc::ptr_eq(current, sink) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Detach the attached sink if its name matches.
    pub fn detach_named(&self, name: &str) -> bool {
        let mut slot = self.slot.write();
        match slot.as_ref() {
            Some(current) if current.name() == name => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Detach the attached sink, if any, and stop it.
    pub fn detach_and_stop_all(&self) {
        let detached = self.slot.write().take();
        if let Some(sink) = detached {
            sink.stop();
        }
    }

    /// Look up the attached sink by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.slot
            .read()
            .as_ref()
            .filter(|sink| sink.name() == name)
            .cloned()
    }

    pub fn is_attached(&self, sink: &Arc<dyn Sink>) -> bool {
        self.slot
            .read()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, sink))
    }

    /// Snapshot of the attached sinks (zero or one).
    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.slot.read().iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        usize::from(self.slot.read().is_some())
    }

    /// Replay `event` through the attached sink.
    ///
    /// Returns the number of sinks invoked. The lock is released before the
    /// sink runs so a slow fallback never blocks attach or detach.
    pub fn replay(&self, event: &LogEvent) -> usize {
        let sink = self.slot.read().clone();
        match sink {
            Some(sink) => {
                sink.append(event);
                1
            }
            None => 0,
        }
    }
}

impl std::fmt::Debug for FallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attached = self.slot.read().as_ref().map(|s| s.name().to_owned());
        f.debug_struct("FallbackSlot")
            .field("owner", &self.owner)
            .field("attached", &attached)
            .finish()
    }
}
