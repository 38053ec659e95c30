use crate::log_record::LogEvent;

/// Trait implemented by every log destination.
///
/// `Sink` is `Send + Sync` so a single instance can be shared behind an
/// `Arc` and invoked from whichever thread produced the event. `append`
/// has no error channel: a sink deals with its own failures and reports
/// them through the crate's status logging.
pub trait Sink: Send + Sync {
    /// Name used in status reports and fallback lookups.
    fn name(&self) -> &str;

    /// Prepare the sink for use.
    fn start(&self) {}

    /// Deliver a single event.
    fn append(&self, event: &LogEvent);

    /// Release any resources held by the sink.
    fn stop(&self) {}

    fn is_started(&self) -> bool {
        true
    }
}

/// Targets whose records must never be fed back into a sink.
///
/// Covers this crate's own status reports and the broker client stack, which
/// may log while the appender holds its connection lock.
const INTERNAL_TARGET_PREFIXES: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    "lapin",
    "amq_protocol",
    "pinky_swear",
    "async_global_executor",
    "async_io",
    "polling",
    "tcp_stream",
];

/// Whether a record emitted under `target` originates inside the sink stack.
pub fn is_internal_target(target: &str) -> bool {
    INTERNAL_TARGET_PREFIXES.iter().any(|prefix| {
        target
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}
