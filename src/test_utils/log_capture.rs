//! Process-wide `logtest` capture for tests asserting on status reports.
//!
//! `logtest::Logger::start` installs the global logger and can only succeed
//! once per process, so every test goes through [`log_capture`].

use std::sync::LazyLock;

use logtest::Logger;
use parking_lot::{Mutex, MutexGuard};

static LOGGER: LazyLock<Mutex<Logger>> = LazyLock::new(|| Mutex::new(Logger::start()));

/// Exclusive handle on the shared logger.
pub(crate) struct LogCapture {
    logger: MutexGuard<'static, Logger>,
}

/// Lock the shared logger and discard anything captured so far.
pub(crate) fn log_capture() -> LogCapture {
    let mut capture = LogCapture {
        logger: LOGGER.lock(),
    };
    capture.drain();
    capture
}

impl LogCapture {
    /// Drain everything captured so far as `(level, message)` pairs.
    pub(crate) fn drain(&mut self) -> Vec<(log::Level, String)> {
        std::iter::from_fn(|| self.logger.pop())
            .map(|record| (record.level(), record.args().to_owned()))
            .collect()
    }
}
