//! Test helpers shared by unit tests and, through the `test-util` feature,
//! by the integration tests.

mod collecting_sink;
#[cfg(test)]
mod log_capture;
mod mock_broker;

pub use collecting_sink::CollectingSink;
#[cfg(test)]
pub(crate) use log_capture::log_capture;
pub use mock_broker::{MockConnector, PublishedMessage};
