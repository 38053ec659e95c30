//! Log appender publishing events to an AMQP exchange with a single
//! fallback sink.
//!
//! [`BrokerAppender`] formats each [`LogEvent`], publishes it to the
//! configured exchange and, when anything along that path fails, reports the
//! error, drops the connection so the next event reconnects, and replays the
//! event through its fallback sink. Nothing raised on the delivery path ever
//! reaches the code that logged the event.

pub mod broker;
pub mod failover;
pub mod fallback;
pub mod file_config;
pub mod formatter;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod rate_limited_warner;
pub mod sink;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use broker::{
    BrokerAppender, BrokerConfig, BrokerConfigBuilder, BrokerDelivery, BrokerError, ConfigError,
};
#[cfg(feature = "amqp")]
pub use broker::LapinConnector;
pub use failover::{Delivery, DeliveryError, FailoverSink};
pub use fallback::FallbackSlot;
pub use formatter::{
    DefaultFormatter, FormatError, Formatter, JsonFormatter, MsgPackFormatter, SharedFormatter,
};
pub use level::LogLevel;
#[cfg(feature = "log-compat")]
pub use log_compat::{SinkLogAdapter, install_global_logger};
pub use log_record::{EventMetadata, LogEvent};
pub use sink::Sink;
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::SinkLayer;
