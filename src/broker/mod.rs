//! Broker appender publishing log events to an AMQP exchange.
//!
//! [`BrokerAppender`] formats each event, publishes it with a random
//! `message-distribution-hash` header and hands failures to its single
//! fallback sink. Connections are opened lazily, torn down on any publish
//! failure and re-established by the next event. The broker itself sits
//! behind the traits in [`client`]; the `amqp` feature supplies a lapin
//! implementation.

mod appender;
pub mod client;
mod config;
#[cfg(feature = "amqp")]
pub mod lapin_client;


pub use appender::{BrokerAppender, BrokerDelivery};
pub use client::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ConnectionParams,
    DISTRIBUTION_HASH_HEADER, MessageHeaders,
};
pub use config::{BrokerConfig, BrokerConfigBuilder, CONNECT_TIMEOUT, ConfigError};
#[cfg(feature = "amqp")]
pub use lapin_client::LapinConnector;
