//! Broker client abstraction used by the appender.
//!
//! The appender never talks to a concrete AMQP library directly. It drives
//! these traits, which the lapin-backed client and the test mock implement.
//! All calls are blocking.

use std::{collections::BTreeMap, time::Duration};

use thiserror::Error;

/// Header carrying the per-message random distribution hint.
pub const DISTRIBUTION_HASH_HEADER: &str = "message-distribution-hash";

/// Integer-valued headers attached to a published message.
pub type MessageHeaders = BTreeMap<String, i32>;

/// Build the header table for one publish.
pub fn distribution_headers(hash: i32) -> MessageHeaders {
    MessageHeaders::from([(DISTRIBUTION_HASH_HEADER.to_owned(), hash)])
}

/// Errors raised by broker clients.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("connection timed out: {0}")]
    Timeout(String),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("close failed: {0}")]
    Close(String),
}

impl BrokerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrokerError::Timeout(_))
    }
}

/// Parameters used to open a broker connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    /// `None` selects the broker default port.
    pub port: Option<u16>,
    pub virtual_host: String,
    pub username: String,
    pub password: String,
    pub heartbeat_secs: Option<u16>,
    /// Bound on the TCP connect and protocol handshake.
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("virtual_host", &self.virtual_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("heartbeat_secs", &self.heartbeat_secs)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Opens connections to a broker.
pub trait BrokerConnector: Send + Sync {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn BrokerConnection>, BrokerError>;
}

/// An open broker connection.
pub trait BrokerConnection: Send {
    fn is_open(&self) -> bool;

    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, BrokerError>;

    fn close(&mut self) -> Result<(), BrokerError>;
}

/// A channel multiplexed over a [`BrokerConnection`].
pub trait BrokerChannel: Send {
    fn is_open(&self) -> bool;

    /// Publish `payload` to `exchange` with `routing_key`.
    ///
    /// No timeout is applied; the call returns once the client has handed
    /// the message to the broker or failed.
    fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        headers: &MessageHeaders,
        payload: &[u8],
    ) -> Result<(), BrokerError>;

    fn close(&mut self) -> Result<(), BrokerError>;
}
