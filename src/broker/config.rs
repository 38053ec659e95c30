//! Immutable broker settings and the builder that validates them.
//!
//! [`BrokerConfigBuilder`] collects the scalar settings once at startup.
//! Validation only checks that required settings are present; there is no
//! cross-field validation.

use std::{io, time::Duration};

use thiserror::Error;

use super::client::ConnectionParams;

/// Connect timeout applied to every connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Virtual host used when none is configured.
pub const DEFAULT_VIRTUAL_HOST: &str = "/";

/// Errors that may occur while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {field}: {value:?}")]
    Invalid { field: String, value: String },
    #[error("{0} doesn't exist")]
    NotFound(String),
    #[error("{0} is an empty file")]
    Empty(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown encoding {0}")]
    UnknownEncoding(String),
    #[error("failed to decode contents as {0}")]
    Decode(&'static str),
    #[error("invalid INI: {0}")]
    Ini(#[from] ini::ParseError),
    #[error("section [{0}] not found")]
    MissingSection(String),
}

/// Settings describing where and how events are published.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub exchange: String,
    pub routing_key: String,
    pub host: String,
    /// `None` selects the broker default port.
    pub port: Option<u16>,
    pub virtual_host: String,
    pub username: String,
    pub password: String,
    pub heartbeat_secs: Option<u16>,
}

impl BrokerConfig {
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::new()
    }

    /// Derive the parameters handed to the broker connector.
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            virtual_host: self.virtual_host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            heartbeat_secs: self.heartbeat_secs,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("virtual_host", &self.virtual_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("heartbeat_secs", &self.heartbeat_secs)
            .finish()
    }
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, String) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: impl Into<String>) -> Self {
            self.$field = Some(value.into());
            self
        }
    };
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for [`BrokerConfig`].
#[derive(Clone, Debug, Default)]
pub struct BrokerConfigBuilder {
    exchange: Option<String>,
    routing_key: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    virtual_host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    heartbeat_secs: Option<u16>,
}

impl BrokerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    option_setter!(
        #[doc = "Set the exchange events are published to."]
        with_exchange,
        exchange,
        String
    );
    option_setter!(with_routing_key, routing_key, String);
    option_setter!(with_host, host, String);
    option_setter!(with_port, port, u16);
    option_setter!(with_virtual_host, virtual_host, String);
    option_setter!(with_username, username, String);
    option_setter!(with_password, password, String);
    option_setter!(
        #[doc = "Request a heartbeat interval in seconds."]
        with_heartbeat_secs,
        heartbeat_secs,
        u16
    );

    /// Validate presence of the required settings and build the config.
    pub fn build(self) -> Result<BrokerConfig, ConfigError> {
        Ok(BrokerConfig {
            exchange: self.exchange.ok_or(ConfigError::Missing("exchange"))?,
            routing_key: self.routing_key.unwrap_or_default(),
            host: self.host.ok_or(ConfigError::Missing("host"))?,
            port: self.port,
            virtual_host: self
                .virtual_host
                .unwrap_or_else(|| DEFAULT_VIRTUAL_HOST.to_owned()),
            username: self.username.ok_or(ConfigError::Missing("username"))?,
            password: self.password.ok_or(ConfigError::Missing("password"))?,
            heartbeat_secs: self.heartbeat_secs,
        })
    }
}
