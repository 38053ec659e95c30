//! Blocking broker client built on `lapin`.
//!
//! lapin is asynchronous; every call here is driven to completion on the
//! calling thread with `futures::executor::block_on`, so the appender keeps
//! its synchronous contract.

use std::io;

use futures::executor::block_on;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::BasicPublishOptions,
    types::{AMQPValue, FieldTable, ShortString},
    uri::{AMQPAuthority, AMQPQueryString, AMQPScheme, AMQPUri, AMQPUserInfo},
};

use super::client::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ConnectionParams,
    MessageHeaders,
};

/// Port used when the config leaves it unset.
pub const DEFAULT_AMQP_PORT: u16 = 5672;

const REPLY_SUCCESS: u16 = 200;

/// Connector opening lapin connections.
#[derive(Clone, Default)]
pub struct LapinConnector {
    properties: ConnectionProperties,
}

impl std::fmt::Debug for LapinConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LapinConnector")
    }
}

impl LapinConnector {
    pub fn new(properties: ConnectionProperties) -> Self {
        Self { properties }
    }
}

pub(crate) fn amqp_uri(params: &ConnectionParams) -> AMQPUri {
    AMQPUri {
        scheme: AMQPScheme::AMQP,
        authority: AMQPAuthority {
            userinfo: AMQPUserInfo {
                username: params.username.clone(),
                password: params.password.clone(),
            },
            host: params.host.clone(),
            port: params.port.unwrap_or(DEFAULT_AMQP_PORT),
        },
        vhost: params.virtual_host.clone(),
        query: AMQPQueryString {
            heartbeat: params.heartbeat_secs,
            connection_timeout: Some(
                u64::try_from(params.connect_timeout.as_millis()).unwrap_or(u64::MAX),
            ),
            ..Default::default()
        },
    }
}

fn connect_error(err: lapin::Error) -> BrokerError {
    match &err {
        lapin::Error::IOError(io_err) if io_err.kind() == io::ErrorKind::TimedOut => {
            BrokerError::Timeout(err.to_string())
        }
        _ => BrokerError::Connect(err.to_string()),
    }
}

fn field_table(headers: &MessageHeaders) -> FieldTable {
    let mut table = FieldTable::default();
    for (key, value) in headers {
        table.insert(ShortString::from(key.clone()), AMQPValue::LongInt(*value));
    }
    table
}

impl BrokerConnector for LapinConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn BrokerConnection>, BrokerError> {
        let connection = block_on(Connection::connect_uri(
            amqp_uri(params),
            self.properties.clone(),
        ))
        .map_err(connect_error)?;
        Ok(Box::new(LapinConnection { connection }))
    }
}

struct LapinConnection {
    connection: Connection,
}

impl BrokerConnection for LapinConnection {
    fn is_open(&self) -> bool {
        self.connection.status().connected()
    }

    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let channel = block_on(self.connection.create_channel())
            .map_err(|err| BrokerError::Channel(err.to_string()))?;
        Ok(Box::new(LapinChannel { channel }))
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        block_on(self.connection.close(REPLY_SUCCESS, "appender closing"))
            .map_err(|err| BrokerError::Close(err.to_string()))
    }
}

struct LapinChannel {
    channel: Channel,
}

impl BrokerChannel for LapinChannel {
    fn is_open(&self) -> bool {
        self.channel.status().connected()
    }

    fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        headers: &MessageHeaders,
        payload: &[u8],
    ) -> Result<(), BrokerError> {
        let properties = BasicProperties::default().with_headers(field_table(headers));
        block_on(self.channel.basic_publish(
            exchange,
            routing_key,
            BasicPublishOptions::default(),
            payload,
            properties,
        ))
        .map(drop)
        .map_err(|err| BrokerError::Publish(err.to_string()))
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        block_on(self.channel.close(REPLY_SUCCESS, "appender closing"))
            .map_err(|err| BrokerError::Close(err.to_string()))
    }
}
