//! Broker delivery and its connection state machine.
//!
//! [`BrokerDelivery`] formats events and publishes them to an exchange. The
//! connection is opened lazily, dropped on any failure and re-opened by the
//! next publish. Connection state lives in one mutex so setup, publish and
//! teardown never interleave.

use std::sync::Arc;

use log::{debug, error};
use parking_lot::Mutex;
use rand::Rng;

use super::{
    client::{
        BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ConnectionParams,
        distribution_headers,
    },
    config::BrokerConfig,
};
use crate::{
    failover::{Delivery, DeliveryError, FailoverSink},
    formatter::SharedFormatter,
    log_record::LogEvent,
};

/// Failover sink publishing to a broker exchange.
pub type BrokerAppender = FailoverSink<BrokerDelivery>;

/// An open connection and its channel, always held together.
struct ConnectionHandle {
    id: u64,
    connection: Box<dyn BrokerConnection>,
    channel: Box<dyn BrokerChannel>,
}

impl ConnectionHandle {
    fn is_usable(&self) -> bool {
        self.connection.is_open() && self.channel.is_open()
    }

    /// Close the channel then the connection, ignoring failures of either.
    fn close(mut self) {
        if let Err(err) = self.channel.close() {
            debug!("ignoring channel close failure: {err}");
        }
        if let Err(err) = self.connection.close() {
            debug!("ignoring connection close failure: {err}");
        }
    }
}

struct ConnectionState {
    params: Option<ConnectionParams>,
    handle: Option<ConnectionHandle>,
    needs_reconnect: bool,
    stopped: bool,
    next_id: u64,
}

impl ConnectionState {
    fn needs_connect(&self) -> bool {
        self.needs_reconnect || !self.handle.as_ref().is_some_and(ConnectionHandle::is_usable)
    }

    fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        self.needs_reconnect = true;
    }
}

/// Publishes formatted events to a broker exchange.
pub struct BrokerDelivery {
    name: String,
    config: BrokerConfig,
    formatter: SharedFormatter,
    connector: Arc<dyn BrokerConnector>,
    state: Mutex<ConnectionState>,
}

impl BrokerDelivery {
    pub fn new(
        name: impl Into<String>,
        config: BrokerConfig,
        formatter: impl Into<SharedFormatter>,
        connector: Arc<dyn BrokerConnector>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            formatter: formatter.into(),
            connector,
            state: Mutex::new(ConnectionState {
                params: None,
                handle: None,
                needs_reconnect: true,
                stopped: false,
                next_id: 0,
            }),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Open a connection if none is usable.
    ///
    /// A no-op when connected and no reconnect is pending. Fails once the
    /// delivery has been stopped.
    pub fn connect(&self) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        self.connect_locked(&mut state)
    }

    /// Make sure a usable connection exists before publishing.
    pub fn ensure_connected(&self) -> Result<(), BrokerError> {
        self.connect()
    }

    /// Close any open channel and connection and require a reconnect.
    pub fn disconnect(&self) {
        self.state.lock().disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    pub fn needs_reconnect(&self) -> bool {
        self.state.lock().needs_reconnect
    }

    /// Identifier of the held connection; changes on every reconnect.
    pub fn connection_id(&self) -> Option<u64> {
        self.state.lock().handle.as_ref().map(|h| h.id)
    }

    fn connect_locked(&self, state: &mut ConnectionState) -> Result<(), BrokerError> {
        if state.stopped {
            return Err(BrokerError::Connect(format!("[{}] is stopped", self.name)));
        }
        if !state.needs_connect() {
            return Ok(());
        }
        state.disconnect();
        let params = state.params.get_or_insert_with(|| self.config.connection_params());
        let mut connection = self.connector.connect(params)?;
        let channel = match connection.open_channel() {
            Ok(channel) => channel,
            Err(err) => {
                if let Err(close_err) = connection.close() {
                    debug!("ignoring connection close failure: {close_err}");
                }
                return Err(err);
            }
        };
        state.next_id += 1;
        state.handle = Some(ConnectionHandle {
            id: state.next_id,
            connection,
            channel,
        });
        state.needs_reconnect = false;
        debug!("[{}] connected to broker at {}", self.name, self.config.host);
        Ok(())
    }
}

impl Delivery for BrokerDelivery {
    fn start(&self) {
        let mut state = self.state.lock();
        state.params = Some(self.config.connection_params());
        state.stopped = false;
        if let Err(err) = self.connect_locked(&mut state) {
            if err.is_timeout() {
                error!("[{}] Timeout when connecting to broker: {err}", self.name);
            } else {
                error!("[{}] Unable to connect to broker: {err}", self.name);
            }
        }
    }

    fn deliver(&self, event: &LogEvent) -> Result<(), DeliveryError> {
        let payload = self.formatter.format(event)?;
        let mut state = self.state.lock();
        if state.stopped {
            return Err(DeliveryError::Stopped);
        }
        self.connect_locked(&mut state).map_err(DeliveryError::Connect)?;
        let headers = distribution_headers(rand::thread_rng().r#gen());
        let Some(handle) = state.handle.as_mut() else {
            return Err(DeliveryError::Connect(BrokerError::Channel(
                "no channel after connect".into(),
            )));
        };
        handle
            .channel
            .publish(&self.config.exchange, &self.config.routing_key, &headers, &payload)
            .map_err(DeliveryError::Publish)
    }

    fn on_failure(&self, _event: &LogEvent, error: &DeliveryError) {
        error!("[{}] Could not publish log message to broker: {error}", self.name);
        self.disconnect();
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.disconnect();
        state.stopped = true;
    }
}

impl BrokerAppender {
    /// Build an appender publishing through `connector`.
    pub fn with_connector(
        name: impl Into<String>,
        config: BrokerConfig,
        formatter: impl Into<SharedFormatter>,
        connector: Arc<dyn BrokerConnector>,
    ) -> Self {
        let name = name.into();
        let delivery = BrokerDelivery::new(name.clone(), config, formatter, connector);
        FailoverSink::new(name, delivery)
    }

    /// Build an appender publishing through the lapin client.
    #[cfg(feature = "amqp")]
    pub fn with_lapin(
        name: impl Into<String>,
        config: BrokerConfig,
        formatter: impl Into<SharedFormatter>,
    ) -> Self {
        Self::with_connector(
            name,
            config,
            formatter,
            Arc::new(super::lapin_client::LapinConnector::default()),
        )
    }
}
