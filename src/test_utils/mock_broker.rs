//! In-memory broker client recording every call made by the appender.
//!
//! [`MockConnector`] hands out connections and channels that share one
//! recorder. Failures can be switched on per operation, and open
//! connections can be severed to imitate a broker dropping the socket.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use crate::broker::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, ConnectionParams,
    MessageHeaders,
};

/// A message captured by the mock channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Sequence number of the connection that carried the message.
    pub connection: usize,
    pub exchange: String,
    pub routing_key: String,
    pub headers: MessageHeaders,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct Recorder {
    connect_failure: Option<BrokerError>,
    channel_failure: bool,
    publish_failure: bool,
    channel_close_failure: bool,
    connection_close_failure: bool,
    connects: usize,
    channel_opens: usize,
    channel_closes: usize,
    connection_closes: usize,
    published: Vec<PublishedMessage>,
    last_params: Option<ConnectionParams>,
    live: Vec<Arc<AtomicBool>>,
}

/// Connector returning recorded in-memory connections.
#[derive(Clone, Default)]
pub struct MockConnector {
    recorder: Arc<Mutex<Recorder>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following connect attempt fail with `failure`.
    pub fn set_connect_failure(&self, failure: Option<BrokerError>) {
        self.recorder.lock().connect_failure = failure;
    }

    pub fn set_channel_failure(&self, fail: bool) {
        self.recorder.lock().channel_failure = fail;
    }

    pub fn set_publish_failure(&self, fail: bool) {
        self.recorder.lock().publish_failure = fail;
    }

    /// Make channel and/or connection close calls report errors.
    pub fn set_close_failures(&self, channel: bool, connection: bool) {
        let mut recorder = self.recorder.lock();
        recorder.channel_close_failure = channel;
        recorder.connection_close_failure = connection;
    }

    /// Mark every open connection as dropped by the broker.
    pub fn sever_connections(&self) {
        for flag in &self.recorder.lock().live {
            flag.store(false, Ordering::SeqCst);
        }
    }

    pub fn connects(&self) -> usize {
        self.recorder.lock().connects
    }

    pub fn channel_opens(&self) -> usize {
        self.recorder.lock().channel_opens
    }

    pub fn channel_closes(&self) -> usize {
        self.recorder.lock().channel_closes
    }

    pub fn connection_closes(&self) -> usize {
        self.recorder.lock().connection_closes
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.recorder.lock().published.clone()
    }

    pub fn last_params(&self) -> Option<ConnectionParams> {
        self.recorder.lock().last_params.clone()
    }
}

impl BrokerConnector for MockConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn BrokerConnection>, BrokerError> {
        let mut recorder = self.recorder.lock();
        recorder.last_params = Some(params.clone());
        if let Some(failure) = recorder.connect_failure.clone() {
            return Err(failure);
        }
        recorder.connects += 1;
        let alive = Arc::new(AtomicBool::new(true));
        recorder.live.push(Arc::clone(&alive));
        Ok(Box::new(MockConnection {
            seq: recorder.connects,
            alive,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct MockConnection {
    seq: usize,
    alive: Arc<AtomicBool>,
    recorder: Arc<Mutex<Recorder>>,
}

impl BrokerConnection for MockConnection {
    fn is_open(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let mut recorder = self.recorder.lock();
        if recorder.channel_failure {
            return Err(BrokerError::Channel("mock channel refused".into()));
        }
        recorder.channel_opens += 1;
        Ok(Box::new(MockChannel {
            connection: self.seq,
            connection_alive: Arc::clone(&self.alive),
            open: true,
            recorder: Arc::clone(&self.recorder),
        }))
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        self.alive.store(false, Ordering::SeqCst);
        let mut recorder = self.recorder.lock();
        recorder.connection_closes += 1;
        if recorder.connection_close_failure {
            return Err(BrokerError::Close("mock connection close failed".into()));
        }
        Ok(())
    }
}

struct MockChannel {
    connection: usize,
    connection_alive: Arc<AtomicBool>,
    open: bool,
    recorder: Arc<Mutex<Recorder>>,
}

impl BrokerChannel for MockChannel {
    fn is_open(&self) -> bool {
        self.open && self.connection_alive.load(Ordering::SeqCst)
    }

    fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        headers: &MessageHeaders,
        payload: &[u8],
    ) -> Result<(), BrokerError> {
        if !self.is_open() {
            return Err(BrokerError::Publish("channel is closed".into()));
        }
        let mut recorder = self.recorder.lock();
        if recorder.publish_failure {
            return Err(BrokerError::Publish("mock publish failed".into()));
        }
        recorder.published.push(PublishedMessage {
            connection: self.connection,
            exchange: exchange.to_owned(),
            routing_key: routing_key.to_owned(),
            headers: headers.clone(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        self.open = false;
        let mut recorder = self.recorder.lock();
        recorder.channel_closes += 1;
        if recorder.channel_close_failure {
            return Err(BrokerError::Close("mock channel close failed".into()));
        }
        Ok(())
    }
}
