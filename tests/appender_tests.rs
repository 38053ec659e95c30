//! End-to-end behaviour of the broker appender through its public API.

use std::sync::Arc;

use amqp_appender::{
    BrokerAppender, BrokerConfig, BrokerError, JsonFormatter, LogEvent, LogLevel, Sink,
    broker::DISTRIBUTION_HASH_HEADER,
    test_utils::{CollectingSink, MockConnector},
};
use rstest::{fixture, rstest};

#[fixture]
fn config() -> BrokerConfig {
    BrokerConfig::builder()
        .with_exchange("logs")
        .with_routing_key("service.audit")
        .with_host("localhost")
        .with_port(5672)
        .with_virtual_host("/")
        .with_username("guest")
        .with_password("guest")
        .build()
        .expect("config builds")
}

#[rstest]
fn json_events_reach_the_exchange(config: BrokerConfig) {
    let connector = MockConnector::new();
    let appender = BrokerAppender::with_connector(
        "audit",
        config,
        JsonFormatter,
        Arc::new(connector.clone()),
    );
    appender.start();

    appender.append(
        &LogEvent::new("svc", LogLevel::Info, "user created").with_key_value("id", "7"),
    );
    appender.stop();

    let published = connector.published();
    assert_eq!(published.len(), 1);
    let body: serde_json::Value =
        serde_json::from_slice(&published[0].payload).expect("payload is json");
    assert_eq!(body["message"], "user created");
    assert_eq!(body["key_values"]["id"], "7");
    assert!(published[0].headers.contains_key(DISTRIBUTION_HASH_HEADER));
}

#[rstest]
fn outage_routes_to_fallback_then_recovers(config: BrokerConfig) {
    let connector = MockConnector::new();
    let appender = BrokerAppender::with_connector(
        "audit",
        config,
        JsonFormatter,
        Arc::new(connector.clone()),
    );
    let fallback = CollectingSink::named("stderr");
    assert!(appender.attach_fallback(Arc::new(fallback.clone())));
    appender.start();

    connector.set_connect_failure(Some(BrokerError::Connect("broker restarting".into())));
    connector.sever_connections();
    for i in 0..3 {
        appender.append(&LogEvent::new("svc", LogLevel::Warn, &format!("during outage {i}")));
    }
    connector.set_connect_failure(None);
    appender.append(&LogEvent::new("svc", LogLevel::Info, "recovered"));

    let replayed: Vec<_> = fallback
        .collected()
        .iter()
        .map(|e| e.message().to_owned())
        .collect();
    assert_eq!(
        replayed,
        vec!["during outage 0", "during outage 1", "during outage 2"]
    );
    assert_eq!(connector.published().len(), 1);
    assert_eq!(connector.connects(), 2);
    assert!(appender.delivery().is_connected());
}

#[rstest]
fn distribution_hash_varies_between_publishes(config: BrokerConfig) {
    let connector = MockConnector::new();
    let appender = BrokerAppender::with_connector(
        "audit",
        config,
        JsonFormatter,
        Arc::new(connector.clone()),
    );
    appender.start();
    for i in 0..32 {
        appender.append(&LogEvent::new("svc", LogLevel::Debug, &format!("event {i}")));
    }

    let hashes: std::collections::BTreeSet<i32> = connector
        .published()
        .iter()
        .map(|m| m.headers[DISTRIBUTION_HASH_HEADER])
        .collect();
    assert!(hashes.len() > 1, "32 random hashes should not all collide");
}

#[rstest]
fn only_the_first_fallback_is_kept(config: BrokerConfig) {
    let connector = MockConnector::new();
    let appender = BrokerAppender::with_connector(
        "audit",
        config,
        JsonFormatter,
        Arc::new(connector.clone()),
    );
    let first = CollectingSink::named("first");
    let second = CollectingSink::named("second");
    assert!(appender.attach_fallback(Arc::new(first.clone())));
    assert!(!appender.attach_fallback(Arc::new(second.clone())));
    assert_eq!(appender.fallback_count(), 1);

    appender.start();
    connector.set_publish_failure(true);
    appender.append(&LogEvent::new("svc", LogLevel::Error, "boom"));

    assert_eq!(first.collected().len(), 1);
    assert!(second.collected().is_empty());
}
