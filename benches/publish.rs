//! Benchmarks for the appender publish path against the in-memory broker.

use std::sync::Arc;

use amqp_appender::{
    BrokerAppender, BrokerConfig, DefaultFormatter, Formatter, JsonFormatter, LogEvent, LogLevel,
    MsgPackFormatter, Sink, test_utils::MockConnector,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn config() -> BrokerConfig {
    BrokerConfig::builder()
        .with_exchange("logs")
        .with_routing_key("bench")
        .with_host("localhost")
        .with_username("guest")
        .with_password("guest")
        .build()
        .expect("config builds")
}

fn bench_formatters(c: &mut Criterion) {
    let event = LogEvent::new("bench", LogLevel::Info, "request served")
        .with_key_value("status", "200")
        .with_key_value("path", "/api/orders");
    let mut group = c.benchmark_group("format");
    group.bench_function("default", |b| {
        b.iter(|| DefaultFormatter.format(black_box(&event)))
    });
    group.bench_function("json", |b| b.iter(|| JsonFormatter.format(black_box(&event))));
    group.bench_function("msgpack", |b| {
        b.iter(|| MsgPackFormatter.format(black_box(&event)))
    });
    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let event = LogEvent::new("bench", LogLevel::Info, "request served");

    let connected = MockConnector::new();
    let appender =
        BrokerAppender::with_connector("bench", config(), DefaultFormatter, Arc::new(connected));
    appender.start();
    c.bench_function("append_connected", |b| {
        b.iter(|| appender.append(black_box(&event)))
    });

    let failing = MockConnector::new();
    failing.set_publish_failure(true);
    let failover =
        BrokerAppender::with_connector("bench", config(), DefaultFormatter, Arc::new(failing));
    failover.start();
    c.bench_function("append_failover_reconnect", |b| {
        b.iter(|| failover.append(black_box(&event)))
    });
}

criterion_group!(benches, bench_formatters, bench_append);
criterion_main!(benches);
