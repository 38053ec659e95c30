//! Property tests: arbitrary failure sequences never escape `append`, every
//! failed event reaches the fallback exactly once, and a failure always
//! forces the next successful publish onto a fresh connection.

use std::sync::Arc;

use amqp_appender::{
    BrokerAppender, BrokerConfig, BrokerError, DefaultFormatter, LogEvent, LogLevel, Sink,
    test_utils::{CollectingSink, MockConnector},
};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Step {
    Ok,
    ConnectFails,
    PublishFails,
    Severed,
    Stop,
    Start,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Ok),
        2 => Just(Step::ConnectFails),
        2 => Just(Step::PublishFails),
        1 => Just(Step::Severed),
        1 => Just(Step::Stop),
        1 => Just(Step::Start),
    ]
}

fn config() -> BrokerConfig {
    BrokerConfig::builder()
        .with_exchange("logs")
        .with_host("localhost")
        .with_username("guest")
        .with_password("guest")
        .build()
        .expect("config builds")
}

proptest! {
    #[test]
    fn append_never_escapes_and_failures_reach_fallback(
        steps in proptest::collection::vec(step(), 1..40),
        with_fallback in any::<bool>(),
    ) {
        let connector = MockConnector::new();
        let appender = BrokerAppender::with_connector(
            "prop",
            config(),
            DefaultFormatter,
            Arc::new(connector.clone()),
        );
        let fallback = CollectingSink::named("fallback");
        if with_fallback {
            appender.attach_fallback(Arc::new(fallback.clone()));
        }
        appender.start();

        let mut expected_published = 0usize;
        let mut expected_fallback = 0usize;
        let mut last_connection: Option<usize> = None;
        let mut must_reconnect = false;

        for (i, step) in steps.iter().enumerate() {
            connector.set_connect_failure(None);
            connector.set_publish_failure(false);
            match step {
                Step::Stop => {
                    appender.stop();
                    must_reconnect = true;
                    continue;
                }
                Step::Start => {
                    appender.start();
                    continue;
                }
                Step::ConnectFails => {
                    connector.sever_connections();
                    connector.set_connect_failure(Some(BrokerError::Connect("down".into())));
                }
                Step::PublishFails => connector.set_publish_failure(true),
                Step::Severed => connector.sever_connections(),
                Step::Ok => {}
            }

            let before = connector.published().len();
            appender.append(&LogEvent::new("prop", LogLevel::Info, &format!("event {i}")));
            let after = connector.published();

            if !appender.is_started() {
                prop_assert_eq!(after.len(), before);
                continue;
            }
            match step {
                Step::ConnectFails | Step::PublishFails => {
                    prop_assert_eq!(after.len(), before);
                    prop_assert!(!appender.delivery().is_connected());
                    prop_assert!(appender.delivery().needs_reconnect());
                    expected_fallback += 1;
                    must_reconnect = true;
                }
                _ => {
                    prop_assert_eq!(after.len(), before + 1);
                    expected_published += 1;
                    let connection = after[before].connection;
                    if must_reconnect {
                        prop_assert_ne!(Some(connection), last_connection);
                    }
                    last_connection = Some(connection);
                    must_reconnect = false;
                }
            }
        }

        prop_assert_eq!(connector.published().len(), expected_published);
        if with_fallback {
            prop_assert_eq!(fallback.collected().len(), expected_fallback);
        } else {
            prop_assert!(fallback.collected().is_empty());
        }
    }
}
