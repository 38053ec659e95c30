//! Send/Sync guarantees for core types.

use amqp_appender::{
    BrokerAppender, BrokerConfig, BrokerConfigBuilder, FallbackSlot, SharedFormatter,
    test_utils::{CollectingSink, MockConnector},
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn configuration_is_send_sync() {
    assert_impl_all!(BrokerConfig: Send, Sync, Clone);
    assert_impl_all!(BrokerConfigBuilder: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(BrokerAppender: Send, Sync);
    assert_impl_all!(FallbackSlot: Send, Sync);
    assert_impl_all!(SharedFormatter: Send, Sync);
    assert_impl_all!(CollectingSink: Send, Sync);
    assert_impl_all!(MockConnector: Send, Sync);
}
