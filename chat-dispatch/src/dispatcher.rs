//! The consume path (§4.6): decide live-vs-offline, deposit, and ack.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use chat_cache::{CachedMessage, InboxCache};
use chat_common::{error::Result, events::IncomingMessageEvent};
use chat_queue::{ConsumeHandler, QueueItem};
use tracing::{info, warn};

use crate::sink::SessionSink;

pub struct Dispatcher {
    cache: Arc<dyn InboxCache>,
    sink: Arc<dyn SessionSink>,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(cache: Arc<dyn InboxCache>, sink: Arc<dyn SessionSink>) -> Self {
        Self { cache, sink }
    }

    /// Returns whether the message was delivered to a live session, so the
    /// caller can record the right outcome counter.
    async fn dispatch_inner(&self, item: QueueItem) -> Result<bool> {
        let is_online = self.cache.is_user_online(&item.receiver_id).await?;

        if is_online {
            let event = IncomingMessageEvent::new(
                item.message_id,
                item.sender_id.clone(),
                item.content.clone(),
                item.timestamp_millis(),
            );
            let delivered = self.sink.send_to_user(&item.receiver_id, event).await;
            if delivered {
                info!(message_id = %item.message_id, "delivered live");
                return Ok(true);
            }
            warn!(message_id = %item.message_id, "presence stale, falling back to offline deposit");
        }

        self.cache.add_to_inbox(&item.receiver_id, item.message_id).await?;
        let timestamp = item.timestamp_millis();
        self.cache
            .cache_message(
                item.message_id,
                &CachedMessage {
                    sender_id: item.sender_id,
                    receiver_id: item.receiver_id,
                    timestamp,
                    content: item.content,
                },
            )
            .await?;

        Ok(false)
    }

    async fn dispatch(&self, item: QueueItem) -> Result<()> {
        let started = Instant::now();
        let result = self.dispatch_inner(item).await;

        if chat_metrics::is_enabled() {
            let metrics = chat_metrics::metrics();
            metrics.dispatch_duration_seconds.record(started.elapsed().as_secs_f64(), &[]);
            match result {
                Ok(true) => metrics.messages_delivered_live_total.add(1, &[]),
                Ok(false) => metrics.messages_deposited_offline_total.add(1, &[]),
                Err(_) => {}
            }
        }

        result.map(|_delivered_live| ())
    }
}

#[async_trait]
impl ConsumeHandler for Dispatcher {
    async fn handle(&self, item: QueueItem) -> Result<()> {
        self.dispatch(item).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chat_common::{ids::MessageId, UserId};

    use super::*;

    struct FakeCache {
        online: bool,
        added: Mutex<Vec<(UserId, MessageId)>>,
        cached: Mutex<Vec<MessageId>>,
    }

    impl FakeCache {
        fn new(online: bool) -> Self {
            Self {
                online,
                added: Mutex::new(Vec::new()),
                cached: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl InboxCache for FakeCache {
        async fn add_to_inbox(&self, user_id: &UserId, message_id: MessageId) -> Result<()> {
            self.added.lock().unwrap().push((user_id.clone(), message_id));
            Ok(())
        }
        async fn get_inbox(&self, _: &UserId) -> Result<Vec<MessageId>> {
            Ok(Vec::new())
        }
        async fn remove_from_inbox(&self, _: &UserId, _: MessageId) -> Result<()> {
            Ok(())
        }
        async fn clear_inbox(&self, _: &UserId) -> Result<()> {
            Ok(())
        }
        async fn set_user_connection(&self, _: &UserId, _: &str) -> Result<()> {
            Ok(())
        }
        async fn is_user_online(&self, _: &UserId) -> Result<bool> {
            Ok(self.online)
        }
        async fn remove_user_connection(&self, _: &UserId) -> Result<()> {
            Ok(())
        }
        async fn get_user_server_id(&self, _: &UserId) -> Result<Option<String>> {
            Ok(None)
        }
        async fn cache_message(&self, message_id: MessageId, _: &CachedMessage) -> Result<()> {
            self.cached.lock().unwrap().push(message_id);
            Ok(())
        }
    }

    struct FakeSink {
        delivers: bool,
    }

    #[async_trait]
    impl SessionSink for FakeSink {
        async fn send_to_user(&self, _user_id: &UserId, _event: IncomingMessageEvent) -> bool {
            self.delivers
        }
    }

    fn sample_item() -> QueueItem {
        QueueItem::new(
            MessageId::generate(),
            UserId::new("u_alice"),
            UserId::new("u_bob"),
            "hi".to_string(),
            1_700_000_000_000,
        )
    }

    #[tokio::test]
    async fn online_receiver_with_a_live_sink_is_delivered_without_touching_the_inbox() {
        let cache = Arc::new(FakeCache::new(true));
        let sink = Arc::new(FakeSink { delivers: true });
        let dispatcher = Dispatcher::new(cache.clone(), sink);

        dispatcher.dispatch(sample_item()).await.unwrap();

        assert!(cache.added.lock().unwrap().is_empty());
        assert!(cache.cached.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_receiver_is_deposited_to_the_inbox() {
        let cache = Arc::new(FakeCache::new(false));
        let sink = Arc::new(FakeSink { delivers: true });
        let dispatcher = Dispatcher::new(cache.clone(), sink);

        let item = sample_item();
        let message_id = item.message_id;
        dispatcher.dispatch(item).await.unwrap();

        assert_eq!(cache.added.lock().unwrap().as_slice(), [(UserId::new("u_bob"), message_id)]);
        assert_eq!(cache.cached.lock().unwrap().as_slice(), [message_id]);
    }

    #[tokio::test]
    async fn online_but_sink_failure_falls_back_to_offline_deposit() {
        let cache = Arc::new(FakeCache::new(true));
        let sink = Arc::new(FakeSink { delivers: false });
        let dispatcher = Dispatcher::new(cache.clone(), sink);

        let item = sample_item();
        let message_id = item.message_id;
        dispatcher.dispatch(item).await.unwrap();

        assert_eq!(cache.added.lock().unwrap().as_slice(), [(UserId::new("u_bob"), message_id)]);
    }
}
