//! The AMQP-backed [`MessageQueue`]: persistent delivery, manual ack, and an
//! auto-reconnecting channel wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use chat_common::ChatError;
use futures_util::StreamExt;
use lapin::{
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, warn};

use crate::{config::QueueConfig, item::QueueItem};

pub type Result<T> = chat_common::error::Result<T>;

/// Publishes persistent [`QueueItem`]s to the configured durable queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, item: &QueueItem) -> Result<()>;
}

/// Receives a decoded [`QueueItem`] off the consumer loop. `Ok` acks the
/// delivery; `Err` nacks it with requeue, per the queue's deliberate
/// pessimism around transient failures.
#[async_trait]
pub trait ConsumeHandler: Send + Sync {
    async fn handle(&self, item: QueueItem) -> Result<()>;
}

struct Session {
    _connection: Connection,
    channel: Channel,
}

/// An AMQP connection that reconnects on loss, consulted by both
/// [`AmqpQueue::publish`] and [`AmqpQueue::consume`].
pub struct AmqpQueue {
    config: QueueConfig,
    session: Mutex<Option<Session>>,
}

impl AmqpQueue {
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Channel> {
        let connection = Connection::connect(&self.config.amqp_uri(), ConnectionProperties::default())
            .await
            .map_err(|e| ChatError::QueueConnectionError(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| ChatError::QueueConnectionError(e.to_string()))?;
        channel
            .queue_declare(
                &self.config.queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| ChatError::QueueConnectionError(e.to_string()))?;

        let mut guard = self.session.lock().await;
        *guard = Some(Session {
            _connection: connection,
            channel: channel.clone(),
        });
        Ok(channel)
    }

    async fn channel(&self) -> Result<Channel> {
        let existing = self.session.lock().await.as_ref().map(|s| s.channel.clone());
        match existing {
            Some(channel) if channel.status().connected() => Ok(channel),
            _ => self.connect().await,
        }
    }

    /// Runs the consumer loop until `shutdown` fires, reconnecting on
    /// connection loss after `reconnect_secs`.
    ///
    /// # Errors
    /// Returns [`ChatError::QueueConsumeFailed`] if the consumer cannot be
    /// established even after reconnecting.
    pub async fn consume(
        &self,
        handler: Arc<dyn ConsumeHandler>,
        mut shutdown: broadcast::Receiver<chat_common::Signal>,
    ) -> Result<()> {
        loop {
            let channel = match self.channel().await {
                Ok(channel) => channel,
                Err(err) => {
                    warn!(error = %err, "queue connect failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_secs(self.config.reconnect_secs)).await;
                    continue;
                }
            };

            let mut consumer = match channel
                .basic_consume(
                    &self.config.queue_name,
                    "chat-dispatcher",
                    BasicConsumeOptions::default(),
                    FieldTable::default(),
                )
                .await
            {
                Ok(consumer) => consumer,
                Err(e) => {
                    warn!(error = %e, "consumer setup failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_secs(self.config.reconnect_secs)).await;
                    continue;
                }
            };

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => return Ok(()),
                    next = consumer.next() => {
                        let Some(delivery) = next else {
                            warn!("queue consumer stream ended, reconnecting");
                            break;
                        };
                        let Ok(delivery) = delivery else {
                            warn!("queue delivery error, reconnecting");
                            break;
                        };

                        let outcome = match serde_json::from_slice::<QueueItem>(&delivery.data) {
                            Ok(item) => handler.handle(item).await,
                            Err(e) => {
                                error!(error = %e, "malformed queue payload, nacking with requeue");
                                Err(ChatError::Internal(e.to_string()))
                            }
                        };

                        let ack_result = if outcome.is_ok() {
                            delivery.ack(BasicAckOptions::default()).await
                        } else {
                            delivery
                                .nack(BasicNackOptions { requeue: true, ..BasicNackOptions::default() })
                                .await
                        };
                        if let Err(e) = ack_result {
                            error!(error = %e, "failed to ack/nack queue delivery");
                        }
                    }
                }
            }

            tokio::time::sleep(std::time::Duration::from_secs(self.config.reconnect_secs)).await;
        }
    }
}

#[async_trait]
impl MessageQueue for AmqpQueue {
    async fn publish(&self, item: &QueueItem) -> Result<()> {
        let payload = serde_json::to_vec(item)
            .map_err(|e| ChatError::QueuePublishFailed(e.to_string()))?;

        let channel = self.channel().await?;
        channel
            .basic_publish(
                "",
                &self.config.queue_name,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| ChatError::QueuePublishFailed(e.to_string()))?
            .await
            .map_err(|e| ChatError::QueuePublishFailed(e.to_string()))?;

        Ok(())
    }
}
