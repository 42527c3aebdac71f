//! Top-level lifecycle: build every subsystem once from a loaded
//! [`ChatConfig`], then run until a [`Signal::Shutdown`] is observed.

use std::{net::SocketAddr, sync::Arc, sync::LazyLock};

use chat_cache::RedisCache;
use chat_common::{internal, logging, tracing, Signal};
use chat_dispatch::{DeliveryAck, Dispatcher, Ingress, SessionSink};
use chat_gateway::{GatewayDeps, GatewayServer, GatewaySink};
use chat_health::{HealthChecker, HealthServer};
use chat_queue::{AmqpQueue, ConsumeHandler, MessageQueue};
use chat_registry::ConnectionRegistry;
use chat_store::MessageStore;
use chat_tracing::traced;
use tokio::sync::broadcast;

use crate::config::ChatConfig;

static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

#[traced(instrument(level = tracing::Level::TRACE))]
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered -- enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!("terminate signal received, shutting down");
        }
    };

    let mut receiver = SHUTDOWN_BROADCAST.subscribe();

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    loop {
        tokio::select! {
            sig = receiver.recv() => {
                match sig {
                    Ok(s) => tracing::debug!("received {s:?}"),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(e) => tracing::debug!("received: {e:?}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    Ok(())
}

/// The whole chat delivery service, assembled from a single [`ChatConfig`].
pub struct Chat {
    config: ChatConfig,
}

impl Chat {
    #[must_use]
    pub const fn new(config: ChatConfig) -> Self {
        Self { config }
    }

    /// Builds every subsystem from the loaded configuration, then races the
    /// gateway, the queue consumer, and the health server against a
    /// coordinated shutdown.
    ///
    /// # Errors
    /// Returns an error if any backend (store, cache, queue, health server)
    /// fails to come up, or if a running component exits with an error.
    #[traced(instrument(level = tracing::Level::TRACE, skip_all, err), timing(precision = "s"))]
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();
        internal!("chat delivery service starting");

        let ChatConfig {
            gateway: gateway_config,
            store: store_config,
            cache: cache_config,
            queue: queue_config,
            metrics: metrics_config,
            health: health_config,
        } = self.config;

        let store: Arc<dyn MessageStore> = store_config.into_store().await?;
        let cache: Arc<dyn chat_cache::InboxCache> = Arc::new(RedisCache::connect(&cache_config).await?);
        let queue = Arc::new(AmqpQueue::new(queue_config));
        let registry = Arc::new(ConnectionRegistry::new());

        chat_metrics::init_metrics(&metrics_config)?;

        let sink: Arc<dyn SessionSink> = Arc::new(GatewaySink::new(registry.clone()));
        let ingress = Arc::new(Ingress::new(store.clone(), queue.clone() as Arc<dyn MessageQueue>));
        let delivery_ack = Arc::new(DeliveryAck::new(store.clone(), cache.clone()));
        let dispatcher: Arc<dyn ConsumeHandler> = Arc::new(Dispatcher::new(cache.clone(), sink));

        let server_id = gateway_config.server_id.clone();
        let bind_address: SocketAddr = format!("[::]:{}", gateway_config.port).parse()?;
        let deps = Arc::new(GatewayDeps {
            registry,
            cache,
            store,
            ingress,
            delivery_ack,
            server_id,
        });
        let gateway = GatewayServer::new(bind_address, deps);

        let checker = Arc::new(HealthChecker::new(health_config.max_queue_size));
        checker.set_store_ready(true);
        checker.set_cache_ready(true);
        checker.set_queue_ready(true);
        checker.set_gateway_ready(true);
        let health = HealthServer::new(health_config, checker).await?;

        internal!("every subsystem initialised, serving");

        let ret = tokio::select! {
            r = gateway.serve(SHUTDOWN_BROADCAST.subscribe()) => r,
            r = queue.consume(dispatcher, SHUTDOWN_BROADCAST.subscribe()) => r.map_err(anyhow::Error::from),
            r = health.serve(SHUTDOWN_BROADCAST.subscribe()) => r.map_err(anyhow::Error::from),
            r = shutdown() => r,
        };

        internal!("shutting down");

        ret
    }
}
