//! The registry-facing identity of a live session: cheap to clone, carries
//! nothing but a sender the session's event loop drains into its socket and
//! a cancellation token the registry can trigger to close a superseded one.

use std::sync::atomic::{AtomicU64, Ordering};

use chat_registry::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct SessionHandle {
    id: u64,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
    cancel: CancellationToken,
}

impl SessionHandle {
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<serde_json::Value>) -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            outbound,
            cancel: CancellationToken::new(),
        }
    }

    /// Queues `value` for the session's own task to write to its socket.
    /// Returns `false` if the session has already torn down its receiver.
    pub fn push(&self, value: serde_json::Value) -> bool {
        self.outbound.send(value).is_ok()
    }

    /// Tells the session owning this handle to stop servicing its transport
    /// and tear down. Called by the registry when a newer session for the
    /// same user evicts this one.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolves once `cancel()` has been called on this handle or any clone
    /// of it.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

impl Handle for SessionHandle {
    type Id = u64;

    fn id(&self) -> Self::Id {
        self.id
    }
}
