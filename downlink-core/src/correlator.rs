use dashmap::{mapref::entry::Entry, DashMap};
use downlink_error::{RouteError, RouteResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Pending reply slot, consumed by exactly one inbound reply.
struct PendingRequest {
    tx: oneshot::Sender<Value>,
    label: &'static str,
    created_at: Instant,
}

/// Bridges the asynchronous delivery path back to synchronous callers.
///
/// Dispatch registers a pending slot keyed by the command's generated
/// id, sends, then waits on the slot. The inbound reply path (MQTT
/// subscription handler or tunnel reader) demultiplexes replies by id
/// and resolves the matching slot. Registration must precede the
/// network write so a fast reply cannot race past the waiter.
#[derive(Default)]
pub struct Correlator {
    pending: Arc<DashMap<String, PendingRequest>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending request and obtain its waiter.
    ///
    /// Fails fast with `DuplicateRequestId` when the id is already
    /// pending; reusing an in-flight id is a caller bug, not a
    /// transient condition.
    pub fn register(&self, id: &str, label: &'static str) -> RouteResult<ReplyWaiter> {
        match self.pending.entry(id.to_string()) {
            Entry::Occupied(_) => Err(RouteError::DuplicateRequestId { id: id.to_string() }),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(PendingRequest {
                    tx,
                    label,
                    created_at: Instant::now(),
                });
                Ok(ReplyWaiter {
                    id: id.to_string(),
                    rx,
                    pending: Arc::clone(&self.pending),
                    settled: false,
                })
            }
        }
    }

    /// Deliver a reply from the inbound path.
    ///
    /// Returns `true` when a waiter was resolved. An unknown id means
    /// the request already timed out or was cancelled; the reply is
    /// dropped silently.
    pub fn resolve(&self, id: &str, reply: Value) -> bool {
        match self.pending.remove(id) {
            Some((_, slot)) => {
                let waited = slot.created_at.elapsed();
                if slot.tx.send(reply).is_ok() {
                    tracing::debug!(id, label = slot.label, waited_ms = waited.as_millis() as u64, "reply correlated");
                    true
                } else {
                    // Waiter future dropped between removal and send.
                    false
                }
            }
            None => {
                tracing::debug!(id, "late reply dropped (no pending request)");
                false
            }
        }
    }

    /// Number of in-flight requests, for observability.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Ids of in-flight requests, for observability.
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.iter().map(|e| e.key().clone()).collect()
    }
}

/// One-shot handle that blocks its caller until the reply arrives or
/// the timeout fires. Dropping the waiter deregisters the pending
/// request, which is how caller-side cancellation is layered on top.
pub struct ReplyWaiter {
    id: String,
    rx: oneshot::Receiver<Value>,
    pending: Arc<DashMap<String, PendingRequest>>,
    settled: bool,
}

impl ReplyWaiter {
    /// Wait for the correlated reply.
    ///
    /// On timeout the pending slot is removed; a reply arriving
    /// afterwards is dropped by `Correlator::resolve`.
    pub async fn wait(mut self, timeout: Duration) -> RouteResult<Value> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(reply)) => {
                self.settled = true;
                Ok(reply)
            }
            // Sender dropped without a reply (correlator torn down).
            Ok(Err(_)) | Err(_) => {
                self.pending.remove(&self.id);
                self.settled = true;
                Err(RouteError::RequestTimeout {
                    id: self.id.clone(),
                })
            }
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ReplyWaiter {
    fn drop(&mut self) {
        if !self.settled {
            self.pending.remove(&self.id);
        }
    }
}
