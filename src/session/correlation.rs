//! Reply correlation.
//!
//! The wire protocol carries no request identifiers, so a reply is matched
//! to a request by arrival order and command kind: the next decoded message
//! of the requested kind resolves the single pending waiter. Registering a
//! new waiter replaces the old one, whose receiver then observes a closed
//! channel instead of a wrong reply.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::protocol::{CommandKind, ProtocolMessage};

#[derive(Debug)]
struct Waiter {
    id: u64,
    kind: CommandKind,
    tx: oneshot::Sender<String>,
}

type Slot = Arc<Mutex<Option<Waiter>>>;

/// Holds at most one pending reply waiter.
#[derive(Debug, Default)]
pub(crate) struct Correlator {
    slot: Slot,
    next_id: AtomicU64,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for the next reply of the given kind.
    pub(crate) fn register(&self, kind: CommandKind) -> PendingReply {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        let replaced = lock(&self.slot).replace(Waiter { id, kind, tx });
        if let Some(old) = replaced {
            tracing::warn!("reply waiter {} replaced by {}", old.id, id);
        }

        PendingReply {
            id,
            rx,
            slot: Arc::clone(&self.slot),
        }
    }

    /// Hands a reply to the pending waiter if it asked for that kind.
    ///
    /// Returns true if a waiter received it.
    pub(crate) fn resolve(&self, reply: &ProtocolMessage) -> bool {
        let waiter = {
            let mut slot = lock(&self.slot);
            let answers = match slot.as_ref() {
                Some(waiter) if waiter.kind == reply.kind() => true,
                Some(waiter) => {
                    tracing::debug!(
                        "{} reply does not answer waiter {} ({})",
                        reply.kind(),
                        waiter.id,
                        waiter.kind
                    );
                    false
                }
                None => false,
            };
            if answers { slot.take() } else { None }
        };

        let Some(waiter) = waiter else {
            return false;
        };
        tracing::trace!("resolving reply waiter {}", waiter.id);
        waiter.tx.send(reply.payload().to_owned()).is_ok()
    }

    /// Returns true if a waiter is registered.
    pub(crate) fn is_pending(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

fn lock(slot: &Slot) -> std::sync::MutexGuard<'_, Option<Waiter>> {
    // The slot holds no invariants a panic could break.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a registered waiter.
///
/// Dropping the handle unregisters the waiter, so a late reply can never
/// resolve a request that already gave up.
#[derive(Debug)]
pub(crate) struct PendingReply {
    id: u64,
    rx: oneshot::Receiver<String>,
    slot: Slot,
}

impl PendingReply {
    /// Waits for the reply payload.
    ///
    /// Returns `None` if the waiter was replaced or the session went away.
    pub(crate) async fn recv(&mut self) -> Option<String> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|w| w.id == self.id) {
            *slot = None;
        }
    }
}
