//! Reload signaling between the coordination core and the UI layer.
//!
//! The original client stashed a reload callback on a global; here the
//! directory and coordinator publish on an explicit broadcast channel and
//! whoever renders subscribes. Publishing with no subscribers is a no-op.

use tokio::sync::broadcast;

/// Which cached view went stale after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    Friends,
    Proposals,
    Calendar,
}

#[derive(Clone, Debug)]
pub struct RefreshBus {
    tx: broadcast::Sender<Refresh>,
}

impl RefreshBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Refresh> {
        self.tx.subscribe()
    }

    pub fn publish(&self, refresh: Refresh) {
        // Send only fails when nobody is listening, which is fine
        let _ = self.tx.send(refresh);
    }
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}
