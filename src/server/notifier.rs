// src/server/notifier.rs

use tokio::sync::broadcast;
use tracing::debug;

/// What connected browsers should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Full page reload.
    Reload,
    /// Re-fetch stylesheets without reloading the page.
    InjectCss,
}

impl ReloadKind {
    /// SSE event name sent to the client script.
    pub fn event_name(self) -> &'static str {
        match self {
            ReloadKind::Reload => "reload",
            ReloadKind::InjectCss => "inject",
        }
    }
}

/// Fan-out of reload notifications to every connected browser.
///
/// Each SSE connection holds one receiver, so the receiver count is the
/// number of connected clients.
#[derive(Debug, Clone)]
pub struct ReloadNotifier {
    tx: broadcast::Sender<ReloadKind>,
}

impl ReloadNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadKind> {
        self.tx.subscribe()
    }

    /// Push `kind` to all clients; returns how many received it.
    pub fn notify(&self, kind: ReloadKind) -> usize {
        let delivered = self.tx.send(kind).unwrap_or(0);
        debug!(kind = kind.event_name(), clients = delivered, "reload notification");
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}
