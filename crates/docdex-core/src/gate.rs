//! Refresh read gate

use tokio::sync::watch;

/// Binary open/closed signal readers observe before trusting the namespace.
///
/// Default open; closed for the duration of a refresh. Lookups await
/// [`wait_open`](Self::wait_open) *before* consulting the symbol table — the
/// canonical ordering that keeps a reader from treating a mid-rebuild table
/// as authoritative.
#[derive(Debug)]
pub struct ReadGate {
    signal: watch::Sender<bool>,
}

impl ReadGate {
    /// Create an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signal: watch::channel(true).0,
        }
    }

    /// Close the gate; readers start queueing on [`wait_open`](Self::wait_open).
    pub fn close(&self) {
        self.signal.send_replace(false);
    }

    /// Open the gate, releasing every queued reader.
    pub fn open(&self) {
        self.signal.send_replace(true);
    }

    /// Current state, for logging and fast paths only — never a substitute
    /// for [`wait_open`](Self::wait_open).
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolve once the gate is open; immediate when it already is.
    pub async fn wait_open(&self) {
        let mut signal = self.signal.subscribe();
        // The sender lives as long as self, so this cannot error.
        let _ = signal.wait_for(|open| *open).await;
    }
}

impl Default for ReadGate {
    fn default() -> Self {
        Self::new()
    }
}
