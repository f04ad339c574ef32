use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::models::AuthChangeEvent;

/// Fan-out point for auth change notifications. Each subscriber gets every
/// event emitted after it subscribed, in order.
#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<AuthChangeEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.sender.subscribe())
    }

    /// Deliver an event to every live subscriber. Emitting with no
    /// subscribers is not an error.
    pub fn emit(&self, event: AuthChangeEvent) {
        debug!(
            event_name = "auth.change.emit",
            event_domain = "providers",
            kind = ?event.kind,
            has_session = event.session.is_some(),
            listeners = self.sender.receiver_count(),
            "emitting auth change"
        );
        let _ = self.sender.send(event);
    }

    /// Number of subscriptions that have not been released.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(32)
    }
}

/// A registered change-notification listener. Released exactly once, either
/// through [`Subscription::unsubscribe`] or on drop.
pub struct Subscription {
    receiver: Option<broadcast::Receiver<AuthChangeEvent>>,
}

impl Subscription {
    fn new(receiver: broadcast::Receiver<AuthChangeEvent>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Wait for the next event. Returns `None` once unsubscribed or when the
    /// provider has gone away. A subscriber that fell behind skips ahead to
    /// the oldest event still buffered.
    pub async fn next(&mut self) -> Option<AuthChangeEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth change subscriber lagged; skipping ahead");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Deregister from the provider. Returns true only for the call that
    /// actually released the registration.
    pub fn unsubscribe(&mut self) -> bool {
        self.receiver.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.unsubscribe() {
            debug!("auth change subscription released on drop");
        }
    }
}
