use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::handle::AuthHandle;
use crate::models::{AuthChangeEvent, AuthState};
use crate::providers::{IdentityProvider, Subscription};

/// The single owner of [`AuthState`].
///
/// Starting the store subscribes to the provider's change notifications and
/// then asks for the current session; a background task applies both to the
/// state. All writes happen on that task. Readers go through [`AuthHandle`].
pub struct SessionStore {
    rx: watch::Receiver<AuthState>,
    closed: Arc<AtomicBool>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionStore {
    /// Start tracking `provider`'s session. Must be called inside a Tokio runtime.
    pub fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, rx) = watch::channel(AuthState::loading());
        let shutdown = CancellationToken::new();
        // Subscribe before the initial fetch so no event can slip between them.
        let subscription = provider.on_auth_state_change();

        info!("Starting session store for provider '{}'", provider.get_name());
        let task = tokio::spawn(sync_with_provider(
            provider,
            subscription,
            tx,
            shutdown.clone(),
        ));

        Self {
            rx,
            closed: Arc::new(AtomicBool::new(false)),
            shutdown,
            task: Some(task),
        }
    }

    pub fn handle(&self) -> AuthHandle {
        AuthHandle::new(self.rx.clone(), self.closed.clone())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// Stop tracking the provider and wait for the subscription to be released.
    /// Handles fail with `ContextUnavailable` afterwards.
    pub async fn teardown(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Session store task ended abnormally: {}", e);
            }
        }
    }
}

impl SessionStore {
    /// Handles fail from here on; the task releases the subscription and
    /// drops the state sender once it observes the cancellation.
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown.cancel();
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn apply(tx: &watch::Sender<AuthState>, event: AuthChangeEvent) {
    debug!(
        event_name = "session.store.event",
        event_domain = "session",
        kind = ?event.kind,
        has_session = event.session.is_some(),
        "applying auth change"
    );
    tx.send_replace(AuthState::resolved(event.session));
}

async fn sync_with_provider(
    provider: Arc<dyn IdentityProvider>,
    mut subscription: Subscription,
    tx: watch::Sender<AuthState>,
    shutdown: CancellationToken,
) {
    let mut initial = provider.get_session();
    let mut initial_pending = true;
    let mut events_open = true;
    let mut notified = false;

    loop {
        if !initial_pending && !events_open {
            // Nothing left to apply; keep the last state readable until teardown.
            shutdown.cancelled().await;
            break;
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = &mut initial, if initial_pending => {
                initial_pending = false;
                if notified {
                    debug!("Discarding initial session fetch; a newer auth event was already applied");
                    continue;
                }
                let session = match result {
                    Ok(session) => session,
                    Err(e) => {
                        error!("Initial session check failed, continuing signed out: {}", e);
                        None
                    }
                };
                info!(
                    "Initial session check resolved: {}",
                    if session.is_some() { "signed in" } else { "signed out" }
                );
                tx.send_replace(AuthState::resolved(session));
            }
            event = subscription.next(), if events_open => match event {
                Some(event) => {
                    notified = true;
                    apply(&tx, event);
                }
                None => {
                    warn!("Auth change stream closed by provider '{}'", provider.get_name());
                    events_open = false;
                }
            },
        }
    }

    subscription.unsubscribe();
    debug!("Session store stopped");
}
