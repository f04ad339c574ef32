//! Application startup: wires configuration, provider, session store, auth
//! gate and console shell together.

use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{error, info};

use crate::config::ConfigV1;
use crate::gate::{AuthGate, Navigator};
use crate::handlers::AlertPresenter;
use crate::providers::GoTrueProvider;
use crate::session::SessionStore;
use crate::shell::{ConsoleAlerts, ConsoleNavigator, Shell};
use crate::storage::create_storage;

/// Runs the client until stdin is closed or the user quits.
///
/// # Errors
///
/// Returns an error if the Supabase credentials are missing, the HTTP client
/// cannot be built or stdin cannot be read.
pub async fn run(config: ConfigV1) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = config.supabase.credentials()?;
    info!("Using identity provider at {}", credentials.url);

    let storage = create_storage(&config.storage, config.auth.persist_session);
    let provider = Arc::new(GoTrueProvider::new(
        credentials,
        config.auth.clone(),
        storage,
    )?);

    let auto_refresh = config
        .auth
        .auto_refresh_token
        .then(|| provider.start_auto_refresh());

    let store = SessionStore::start(provider.clone());

    let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator::new());
    let alerts: Arc<dyn AlertPresenter> = Arc::new(ConsoleAlerts::new(navigator.clone()));
    let gate = tokio::spawn(AuthGate::new(navigator.clone()).run(store.handle()));

    let shell = Shell::new(provider, navigator, alerts, store.handle());
    let result = shell.run(BufReader::new(tokio::io::stdin())).await;

    drop(auto_refresh);
    store.teardown().await;
    if let Err(e) = gate.await {
        error!("Auth gate task ended abnormally: {}", e);
    }
    info!("Shut down");

    result.map_err(Into::into)
}
