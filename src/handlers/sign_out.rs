use std::sync::Arc;

use tracing::{error, info, warn};

use super::alerts::{Alert, AlertPresenter};
use super::submit::{catch_panic, SubmitControl};
use crate::providers::IdentityProvider;

pub const SIGN_OUT_FAILED_TITLE: &str = "Sign Out Failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutOutcome {
    Busy,
    Rejected(String),
    Failed,
    SignedOut,
}

/// The signed-in area's sign-out action. The gate moves the user to the
/// login screen once the provider reports the sign-out.
pub struct SignOutHandler {
    provider: Arc<dyn IdentityProvider>,
    alerts: Arc<dyn AlertPresenter>,
    submit: SubmitControl,
}

impl SignOutHandler {
    pub fn new(provider: Arc<dyn IdentityProvider>, alerts: Arc<dyn AlertPresenter>) -> Self {
        Self {
            provider,
            alerts,
            submit: SubmitControl::new(),
        }
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.submit
    }

    pub async fn submit(&self) -> SignOutOutcome {
        let Some(_guard) = self.submit.try_begin() else {
            return SignOutOutcome::Busy;
        };

        match catch_panic(self.provider.sign_out()).await {
            Ok(Ok(())) => {
                info!("Signed out");
                SignOutOutcome::SignedOut
            }
            Ok(Err(e)) if e.is_api() => {
                warn!("Sign-out rejected: {}", e);
                self.alerts
                    .present(Alert::for_failure(SIGN_OUT_FAILED_TITLE, &e));
                SignOutOutcome::Rejected(e.to_string())
            }
            Ok(Err(e)) => {
                error!("Sign-out failed: {}", e);
                self.alerts.present(Alert::unexpected());
                SignOutOutcome::Failed
            }
            Err(panic) => {
                error!("Sign-out panicked: {}", panic);
                self.alerts.present(Alert::unexpected());
                SignOutOutcome::Failed
            }
        }
    }
}
