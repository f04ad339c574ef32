use std::sync::Arc;

use tracing::{error, info, warn};

use super::alerts::{Alert, AlertPresenter, ERROR_TITLE};
use super::forms::{LoginForm, ValidationError};
use super::submit::{catch_panic, SubmitControl};
use crate::gate::{Navigator, Route};
use crate::providers::IdentityProvider;

pub const LOGIN_FAILED_TITLE: &str = "Login Failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A previous submission is still in flight; nothing was done.
    Busy,
    Invalid(ValidationError),
    /// The provider refused the credentials.
    Rejected(String),
    /// Transport, decoding or internal failure.
    Failed,
    SignedIn,
}

/// The login screen's submit action.
pub struct LoginHandler {
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    alerts: Arc<dyn AlertPresenter>,
    submit: SubmitControl,
}

impl LoginHandler {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        alerts: Arc<dyn AlertPresenter>,
    ) -> Self {
        Self {
            provider,
            navigator,
            alerts,
            submit: SubmitControl::new(),
        }
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.submit
    }

    pub async fn submit(&self, form: &LoginForm) -> LoginOutcome {
        let Some(_guard) = self.submit.try_begin() else {
            return LoginOutcome::Busy;
        };

        let credentials = match form.validate() {
            Ok(credentials) => credentials,
            Err(e) => {
                self.alerts.present(Alert::new(ERROR_TITLE, e.to_string()));
                return LoginOutcome::Invalid(e);
            }
        };

        info!("Signing in {}", credentials.email);
        match catch_panic(self.provider.sign_in_with_password(&credentials)).await {
            Ok(Ok(session)) => {
                info!("Signed in as {}", session.user.id);
                LoginOutcome::SignedIn
            }
            Ok(Err(e)) if e.is_api() => {
                warn!("Login rejected for {}: {}", credentials.email, e);
                self.alerts.present(Alert::for_failure(LOGIN_FAILED_TITLE, &e));
                LoginOutcome::Rejected(e.to_string())
            }
            Ok(Err(e)) => {
                error!("Login failed: {}", e);
                self.alerts.present(Alert::unexpected());
                LoginOutcome::Failed
            }
            Err(panic) => {
                error!("Login panicked: {}", panic);
                self.alerts.present(Alert::unexpected());
                LoginOutcome::Failed
            }
        }
    }

    /// "Sign up" link.
    pub fn navigate_to_signup(&self) {
        self.navigator.push(Route::Signup);
    }
}
