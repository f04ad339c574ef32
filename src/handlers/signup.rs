use std::sync::Arc;

use tracing::{error, info, warn};

use super::alerts::{Alert, AlertPresenter, ERROR_TITLE};
use super::forms::{SignupForm, ValidationError};
use super::submit::{catch_panic, SubmitControl};
use crate::gate::{Navigator, Route};
use crate::providers::IdentityProvider;

pub const SIGNUP_FAILED_TITLE: &str = "Signup Failed";
pub const SUCCESS_TITLE: &str = "Success";
pub const VERIFY_EMAIL_MESSAGE: &str =
    "Account created! Please check your email to verify your account.";
pub const ACCOUNT_CREATED_MESSAGE: &str = "Account created successfully!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    Busy,
    Invalid(ValidationError),
    Rejected(String),
    Failed,
    /// Account created; the email address must be confirmed before login.
    ConfirmationRequired,
    /// Account created and signed in.
    SignedUp,
}

/// The signup screen's submit action.
pub struct SignupHandler {
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    alerts: Arc<dyn AlertPresenter>,
    submit: SubmitControl,
}

impl SignupHandler {
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

    pub async fn submit(&self, form: &SignupForm) -> SignupOutcome {
        let Some(_guard) = self.submit.try_begin() else {
            return SignupOutcome::Busy;
        };

        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.alerts.present(Alert::new(ERROR_TITLE, e.to_string()));
                return SignupOutcome::Invalid(e);
            }
        };

        info!("Creating account for {}", request.email);
        match catch_panic(self.provider.sign_up(&request)).await {
            Ok(Ok(response)) if response.requires_confirmation() => {
                info!("Account for {} awaits email confirmation", request.email);
                self.alerts.present(
                    Alert::new(SUCCESS_TITLE, VERIFY_EMAIL_MESSAGE).then_go_to(Route::Login),
                );
                SignupOutcome::ConfirmationRequired
            }
            Ok(Ok(_)) => {
                info!("Account created for {}", request.email);
                self.alerts
                    .present(Alert::new(SUCCESS_TITLE, ACCOUNT_CREATED_MESSAGE));
                SignupOutcome::SignedUp
            }
            Ok(Err(e)) if e.is_api() => {
                warn!("Signup rejected for {}: {}", request.email, e);
                self.alerts.present(Alert::for_failure(SIGNUP_FAILED_TITLE, &e));
                SignupOutcome::Rejected(e.to_string())
            }
            Ok(Err(e)) => {
                error!("Signup failed: {}", e);
                self.alerts.present(Alert::unexpected());
                SignupOutcome::Failed
            }
            Err(panic) => {
                error!("Signup panicked: {}", panic);
                self.alerts.present(Alert::unexpected());
                SignupOutcome::Failed
            }
        }
    }

    /// "Sign in" link.
    pub fn navigate_to_login(&self) {
        self.navigator.back();
    }
}
