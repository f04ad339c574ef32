use crate::error::AuthError;
use crate::gate::{Navigator, Route};

pub const ERROR_TITLE: &str = "Error";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// A modal message with a single dismiss action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// Screen to replace the current location with once dismissed.
    pub on_dismiss: Option<Route>,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            on_dismiss: None,
        }
    }

    pub fn then_go_to(mut self, route: Route) -> Self {
        self.on_dismiss = Some(route);
        self
    }

    /// The generic alert shown for failures the user cannot act on.
    pub fn unexpected() -> Self {
        Self::new(ERROR_TITLE, UNEXPECTED_ERROR)
    }

    /// Provider rejections are shown under `title` with the provider's own
    /// wording; everything else becomes the generic alert.
    pub fn for_failure(title: &str, err: &AuthError) -> Self {
        match err {
            AuthError::Api { message, .. } => Self::new(title, message.clone()),
            _ => Self::unexpected(),
        }
    }

    /// Run the dismiss action against `navigator`.
    pub fn dismiss(&self, navigator: &dyn Navigator) {
        if let Some(route) = self.on_dismiss {
            navigator.replace(route);
        }
    }
}

/// Shows alerts to the user. Implementations decide when the alert is
/// dismissed and must call [`Alert::dismiss`] when it is.
pub trait AlertPresenter: Send + Sync {
    fn present(&self, alert: Alert);
}
