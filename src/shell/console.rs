use std::sync::Arc;

use inline_colorization::*;

use crate::gate::{Navigator, Route, StackNavigator};
use crate::handlers::{Alert, AlertPresenter};
use crate::models::AuthState;

/// A [`StackNavigator`] that announces every screen change on stdout.
#[derive(Default)]
pub struct ConsoleNavigator {
    inner: StackNavigator,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    fn announce(&self) {
        println!("  ➜ {style_bold}{color_cyan}{}{color_reset}{style_reset}", self.inner.current());
    }
}

impl Navigator for ConsoleNavigator {
    fn current(&self) -> Route {
        self.inner.current()
    }

    fn replace(&self, route: Route) {
        self.inner.replace(route);
        self.announce();
    }

    fn push(&self, route: Route) {
        self.inner.push(route);
        self.announce();
    }

    fn back(&self) {
        self.inner.back();
        self.announce();
    }
}

/// Prints alerts and treats them as dismissed once printed.
pub struct ConsoleAlerts {
    navigator: Arc<dyn Navigator>,
}

impl ConsoleAlerts {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl AlertPresenter for ConsoleAlerts {
    fn present(&self, alert: Alert) {
        let color = if alert.title == "Success" {
            color_green
        } else {
            color_red
        };
        println!(
            "  {style_bold}{color}{}{color_reset}{style_reset}: {}",
            alert.title, alert.message
        );
        alert.dismiss(self.navigator.as_ref());
    }
}

/// One-line summary of the auth state.
pub fn describe(state: &AuthState) -> String {
    if state.is_loading() {
        return "checking session...".to_string();
    }
    match state.user() {
        Some(user) => format!("signed in as {}", user.display_name()),
        None => "signed out".to_string(),
    }
}
