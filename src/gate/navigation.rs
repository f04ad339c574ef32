use std::fmt;
use std::sync::Mutex;

use tracing::debug;

/// The named screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`: entry point, shows the loading indicator while the gate decides.
    Index,
    Login,
    Signup,
    /// `/(tabs)`: default screen of the signed-in area.
    Tabs,
    /// `/modal`: presented on top of the signed-in area.
    Modal,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Index => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Tabs => "/(tabs)",
            Route::Modal => "/modal",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        match path.trim() {
            "/" | "" => Some(Route::Index),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/(tabs)" | "/tabs" => Some(Route::Tabs),
            "/modal" => Some(Route::Modal),
            _ => None,
        }
    }

    /// Screens that require a signed-in user.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Tabs | Route::Modal)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Programmatic navigation, as offered by the UI's router.
pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    /// Swap the current screen for `route` without adding history.
    fn replace(&self, route: Route);
    fn push(&self, route: Route);
    /// Pop one screen; a no-op on the root screen.
    fn back(&self);
}

/// An in-memory history stack. Starts at [`Route::Index`].
pub struct StackNavigator {
    stack: Mutex<Vec<Route>>,
}

impl StackNavigator {
    pub fn new() -> Self {
        Self {
            stack: Mutex::new(vec![Route::Index]),
        }
    }

    /// Copy of the history, root first.
    pub fn history(&self) -> Vec<Route> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Route>> {
        self.stack.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StackNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for StackNavigator {
    fn current(&self) -> Route {
        self.lock().last().copied().unwrap_or(Route::Index)
    }

    fn replace(&self, route: Route) {
        let mut stack = self.lock();
        debug!("navigation: replace {:?} -> {}", stack.last(), route);
        match stack.last_mut() {
            Some(top) => *top = route,
            None => stack.push(route),
        }
    }

    fn push(&self, route: Route) {
        debug!("navigation: push {}", route);
        self.lock().push(route);
    }

    fn back(&self) {
        let mut stack = self.lock();
        if stack.len() > 1 {
            let popped = stack.pop();
            debug!("navigation: back from {:?}", popped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_path_and_alias() {
        assert_eq!(Route::from_path("/(tabs)"), Some(Route::Tabs));
        assert_eq!(Route::from_path("/tabs"), Some(Route::Tabs));
        assert_eq!(Route::from_path(""), Some(Route::Index));
        assert_eq!(Route::from_path("/nowhere"), None);
    }

    #[test]
    fn only_tabs_and_modal_are_protected() {
        assert!(Route::Tabs.is_protected());
        assert!(Route::Modal.is_protected());
        assert!(!Route::Login.is_protected());
        assert!(!Route::Signup.is_protected());
        assert!(!Route::Index.is_protected());
    }

    #[test]
    fn stack_push_replace_back() {
        let nav = StackNavigator::new();
        assert_eq!(nav.current(), Route::Index);

        nav.replace(Route::Login);
        nav.push(Route::Signup);
        assert_eq!(nav.history(), vec![Route::Login, Route::Signup]);

        nav.back();
        assert_eq!(nav.current(), Route::Login);
        // The root screen stays put.
        nav.back();
        assert_eq!(nav.current(), Route::Login);
    }
}
