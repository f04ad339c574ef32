use std::sync::Arc;

use tracing::{debug, info};

use super::navigation::{Navigator, Route};
use crate::models::AuthState;
use crate::session::AuthHandle;

/// Where the user stands, as far as navigation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// The initial session check has not resolved yet.
    Checking,
    Unauthenticated,
    Authenticated,
}

impl GatePhase {
    pub fn of(state: &AuthState) -> Self {
        if state.is_loading() {
            GatePhase::Checking
        } else if state.user().is_some() {
            GatePhase::Authenticated
        } else {
            GatePhase::Unauthenticated
        }
    }
}

/// What the gate did for one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show the loading indicator; no navigation yet.
    Loading,
    Redirect(Route),
    Stay,
}

/// The redirect policy: signed-out users belong on the login screen unless
/// they are already somewhere public, signed-in users belong in the tabs
/// area unless they are already inside it.
pub fn redirect_for(phase: GatePhase, location: Route) -> Option<Route> {
    match phase {
        GatePhase::Checking => None,
        GatePhase::Unauthenticated if location.is_protected() || location == Route::Index => {
            Some(Route::Login)
        }
        GatePhase::Authenticated if !location.is_protected() => Some(Route::Tabs),
        _ => None,
    }
}

/// Applies [`redirect_for`] to a navigator every time the auth state changes.
pub struct AuthGate {
    navigator: Arc<dyn Navigator>,
    phase: GatePhase,
}

impl AuthGate {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            phase: GatePhase::Checking,
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    /// Evaluate one state against the navigator's current location and
    /// perform the redirect, if any.
    pub fn on_state(&mut self, state: &AuthState) -> GateDecision {
        let phase = GatePhase::of(state);
        if phase != self.phase {
            info!("Auth gate: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }

        if phase == GatePhase::Checking {
            return GateDecision::Loading;
        }

        let location = self.navigator.current();
        match redirect_for(phase, location) {
            Some(target) => {
                debug!("Auth gate redirecting {} -> {}", location, target);
                self.navigator.replace(target);
                GateDecision::Redirect(target)
            }
            None => GateDecision::Stay,
        }
    }

    /// Follow `handle` until its session store goes away, evaluating every
    /// state it publishes.
    pub async fn run(mut self, mut handle: AuthHandle) {
        let Ok(state) = handle.current_and_mark_seen() else {
            return;
        };
        self.on_state(&state);

        while let Ok(state) = handle.changed().await {
            self.on_state(&state);
        }
        debug!("Auth gate stopped: session store is gone");
    }
}
