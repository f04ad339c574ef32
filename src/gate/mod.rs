pub mod auth_gate;
pub mod navigation;

pub use auth_gate::{redirect_for, AuthGate, GateDecision, GatePhase};
pub use navigation::{Navigator, Route, StackNavigator};
