pub mod base;
pub mod gotrue_provider;
pub mod subscription;

// Re-export so we can do "use crate::providers::*;"
pub use base::*;
pub use gotrue_provider::{AutoRefresh, GoTrueProvider};
pub use subscription::{EventHub, Subscription};
