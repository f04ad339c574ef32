pub mod auth_state;
pub mod event;
pub mod session;
pub mod user;

pub use auth_state::AuthState;
pub use event::{AuthChangeEvent, AuthEventKind};
pub use session::Session;
pub use user::User;
