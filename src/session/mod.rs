pub mod handle;
pub mod store;

pub use handle::AuthHandle;
pub use store::SessionStore;
