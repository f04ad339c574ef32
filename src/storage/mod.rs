pub mod base;
pub mod file_storage;
pub mod no_storage;

pub use base::*;
