//! Library exports for felonyfit, shared between the binary and tests.

pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod session;
pub mod shell;
pub mod startup;
pub mod storage;
pub mod utils;
