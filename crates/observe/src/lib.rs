//! Initialization logic for logging that is shared between binaries.
pub mod config;
pub mod tracing;

pub use config::Config;
