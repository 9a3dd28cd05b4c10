// VPforce Rhino Linux Driver - Shared Library
// Configuration shared by the CLI and integration tests

pub mod config;

pub use config::{ConfigError, DriverConfig};
