//! CLI commands for plugin-release
//!
//! - **release**: bump, package, upload and verify one plugin build

pub mod release;

pub use release::run_release;
