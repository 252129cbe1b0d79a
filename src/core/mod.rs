//! Core building blocks shared by the release pipeline
//!
//! - **config**: release.toml discovery, defaults and credentials
//! - **context**: settings and credentials resolved once at startup
//! - **error**: error type with contextual help messages and exit codes
//! - **interrupt**: SIGINT/SIGTERM shield while external builds run
//! - **vcs**: git operations abstraction (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod interrupt;
pub mod vcs;
