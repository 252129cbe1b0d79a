//! Plugin release pipeline
//!
//! A release is one linear pass over external tools:
//!
//! 1. **version**: pick the channel from `--tag` and derive the version.
//!    BleedingEdge builds get `.<commit-sha>` appended.
//! 2. **manifest**: stamp that version into plugin.xml for the duration of
//!    the build, under a guard that always puts the file back.
//! 3. **package**: run the build and zip the jar as `<prefix>_<version>.zip`.
//! 4. **upload**: hand the zip to the plugin repository client.
//! 5. **verify**: look for the commit SHA on the public plugin page.
//!
//! `orchestrator` strings these together. Each external system sits behind a
//! trait (`Vcs`, `Packager`, `Uploader`, `Registry`) so the sequence can be
//! exercised without git, a JVM or the network.

pub mod manifest;
pub mod orchestrator;
pub mod package;
pub mod upload;
pub mod verify;
pub mod version;

pub use orchestrator::{Collaborators, ReleaseOptions, ReleaseOrchestrator, ReleaseReport};
