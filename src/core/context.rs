//! Release context - build once, pass to the command
//!
//! Settings and credentials are resolved in main.rs before anything touches
//! the repository. The release command never reads the environment itself.

use crate::core::config::{Credentials, ReleaseSettings};
use crate::core::error::ReleaseResult;
use std::path::{Path, PathBuf};

/// Everything a release needs to know about where and as whom it runs
#[derive(Debug, Clone)]
pub struct ReleaseContext {
  /// Directory the release runs in (relative config paths resolve here)
  pub root: PathBuf,

  /// release.toml, or defaults
  pub settings: ReleaseSettings,

  /// Uploader credentials from the environment, if both are set
  pub credentials: Option<Credentials>,
}

impl ReleaseContext {
  /// Load settings and capture credentials for a root directory
  pub fn build(root: &Path, config: Option<&Path>) -> ReleaseResult<Self> {
    let settings = ReleaseSettings::load(root, config)?;
    Ok(Self {
      root: root.to_path_buf(),
      settings,
      credentials: Credentials::from_env(),
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}
