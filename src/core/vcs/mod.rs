pub mod system_git;

pub use system_git::SystemGit;

use crate::core::error::ReleaseResult;
use std::path::Path;

/// Version-control operations a release needs
///
/// `SystemGit` is the production backend; tests substitute in-memory fakes.
pub trait Vcs {
  /// Full SHA of the commit checked out at HEAD
  fn head_commit(&self) -> ReleaseResult<String>;

  /// Discard working-tree changes to a single file (path relative to the repo)
  fn checkout_file(&self, path: &Path) -> ReleaseResult<()>;
}
