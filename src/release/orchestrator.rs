//! The release sequence
//!
//! ```text
//! reset manifest -> channel -> version check -> commit -> bump
//!   -> package (manifest restored) -> upload -> verify
//! ```
//!
//! Only the steps up to and including the bump can fail the run, plus a
//! SIGINT/SIGTERM during packaging. Everything after is logged and recorded in
//! the `ReleaseReport`.

use crate::core::config::{Credentials, ReleaseSettings};
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::Vcs;
use crate::release::manifest::{ManifestGuard, compute_version};
use crate::release::package::{Packager, package};
use crate::release::upload::{UploadRequest, Uploader};
use crate::release::verify::{Registry, Verification, verify};
use crate::release::version::{ArtifactName, ReleaseChannel, determine_channel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// External systems a release talks to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
  pub vcs: &'a dyn Vcs,
  pub packager: &'a dyn Packager,
  pub uploader: &'a dyn Uploader,
  pub registry: &'a dyn Registry,
}

/// Per-invocation options from the command line
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
  /// Non-empty selects the Stable channel
  pub tag: String,
  /// Package but do not upload or verify
  pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackagingOutcome {
  Built { path: PathBuf },
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
  /// Upload not attempted
  Skipped { reason: String },
  /// Client ran; its exit code is informational only
  Completed { exit_code: Option<i32> },
  /// Client could not be started
  Failed { reason: String },
}

/// Summary of one release run
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
  pub version: String,
  pub channel: ReleaseChannel,
  pub commit: String,
  pub artifact: ArtifactName,
  pub packaging: PackagingOutcome,
  pub upload: UploadOutcome,
  /// `None` when verification did not run
  pub verification: Option<Verification>,
  pub finished_at: DateTime<Utc>,
}

pub struct ReleaseOrchestrator<'a> {
  root: PathBuf,
  manifest_path: PathBuf,
  prefix: String,
  credentials: Option<Credentials>,
  tools: Collaborators<'a>,
}

impl<'a> ReleaseOrchestrator<'a> {
  pub fn new(
    root: &Path,
    settings: &ReleaseSettings,
    credentials: Option<Credentials>,
    tools: Collaborators<'a>,
  ) -> Self {
    Self {
      root: root.to_path_buf(),
      manifest_path: settings.manifest.path.clone(),
      prefix: settings.package.prefix.clone(),
      credentials,
      tools,
    }
  }

  /// Current HEAD commit; any git failure is fatal
  pub fn resolve_commit_identifier(&self) -> ReleaseResult<String> {
    self.tools.vcs.head_commit()
  }

  /// Run the full sequence
  ///
  /// `Err` means a fatal precondition failed and nothing was packaged or
  /// uploaded. The manifest is back to its starting content either way.
  pub fn run(&self, options: &ReleaseOptions) -> ReleaseResult<ReleaseReport> {
    // A previous run may have died with the manifest still bumped
    if let Err(e) = self.tools.vcs.checkout_file(&self.manifest_path) {
      warn!("Could not reset {}: {}", self.manifest_path.display(), e);
    }

    let channel = determine_channel(&options.tag);
    let mut guard = ManifestGuard::acquire(&self.root, &self.manifest_path, self.tools.vcs)?;
    guard.original()?.require_version(&self.manifest_path)?;

    let commit = self.resolve_commit_identifier()?;
    let version = compute_version(&mut guard, channel, &commit)?;
    let artifact = ArtifactName::new(&self.prefix, &version);
    info!("Releasing {} to {} channel", version, channel);

    let packaging = match package(self.tools.packager, &mut guard, &artifact) {
      Ok(path) => PackagingOutcome::Built { path },
      Err(ReleaseError::Interrupted) => {
        warn!("Interrupted; {} restored", self.manifest_path.display());
        return Err(ReleaseError::Interrupted);
      }
      Err(e) => {
        error!("Packaging failed: {}", e);
        PackagingOutcome::Failed { reason: e.to_string() }
      }
    };
    drop(guard);

    let mut report = ReleaseReport {
      version,
      channel,
      commit,
      artifact,
      packaging,
      upload: UploadOutcome::Skipped {
        reason: "packaging failed".to_string(),
      },
      verification: None,
      finished_at: Utc::now(),
    };

    let PackagingOutcome::Built { path } = &report.packaging else {
      return Ok(report);
    };

    if options.dry_run {
      info!("Dry run: not uploading {} to {} channel", report.artifact, channel);
      report.upload = UploadOutcome::Skipped {
        reason: "dry run".to_string(),
      };
      return Ok(report);
    }

    report.upload = self.upload(channel, path);
    // The client's own result is unreliable; the registry page decides
    if !matches!(report.upload, UploadOutcome::Skipped { .. }) {
      report.verification = Some(verify(self.tools.registry, &report.commit));
    }
    report.finished_at = Utc::now();

    Ok(report)
  }

  /// Hand the artifact to the uploader, ignoring its exit status
  pub fn upload(&self, channel: ReleaseChannel, artifact: &Path) -> UploadOutcome {
    let Some(credentials) = &self.credentials else {
      error!(
        "Upload skipped: {} and {} must be set",
        Credentials::USERNAME_VAR,
        Credentials::PASSWORD_VAR
      );
      return UploadOutcome::Skipped {
        reason: "missing credentials".to_string(),
      };
    };

    let request = UploadRequest {
      channel,
      credentials,
      artifact,
    };
    match self.tools.uploader.upload(&request) {
      Ok(exit_code) => {
        // The client reports failure even on success; verification decides
        debug!("Upload client exited with {:?}", exit_code);
        UploadOutcome::Completed { exit_code }
      }
      Err(e) => {
        error!("Upload failed: {}", e);
        UploadOutcome::Failed { reason: e.to_string() }
      }
    }
  }
}
