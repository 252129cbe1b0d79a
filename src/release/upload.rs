//! Upload through the plugin repository REST client
//!
//! The client is known to exit non-zero even when the upload went through,
//! so its status is recorded and logged but never treated as a failure.
//! `verify` is the real success check.

use crate::core::config::{Credentials, UploadConfig};
use crate::core::error::{ReleaseResult, ResultExt};
use crate::release::version::ReleaseChannel;
use crate::utils::{display_command, run_captured};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// One upload invocation
#[derive(Debug)]
pub struct UploadRequest<'a> {
  pub channel: ReleaseChannel,
  pub credentials: &'a Credentials,
  pub artifact: &'a Path,
}

/// Sends an artifact to the plugin registry
pub trait Uploader {
  /// Returns the client's exit code (`None` if killed by a signal)
  ///
  /// `Err` only when the client could not be started at all.
  fn upload(&self, request: &UploadRequest<'_>) -> ReleaseResult<Option<i32>>;
}

/// `java -jar <client> upload ...`
pub struct RestClientUploader {
  root: PathBuf,
  config: UploadConfig,
}

impl RestClientUploader {
  pub fn new(root: &Path, config: UploadConfig) -> Self {
    Self {
      root: root.to_path_buf(),
      config,
    }
  }

  /// Arguments after the java executable
  pub fn arguments(&self, request: &UploadRequest<'_>) -> Vec<String> {
    vec![
      "-jar".to_string(),
      self.config.client_jar.to_string_lossy().to_string(),
      "upload".to_string(),
      "-host".to_string(),
      self.config.host.clone(),
      "-channel".to_string(),
      request.channel.to_string(),
      "-username".to_string(),
      request.credentials.username.clone(),
      "-password".to_string(),
      request.credentials.password.clone(),
      "-plugin".to_string(),
      self.config.plugin_id.to_string(),
      "-file".to_string(),
      request.artifact.to_string_lossy().to_string(),
    ]
  }
}

impl Uploader for RestClientUploader {
  fn upload(&self, request: &UploadRequest<'_>) -> ReleaseResult<Option<i32>> {
    let args = self.arguments(request);
    let shown = display_command(&self.config.java, &args, &[request.credentials.password.as_str()]);
    info!("Uploading...");
    debug!("{}", shown);

    let output = run_captured(
      Command::new(&self.config.java).args(&args).current_dir(&self.root),
      "upload",
    )
    .with_context(|| format!("Failed to start {}", self.config.java))?;

    Ok(output.status.code())
  }
}
