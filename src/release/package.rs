//! Build and zip the plugin
//!
//! The zip layout is `<prefix>/lib/<jar>`. It is assembled in a scratch
//! directory because the repository root may already contain a `<prefix>`
//! entry (the Pants repo has a `pants` launcher script there).

use crate::core::config::{BuildConfig, PackageConfig};
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::core::interrupt::{InterruptShield, interrupted};
use crate::release::manifest::ManifestGuard;
use crate::release::version::ArtifactName;
use crate::utils::{display_command, run_captured};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{info, warn};

/// Produces the release zip
pub trait Packager {
  /// Run the external build that produces the plugin jar
  fn build(&self) -> ReleaseResult<()>;

  /// Zip the built jar as `artifact`; returns the path of the zip
  fn assemble(&self, artifact: &ArtifactName) -> ReleaseResult<PathBuf>;
}

/// Build, then assemble, then restore the manifest whatever happened
///
/// SIGINT/SIGTERM are held off until the restore is done. The build/assemble
/// error (if any) is returned after the restore, or `Interrupted` when a
/// signal arrived in the meantime.
pub fn package(
  packager: &dyn Packager,
  guard: &mut ManifestGuard<'_>,
  artifact: &ArtifactName,
) -> ReleaseResult<PathBuf> {
  let _shield = InterruptShield::install();

  let result = packager.build().and_then(|()| {
    if interrupted() {
      return Err(ReleaseError::Interrupted);
    }
    packager.assemble(artifact)
  });

  if let Err(e) = guard.restore() {
    warn!("{}", e);
  }

  if interrupted() {
    return Err(ReleaseError::Interrupted);
  }
  result
}

/// Packager driving the configured build command and the `zip` binary
pub struct CommandPackager {
  root: PathBuf,
  build: BuildConfig,
  package: PackageConfig,
}

impl CommandPackager {
  pub fn new(root: &Path, build: BuildConfig, package: PackageConfig) -> Self {
    Self {
      root: root.to_path_buf(),
      build,
      package,
    }
  }

  fn clean(&self) -> ReleaseResult<()> {
    if let Some(dir) = &self.build.clean_dir {
      let dir = self.root.join(dir);
      if dir.exists() {
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
      }
    }
    Ok(())
  }
}

impl Packager for CommandPackager {
  fn build(&self) -> ReleaseResult<()> {
    self.clean()?;

    let (program, args) = self
      .build
      .command
      .split_first()
      .ok_or_else(|| ReleaseError::message("Build command is empty"))?;
    let shown = display_command(program, args, &[]);
    info!("{}", shown);

    let output = run_captured(Command::new(program).args(args).current_dir(&self.root), "build")
      .with_context(|| format!("Failed to run {}", shown))?;
    check_status(&shown, &output)
  }

  fn assemble(&self, artifact: &ArtifactName) -> ReleaseResult<PathBuf> {
    info!("Packaging into a zip");

    let jar = self.root.join(&self.build.jar);
    let jar_name = jar
      .file_name()
      .ok_or_else(|| ReleaseError::message(format!("Build jar path has no file name: {}", jar.display())))?;
    if !jar.is_file() {
      return Err(ReleaseError::with_help(
        format!("Build did not produce {}", jar.display()),
        "Check build.jar in release.toml against the build output.",
      ));
    }

    let staging = tempfile::Builder::new()
      .prefix(".plugin-release-")
      .tempdir_in(&self.root)
      .context("Failed to create staging directory")?;

    let lib = staging.path().join(&self.package.prefix).join("lib");
    fs::create_dir_all(&lib).with_context(|| format!("Failed to create {}", lib.display()))?;
    fs::copy(&jar, lib.join(jar_name)).with_context(|| format!("Failed to copy {}", jar.display()))?;

    let args = vec![
      "-r".to_string(),
      artifact.to_string(),
      format!("{}/", self.package.prefix),
    ];
    let shown = display_command(&self.package.zip_program, &args, &[]);
    info!("{}", shown);

    let output = run_captured(
      Command::new(&self.package.zip_program)
        .args(&args)
        .current_dir(staging.path()),
      "zip",
    )
    .with_context(|| format!("Failed to run {}", shown))?;
    check_status(&shown, &output)?;

    let zipped = staging.path().join(artifact.as_str());
    let target = self.root.join(artifact.as_str());
    fs::copy(&zipped, &target).with_context(|| format!("Failed to copy {} into place", artifact))?;

    info!("{} built successfully", artifact);
    Ok(target)
  }
}

fn check_status(shown: &str, output: &Output) -> ReleaseResult<()> {
  if output.status.success() {
    return Ok(());
  }

  let stderr = String::from_utf8_lossy(&output.stderr);
  Err(ReleaseError::Message {
    message: format!("{} failed ({})", shown, output.status),
    context: (!stderr.trim().is_empty()).then(|| stderr.trim_end().to_string()),
    help: None,
  })
}
