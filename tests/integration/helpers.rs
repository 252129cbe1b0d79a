//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const MANIFEST_PATH: &str = "resources/META-INF/plugin.xml";

/// A plugin repository with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a repository whose manifest is committed with `manifest` content
  pub fn new(manifest: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    let manifest_file = path.join(MANIFEST_PATH);
    std::fs::create_dir_all(manifest_file.parent().context("manifest has a parent")?)?;
    std::fs::write(&manifest_file, manifest)?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial plugin"])?;

    Ok(Self { _root: root, path })
  }

  /// Write release.toml (uncommitted, like a CI-provided config)
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("release.toml"), content)?;
    Ok(())
  }

  /// Write an executable shell script and return its absolute path
  #[cfg(unix)]
  pub fn write_script(&self, name: &str, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let script = self.path.join(name);
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body))?;
    let mut perms = std::fs::metadata(&script)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms)?;
    Ok(script)
  }

  /// HEAD commit SHA
  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Read the plugin manifest
  pub fn manifest(&self) -> Result<String> {
    self.read_file(MANIFEST_PATH)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// plugin-release invocation with credentials cleared and info logging
fn plugin_release_command(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Command {
  let bin = env!("CARGO_BIN_EXE_plugin-release");

  let mut cmd = Command::new(bin);
  cmd
    .current_dir(cwd)
    .args(args)
    .env_remove("USERNAME")
    .env_remove("PASSWORD")
    .env("RUST_LOG", "info");
  for (key, value) in env {
    cmd.env(key, value);
  }
  cmd
}

/// Run the plugin-release binary
///
/// Unlike `git`, a non-zero exit is returned rather than raised; several
/// tests assert on the exit code.
pub fn run_plugin_release(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  plugin_release_command(cwd, args, env)
    .output()
    .context("Failed to run plugin-release")
}

/// Start the plugin-release binary without waiting for it
pub fn spawn_plugin_release(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Child> {
  plugin_release_command(cwd, args, env)
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to start plugin-release")
}

/// Wait up to `timeout` for a file to appear
pub fn wait_for_file(path: &Path, timeout: Duration) -> bool {
  let deadline = Instant::now() + timeout;
  while Instant::now() < deadline {
    if path.exists() {
      return true;
    }
    std::thread::sleep(Duration::from_millis(20));
  }
  path.exists()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
