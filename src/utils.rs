//! Utility functions for paths and subprocesses

use std::io;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Render a command line for logs
///
/// Arguments containing whitespace are single-quoted. Values listed in
/// `secrets` are replaced with `***`.
pub fn display_command(program: &str, args: &[String], secrets: &[&str]) -> String {
  let mut parts = Vec::with_capacity(args.len() + 1);
  parts.push(program.to_string());
  for arg in args {
    if secrets.iter().any(|s| !s.is_empty() && s == arg) {
      parts.push("***".to_string());
    } else if arg.chars().any(char::is_whitespace) {
      parts.push(format!("'{}'", arg));
    } else {
      parts.push(arg.clone());
    }
  }
  parts.join(" ")
}

/// Run a command to completion, capturing its output
///
/// Captured stdout/stderr are logged at debug level under `label`.
pub fn run_captured(command: &mut Command, label: &str) -> io::Result<Output> {
  let output = command.output()?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stdout.trim().is_empty() {
    debug!("{} stdout:\n{}", label, stdout.trim_end());
  }
  if !stderr.trim().is_empty() {
    debug!("{} stderr:\n{}", label, stderr.trim_end());
  }
  debug!("{} exited with {}", label, output.status);

  Ok(output)
}
