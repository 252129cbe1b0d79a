//! Plugin manifest (plugin.xml) version editing
//!
//! Editing is lossless: only the text inside the first `<version>` element
//! outside of XML comments and CDATA sections is replaced. Attributes,
//! whitespace, comments and every other element are preserved byte for byte.
//!
//! `ManifestGuard` owns a snapshot of the file and puts it back when the
//! release is done with it, on every exit path.

use crate::core::error::{ManifestError, ReleaseError, ReleaseResult, ResultExt};
use crate::core::vcs::Vcs;
use crate::release::version::{ReleaseChannel, release_version};
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

// Open tag must not be self-closing: the last char before `>` is never `/`
const VERSION_ELEMENT: &str = r"(?s)<version(?:\s[^>]*[^/>]|\s)?>(.*?)</version\s*>";
const XML_OPAQUE: &str = r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>";

/// In-memory plugin manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
  content: String,
  /// Byte range of the trimmed version text, if any
  version: Option<Range<usize>>,
}

impl PluginManifest {
  /// Parse manifest text and locate its version element
  pub fn parse(content: impl Into<String>) -> ReleaseResult<Self> {
    let content = content.into();
    let element = Regex::new(VERSION_ELEMENT)?;
    let opaque = Regex::new(XML_OPAQUE)?;

    // Blank out comments and CDATA so markup inside them is never matched.
    // Same length, so offsets line up with `content`.
    let mut masked = content.clone().into_bytes();
    for m in opaque.find_iter(&content) {
      masked[m.range()].fill(b' ');
    }
    let masked =
      String::from_utf8(masked).map_err(|e| ReleaseError::message(format!("Invalid manifest text: {}", e)))?;

    let version = element
      .captures(&masked)
      .and_then(|caps| caps.get(1))
      .and_then(|text| {
        let raw = text.as_str();
        let leading = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
          None
        } else {
          let start = text.start() + leading;
          Some(start..start + trimmed.len())
        }
      });

    Ok(Self { content, version })
  }

  /// Version text, or `None` when the element is absent or empty
  pub fn version(&self) -> Option<&str> {
    self.version.clone().map(|range| &self.content[range])
  }

  /// Version text, failing with `MissingVersion` for `path`
  pub fn require_version(&self, path: &Path) -> ReleaseResult<&str> {
    self.version().ok_or_else(|| {
      ReleaseError::Manifest(ManifestError::MissingVersion {
        path: path.to_path_buf(),
      })
    })
  }

  /// Copy of this manifest with the version text replaced
  ///
  /// Returns `None` when there is no version to replace.
  pub fn with_version(&self, version: &str) -> Option<Self> {
    let range = self.version.clone()?;
    let mut content = String::with_capacity(self.content.len() + version.len());
    content.push_str(&self.content[..range.start]);
    content.push_str(version);
    content.push_str(&self.content[range.end..]);

    Some(Self {
      version: Some(range.start..range.start + version.len()),
      content,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.content
  }
}

/// Scoped ownership of the manifest file
///
/// Acquiring snapshots the bytes on disk. `restore` checks the file out of
/// git and falls back to writing the snapshot when the checkout fails or
/// leaves different content behind. Dropping an unrestored guard restores it.
pub struct ManifestGuard<'a> {
  vcs: &'a dyn Vcs,
  /// Path relative to the repository root (what git sees)
  relative: PathBuf,
  /// Absolute path on disk
  path: PathBuf,
  original: String,
  restored: bool,
}

impl<'a> ManifestGuard<'a> {
  pub fn acquire(root: &Path, relative: &Path, vcs: &'a dyn Vcs) -> ReleaseResult<Self> {
    let path = root.join(relative);
    let original =
      fs::read_to_string(&path).with_context(|| format!("Failed to read plugin manifest {}", path.display()))?;

    Ok(Self {
      vcs,
      relative: relative.to_path_buf(),
      path,
      original,
      restored: true,
    })
  }

  /// Manifest as it was when the guard was acquired
  pub fn original(&self) -> ReleaseResult<PluginManifest> {
    PluginManifest::parse(self.original.clone())
  }

  pub fn relative_path(&self) -> &Path {
    &self.relative
  }

  /// Overwrite the manifest on disk
  pub fn write(&mut self, manifest: &PluginManifest) -> ReleaseResult<()> {
    self.restored = false;
    fs::write(&self.path, manifest.as_str())
      .with_context(|| format!("Failed to write plugin manifest {}", self.path.display()))
  }

  /// Put the manifest back to its acquired content
  ///
  /// Safe to call any number of times.
  pub fn restore(&mut self) -> ReleaseResult<()> {
    if let Err(e) = self.vcs.checkout_file(&self.relative) {
      warn!("Could not check out {}: {}", self.relative.display(), e);
    }

    let current = fs::read_to_string(&self.path).ok();
    if current.as_deref() != Some(self.original.as_str()) {
      debug!("Writing snapshot of {} back to disk", self.relative.display());
      fs::write(&self.path, &self.original)
        .with_context(|| format!("Failed to restore plugin manifest {}", self.path.display()))?;
    }

    self.restored = true;
    Ok(())
  }
}

impl Drop for ManifestGuard<'_> {
  fn drop(&mut self) {
    if !self.restored
      && let Err(e) = self.restore()
    {
      error!("{}", e);
    }
  }
}

/// Derive the release version and stamp it into the manifest
///
/// BleedingEdge releases write `<version>.<commit>` to disk through the
/// guard; Stable releases leave the file untouched.
pub fn compute_version(guard: &mut ManifestGuard<'_>, channel: ReleaseChannel, commit: &str) -> ReleaseResult<String> {
  let manifest = guard.original()?;
  let base = manifest.require_version(guard.relative_path())?;
  let version = release_version(base, channel, commit);

  if channel == ReleaseChannel::BleedingEdge {
    info!("Append current git sha, {}, to plugin version", commit);
    let bumped = manifest.with_version(&version).ok_or_else(|| {
      ReleaseError::Manifest(ManifestError::MissingVersion {
        path: guard.relative_path().to_path_buf(),
      })
    })?;
    guard.write(&bumped)?;
  }

  Ok(version)
}
