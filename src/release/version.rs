//! Channel, version and artifact-name derivation

use serde::Serialize;
use std::fmt;

/// Release track on the plugin registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReleaseChannel {
  /// Tagged release, version taken verbatim from the manifest
  Stable,
  /// Untagged build, version suffixed with the commit SHA
  BleedingEdge,
}

impl ReleaseChannel {
  /// Channel name understood by the plugin repository client
  pub fn as_str(self) -> &'static str {
    match self {
      ReleaseChannel::Stable => "Stable",
      ReleaseChannel::BleedingEdge => "BleedingEdge",
    }
  }
}

impl fmt::Display for ReleaseChannel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Stable if a non-empty tag was supplied, otherwise BleedingEdge
pub fn determine_channel(tag: &str) -> ReleaseChannel {
  if tag.is_empty() {
    ReleaseChannel::BleedingEdge
  } else {
    ReleaseChannel::Stable
  }
}

/// Version to publish for a channel
///
/// BleedingEdge appends `.<commit>` to the manifest version; Stable keeps it.
pub fn release_version(base: &str, channel: ReleaseChannel, commit: &str) -> String {
  match channel {
    ReleaseChannel::Stable => base.to_string(),
    ReleaseChannel::BleedingEdge => format!("{}.{}", base, commit),
  }
}

/// File name of the uploaded zip: `<prefix>_<version>.zip`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

impl ArtifactName {
  pub fn new(prefix: &str, version: &str) -> Self {
    Self(format!("{}_{}.zip", prefix, version))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ArtifactName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
