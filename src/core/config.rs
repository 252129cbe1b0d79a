use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for plugin-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every section is optional; missing values fall back to the layout of the
/// Pants IntelliJ plugin repository.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
  pub manifest: ManifestConfig,
  pub build: BuildConfig,
  pub package: PackageConfig,
  pub upload: UploadConfig,
  pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
  /// Plugin manifest path, relative to the repository root
  pub path: PathBuf,
}

impl Default for ManifestConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("resources/META-INF/plugin.xml"),
    }
  }
}

/// External build invocation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Program followed by its arguments (no shell interpretation)
  pub command: Vec<String>,

  /// Build output directory, removed before every build
  pub clean_dir: Option<PathBuf>,

  /// Jar produced by the build
  pub jar: PathBuf,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      command: vec![
        "./pants".to_string(),
        "binary".to_string(),
        "scripts/sdk:intellij-pants-plugin-publish".to_string(),
      ],
      clean_dir: Some(PathBuf::from("dist")),
      jar: PathBuf::from("dist/intellij-pants-plugin-publish.jar"),
    }
  }
}

/// Zip layout: `<prefix>/lib/<jar>` inside `<prefix>_<version>.zip`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
  pub prefix: String,
  pub zip_program: String,
}

impl Default for PackageConfig {
  fn default() -> Self {
    Self {
      prefix: "pants".to_string(),
      zip_program: "zip".to_string(),
    }
  }
}

/// Plugin repository REST client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
  pub java: String,
  pub client_jar: PathBuf,
  pub host: String,
  pub plugin_id: u64,
}

impl Default for UploadConfig {
  fn default() -> Self {
    Self {
      java: "java".to_string(),
      client_jar: PathBuf::from("scripts/deploy/plugin-repository-rest-client-0.3.SNAPSHOT-all.jar"),
      host: "https://plugins.jetbrains.com/".to_string(),
      plugin_id: 7412,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
  /// Public plugin page polled after upload
  pub page_url: String,
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      page_url: "https://plugins.jetbrains.com/plugin/7412".to_string(),
    }
  }
}

impl ReleaseSettings {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load settings for a repository root
  ///
  /// An explicit path must exist. Without one, the search locations are tried
  /// and the defaults are used when none is present.
  pub fn load(root: &Path, explicit: Option<&Path>) -> ReleaseResult<Self> {
    let config_path = match explicit {
      Some(path) => {
        let path = if path.is_absolute() {
          path.to_path_buf()
        } else {
          root.join(path)
        };
        if !path.exists() {
          return Err(ReleaseError::Config(ConfigError::NotFound { path }));
        }
        path
      }
      None => match Self::find_config_path(root) {
        Some(path) => path,
        None => {
          debug!("No release.toml found in {}, using defaults", root.display());
          return Ok(Self::default());
        }
      },
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let settings = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    debug!("Loaded release settings from {}", config_path.display());
    Ok(settings)
  }

  /// Parse and validate settings from TOML text
  pub fn parse(content: &str) -> ReleaseResult<Self> {
    let settings: ReleaseSettings = toml_edit::de::from_str(content)?;
    settings.validate()?;
    Ok(settings)
  }

  /// Validate settings
  pub fn validate(&self) -> ReleaseResult<()> {
    if self.build.command.is_empty() || self.build.command[0].trim().is_empty() {
      return Err(invalid("build.command", "must name a program to run"));
    }

    if self.package.prefix.trim().is_empty() {
      return Err(invalid("package.prefix", "must not be empty"));
    }

    if self.manifest.path.is_absolute() {
      return Err(invalid(
        "manifest.path",
        "must be relative to the repository root so git can restore it",
      ));
    }

    Ok(())
  }
}

fn invalid(field: &str, reason: &str) -> ReleaseError {
  ReleaseError::Config(ConfigError::InvalidField {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}

/// Uploader credentials
///
/// Captured once from `USERNAME` / `PASSWORD` and handed to the uploader
/// explicitly.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

impl Credentials {
  pub const USERNAME_VAR: &'static str = "USERNAME";
  pub const PASSWORD_VAR: &'static str = "PASSWORD";

  /// Read credentials from the process environment
  ///
  /// Returns `None` when either variable is unset.
  pub fn from_env() -> Option<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
    Some(Self {
      username: lookup(Self::USERNAME_VAR)?,
      password: lookup(Self::PASSWORD_VAR)?,
    })
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}
