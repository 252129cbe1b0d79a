//! Post-upload verification against the public plugin page

use crate::core::error::ReleaseResult;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info};

/// Source of the registry's public plugin page
pub trait Registry {
  /// Page address, for logs
  fn url(&self) -> &str;

  /// Fetch the page body
  fn fetch_page(&self) -> ReleaseResult<String>;
}

/// Registry page fetched over HTTP with a blocking client
pub struct HttpRegistry {
  client: reqwest::blocking::Client,
  url: String,
}

impl HttpRegistry {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      client: reqwest::blocking::Client::new(),
      url: url.into(),
    }
  }
}

impl Registry for HttpRegistry {
  fn url(&self) -> &str {
    &self.url
  }

  fn fetch_page(&self) -> ReleaseResult<String> {
    let response = self.client.get(&self.url).send()?;
    // Only the body decides; an error page simply won't mention the commit
    debug!("{} answered {}", self.url, response.status());
    Ok(response.text()?)
  }
}

/// Result of looking for the release on the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
  /// The commit hash appears on the page
  Published,
  /// Page fetched, commit hash absent
  NotFound,
  /// Page could not be fetched
  Unreachable { reason: String },
}

impl Verification {
  pub fn succeeded(&self) -> bool {
    matches!(self, Verification::Published)
  }
}

impl fmt::Display for Verification {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Verification::Published => write!(f, "published"),
      Verification::NotFound => write!(f, "not found on registry"),
      Verification::Unreachable { reason } => write!(f, "registry unreachable: {}", reason),
    }
  }
}

/// True iff `commit` occurs in `page`
pub fn page_mentions(page: &str, commit: &str) -> bool {
  !commit.is_empty() && page.contains(commit)
}

/// Check the registry page for the commit hash and log the outcome
pub fn verify(registry: &dyn Registry, commit: &str) -> Verification {
  let verification = match registry.fetch_page() {
    Ok(page) if page_mentions(&page, commit) => Verification::Published,
    Ok(_) => Verification::NotFound,
    Err(e) => Verification::Unreachable { reason: e.to_string() },
  };

  match &verification {
    Verification::Published => info!("Deploy succeeded."),
    Verification::NotFound => error!("Deploy failed: not available on {}", registry.url()),
    Verification::Unreachable { reason } => {
      error!("Deploy failed: not available on {} ({})", registry.url(), reason)
    }
  }

  verification
}
