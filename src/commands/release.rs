//! Release command implementation
//!
//! Wires the production collaborators (system git, the build/zip commands,
//! the REST client jar and the HTTP registry page) into the orchestrator and
//! prints the resulting report.

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::release::orchestrator::{PackagingOutcome, UploadOutcome};
use crate::release::package::CommandPackager;
use crate::release::upload::RestClientUploader;
use crate::release::verify::HttpRegistry;
use crate::release::{Collaborators, ReleaseOptions, ReleaseOrchestrator, ReleaseReport};
use tracing::debug;

/// Run the release command
pub fn run_release(ctx: &ReleaseContext, tag: String, dry_run: bool, json: bool) -> ReleaseResult<()> {
  let git = SystemGit::open(ctx.root())?;
  debug!("Repository root: {}", git.work_tree().display());

  let settings = &ctx.settings;
  let packager = CommandPackager::new(ctx.root(), settings.build.clone(), settings.package.clone());
  let uploader = RestClientUploader::new(ctx.root(), settings.upload.clone());
  let registry = HttpRegistry::new(settings.registry.page_url.clone());

  let tools = Collaborators {
    vcs: &git,
    packager: &packager,
    uploader: &uploader,
    registry: &registry,
  };
  let orchestrator = ReleaseOrchestrator::new(ctx.root(), settings, ctx.credentials.clone(), tools);
  let report = orchestrator.run(&ReleaseOptions { tag, dry_run })?;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&report);
  }

  Ok(())
}

fn print_report(report: &ReleaseReport) {
  println!();
  println!("📦 Release {}", report.artifact);
  println!("   Channel:  {}", report.channel);
  println!("   Version:  {}", report.version);
  println!("   Commit:   {}", report.commit);

  match &report.packaging {
    PackagingOutcome::Built { path } => println!("   Package:  ✅ {}", path.display()),
    PackagingOutcome::Failed { reason } => println!("   Package:  ❌ {}", first_line(reason)),
  }

  match &report.upload {
    UploadOutcome::Completed { exit_code } => {
      let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
      println!("   Upload:   sent (client exit {}, ignored)", code);
    }
    UploadOutcome::Skipped { reason } => println!("   Upload:   ⏭️  skipped ({})", reason),
    UploadOutcome::Failed { reason } => println!("   Upload:   ❌ {}", first_line(reason)),
  }

  match &report.verification {
    Some(v) if v.succeeded() => println!("   Verify:   ✅ {}", v),
    Some(v) => println!("   Verify:   ❌ {}", v),
    None => println!("   Verify:   ⏭️  skipped"),
  }
  println!();
}

fn first_line(text: &str) -> &str {
  text.lines().next().unwrap_or("")
}
