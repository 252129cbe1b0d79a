mod commands;
mod core;
mod release;
mod utils;

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, print_error};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bump, package, upload and verify a plugin release
///
/// Without --tag the build goes to the BleedingEdge channel with the current
/// commit SHA appended to the manifest version. With --tag it goes to Stable
/// with the manifest version unchanged.
#[derive(Parser)]
#[command(name = "plugin-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct ReleaseCli {
  /// Release tag; any non-empty value releases to the Stable channel
  #[arg(long, default_value = "")]
  tag: String,

  /// Path to release.toml (default: release.toml, .release.toml or .config/release.toml)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Build and package, but do not upload or verify
  #[arg(long)]
  dry_run: bool,

  /// Print the release report as JSON
  #[arg(long)]
  json: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = ReleaseCli::parse();
  init_logging();

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let ctx = match ReleaseContext::build(&root, cli.config.as_deref()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  if let Err(err) = commands::run_release(&ctx, cli.tag, cli.dry_run, cli.json) {
    handle_error(err);
  }
}

/// Logs go to stderr so `--json` output on stdout stays clean
fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .with_target(false)
    .init();
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
