//! Keep the process alive through SIGINT/SIGTERM while the manifest is bumped
//!
//! The default disposition kills the process before any destructor runs, so
//! a Ctrl-C during the build would leave plugin.xml modified. While an
//! `InterruptShield` is held the signals only set a flag. Children still get
//! the default disposition (caught handlers reset on exec), so a terminal
//! Ctrl-C stops the build and the pipeline unwinds through the normal restore.

use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use tracing::warn;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// True once SIGINT or SIGTERM arrived while a shield was held
pub fn interrupted() -> bool {
  INTERRUPTED.load(Ordering::SeqCst)
}

/// Signal handlers installed for the lifetime of the value
pub struct InterruptShield {
  #[cfg(unix)]
  previous: Vec<(nix::sys::signal::Signal, nix::sys::signal::SigAction)>,
}

#[cfg(unix)]
extern "C" fn record_interrupt(_signal: std::ffi::c_int) {
  INTERRUPTED.store(true, Ordering::SeqCst);
}

impl InterruptShield {
  #[cfg(unix)]
  pub fn install() -> Self {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let action = SigAction::new(
      SigHandler::Handler(record_interrupt),
      SaFlags::SA_RESTART,
      SigSet::empty(),
    );

    let mut previous = Vec::new();
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
      // SAFETY: the handler only stores to an atomic
      match unsafe { sigaction(signal, &action) } {
        Ok(old) => previous.push((signal, old)),
        Err(e) => warn!("Could not install {} handler: {}", signal.as_str(), e),
      }
    }

    Self { previous }
  }

  #[cfg(not(unix))]
  pub fn install() -> Self {
    Self {}
  }
}

impl InterruptShield {
  #[cfg(unix)]
  fn restore_previous(&mut self) {
    for (signal, old) in self.previous.drain(..).rev() {
      // SAFETY: restores the disposition that was in place before install
      if let Err(e) = unsafe { nix::sys::signal::sigaction(signal, &old) } {
        warn!("Could not restore {} handler: {}", signal.as_str(), e);
      }
    }
  }

  #[cfg(not(unix))]
  fn restore_previous(&mut self) {}
}

impl Drop for InterruptShield {
  fn drop(&mut self) {
    self.restore_previous();
  }
}
