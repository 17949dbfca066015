//! Asynchronous collection of terminated children.
//!
//! The SIGCHLD handler reaps every child that has exited, with no filter.
//! Foreground work keeps it away from its own children by holding a
//! [`SigchldBlock`] from the first fork until its pid-scoped waits are done.
//! The block only covers the calling thread, so the executors must run on
//! the one thread of the process that can take SIGCHLD.

use crate::error::ExecError;

use std::sync::atomic::{AtomicUsize, Ordering};
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};

static REAPED: AtomicUsize = AtomicUsize::new(0);

extern "C" fn on_sigchld(_: libc::c_int) {
	let saved = Errno::last_raw();
	reap_all();
	Errno::set_raw(saved);
}

/// Installs the SIGCHLD handler for the whole process.
pub fn install() -> Result<(), ExecError> {
	let action = SigAction::new(
		SigHandler::Handler(on_sigchld),
		SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
		SigSet::empty());
	// Safety: the handler only calls waitpid and touches an atomic.
	unsafe { signal::sigaction(Signal::SIGCHLD, &action) }.map_err(ExecError::SignalHandler)?;
	Ok(())
}

/// Reaps every child that has already terminated, without blocking.
/// Returns how many were collected by this call.
pub fn reap_all() -> usize {
	let mut n = 0;
	loop {
		match wait::waitpid(None, Some(WaitPidFlag::WNOHANG)) {
			Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => { break; },
			Err(Errno::EINTR) => {},
			Err(_) => { break; },
			Ok(_) => { n += 1; },
		}
	}
	REAPED.fetch_add(n, Ordering::Relaxed);
	n
}

/// Total number of children collected so far by [`reap_all`].
pub fn reaped() -> usize {
	REAPED.load(Ordering::Relaxed)
}

/// Keeps SIGCHLD blocked on the current thread while alive.
#[derive(Debug)]
pub struct SigchldBlock {
	previous: SigSet,
}

impl SigchldBlock {
	pub fn new() -> Result<SigchldBlock, ExecError> {
		let mut set = SigSet::empty();
		set.add(Signal::SIGCHLD);
		let mut previous = SigSet::empty();
		signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&set), Some(&mut previous))
			.map_err(ExecError::SignalMask)?;
		Ok(SigchldBlock { previous })
	}

	/// The mask in effect before blocking; children restore it before exec.
	pub fn previous(&self) -> &SigSet {
		&self.previous
	}
}

impl Drop for SigchldBlock {
	fn drop(&mut self) {
		let _ = signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None);
	}
}
