use crate::error::ExecError;

use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use nix::fcntl::OFlag;
use nix::unistd;

/// The N-1 pipes joining the N stages of a pipeline.
///
/// Every end is close-on-exec and owned here; the parent closes them all at
/// once by consuming the set with [`PipeSet::close`].
#[derive(Debug, Default)]
pub struct PipeSet {
	pipes: Vec<(OwnedFd, OwnedFd)>,
}

impl PipeSet {
	/// Allocates `count` pipes, or none: on failure the ones already created
	/// are closed before the error is returned.
	pub fn new(count: usize) -> Result<PipeSet, ExecError> {
		let mut pipes = Vec::with_capacity(count);
		for _ in 0 .. count {
			pipes.push(unistd::pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?);
		}
		Ok(PipeSet { pipes })
	}

	pub fn empty() -> PipeSet {
		PipeSet { pipes: Vec::new() }
	}

	pub fn len(&self) -> usize {
		self.pipes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pipes.is_empty()
	}

	pub fn read_end(&self, i: usize) -> RawFd {
		self.pipes[i].0.as_raw_fd()
	}

	pub fn write_end(&self, i: usize) -> RawFd {
		self.pipes[i].1.as_raw_fd()
	}

	/// Both ends of every pipe. Does not allocate, so a forked child may use it.
	pub fn raw_fds(&self) -> impl Iterator<Item = RawFd> + '_ {
		self.pipes.iter().flat_map(|(r, w)| [r.as_raw_fd(), w.as_raw_fd()])
	}

	pub fn close(self) {
		drop(self.pipes);
	}
}
