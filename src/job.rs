use crate::error::ExecError;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, Pid};
use tracing::{debug, warn};

pub trait WaitStatusExt {
	fn is_terminated(self) -> bool;
}

impl WaitStatusExt for WaitStatus {
	fn is_terminated(self) -> bool {
		matches!(self, WaitStatus::Exited(..) | WaitStatus::Signaled(..))
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	/// `None` until this shell has reaped the process.
	pub status: Option<WaitStatus>,
}

/// The children spawned for one command line.
#[derive(Debug, Default)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	pub fn pids(&self) -> Vec<Pid> {
		self.processes.iter().map(|pr| pr.pid).collect()
	}

	/// How many of the processes this job has reaped itself.
	pub fn terminated(&self) -> usize {
		self.processes.iter().filter(|pr| pr.status.is_some_and(|s| s.is_terminated())).count()
	}

	/// Blocks until every process of the job has terminated.
	///
	/// Waits are scoped to each pid, so children that do not belong to this
	/// job are never collected here.
	pub fn wait(&mut self) -> Result<(), ExecError> {
		for pr in self.processes.iter_mut().filter(|pr| pr.status.is_none()) {
			loop {
				match wait::waitpid(pr.pid, None) {
					Ok(status) if status.is_terminated() => {
						debug!(pid = %pr.pid, ?status, "reaped");
						pr.status = Some(status);
						break;
					},
					Ok(status) => {
						debug!(pid = %pr.pid, ?status, "still running");
					},
					Err(Errno::EINTR) => {},
					Err(Errno::ECHILD) => {
						warn!(pid = %pr.pid, "child was already reaped elsewhere");
						break;
					},
					Err(e) => { return Err(ExecError::Wait(e)); },
				}
			}
		}
		Ok(())
	}

	/// Sends `sig` to every process not yet reaped.
	pub fn kill(&self, sig: Signal) {
		for pr in self.processes.iter().filter(|pr| pr.status.is_none()) {
			if let Err(e) = signal::kill(pr.pid, sig) {
				debug!(pid = %pr.pid, error = %e, "kill failed");
			}
		}
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks, recording the child's pid on the parent side.
	///
	/// # Safety
	///
	/// Same contract as [`unistd::fork`]: in the child the caller may only use
	/// async-signal-safe operations before `exec` or `_exit`. The pid vector
	/// is pre-sized, so pushing up to `size_hint` children does not allocate.
	pub unsafe fn push_fork(&mut self) -> nix::Result<unistd::ForkResult> {
		let r = unistd::fork()?;
		if let unistd::ForkResult::Parent{ child } = r {
			self.imp.processes.push(Process { pid: child, status: None });
		}
		Ok(r)
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn spawn(program: &str, args: &[&str]) -> Job {
		let child = std::process::Command::new(program).args(args).spawn().unwrap();
		Job { processes: vec![Process { pid: Pid::from_raw(child.id() as i32), status: None }] }
	}

	#[test]
	fn wait_records_exit_status() {
		let mut job = spawn("false", &[]);
		job.wait().unwrap();
		assert_eq!(job.terminated(), 1);
		match job.processes[0].status {
			Some(WaitStatus::Exited(pid, 1)) => assert_eq!(pid, job.processes[0].pid),
			s => panic!("unexpected status {:?}", s),
		}
	}

	#[test]
	fn kill_then_wait() {
		let mut job = spawn("sleep", &["10"]);
		job.kill(Signal::SIGKILL);
		job.wait().unwrap();
		assert!(matches!(job.processes[0].status, Some(WaitStatus::Signaled(_, Signal::SIGKILL, _))));
	}

	#[test]
	fn wait_skips_reaped_processes() {
		let mut job = spawn("true", &[]);
		job.wait().unwrap();
		let before = job.processes[0].status;
		job.wait().unwrap();
		assert_eq!(job.processes[0].status, before);
		assert_eq!(job.pids().len(), 1);
	}
}
