use crate::error::ExecError;
use crate::job::{Job, JobBuilder};
use crate::pipe::PipeSet;
use crate::reaper::SigchldBlock;
use crate::redirect::Redirections;
use crate::types::{Command, Pipeline};

use std::ffi::{CStr, CString};
use std::os::unix::io::RawFd;
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, SigSet, SigmaskHow, Signal};
use nix::unistd::{self, ForkResult};
use tracing::{debug, warn};

const EXIT_NOT_FOUND: i32 = 127;
const EXIT_CANNOT_EXEC: i32 = 126;

/// What one child needs, built before the fork so the child only wires
/// descriptors and calls exec.
#[derive(Debug)]
struct Stage {
	argv: Vec<CString>,
	redirections: Redirections,
}

impl Stage {
	/// A redirection of a stream that a pipe already occupies is dropped
	/// without opening its file.
	fn prepare(command: &Command, reads_pipe: bool, writes_pipe: bool) -> Result<Stage, ExecError> {
		let argv = command.arguments.iter()
			.map(|&s| CString::new(s).map_err(|_| ExecError::Nul(s.to_string())))
			.collect::<Result<Vec<CString>, ExecError>>()?;
		let redirects = command.redirects.iter().filter(|r| {
			let overridden = if r.typ.is_input() { reads_pipe } else { writes_pipe };
			if overridden {
				warn!(program = command.program(), file = r.target, "pipe takes precedence over redirection");
			}
			!overridden
		});
		let redirections = Redirections::open(redirects)?;
		Ok(Stage { argv, redirections })
	}
}

fn redirect_fd(src: Option<RawFd>, dst: RawFd) -> nix::Result<()> {
	match src {
		Some(fd) if fd != dst => unistd::dup2(fd, dst).map(drop),
		_ => Ok(()),
	}
}

fn die(program: &CStr, errno: Errno, code: i32) -> ! {
	for part in [program.to_bytes(), &b": "[..], errno.desc().as_bytes(), &b"\n"[..]] {
		unsafe { libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len()); }
	}
	unsafe { libc::_exit(code) }
}

/// Runs in the forked child: wires stdin/stdout, closes every other
/// descriptor this shell handed it, and replaces the process image.
fn exec_child(stage: &Stage, pipe_in: Option<RawFd>, pipe_out: Option<RawFd>, pipes: &PipeSet, mask: &SigSet) -> ! {
	let _ = signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(mask), None);
	// The Rust runtime ignores SIGPIPE and ignored signals survive exec.
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };

	let stdin = pipe_in.or(stage.redirections.input_fd());
	let stdout = pipe_out.or(stage.redirections.output_fd());
	if let Err(e) = redirect_fd(stdin, libc::STDIN_FILENO).and_then(|_| redirect_fd(stdout, libc::STDOUT_FILENO)) {
		die(&stage.argv[0], e, EXIT_CANNOT_EXEC);
	}
	let installed = |fd: RawFd| {
		(fd == libc::STDIN_FILENO && stdin == Some(fd)) || (fd == libc::STDOUT_FILENO && stdout == Some(fd))
	};
	for fd in pipes.raw_fds().chain(stage.redirections.raw_fds()) {
		if !installed(fd) {
			let _ = unistd::close(fd);
		}
	}

	let errno = match unistd::execvp(&stage.argv[0], &stage.argv) {
		Ok(never) => match never {},
		Err(e) => e,
	};
	let code = if errno == Errno::ENOENT { EXIT_NOT_FOUND } else { EXIT_CANNOT_EXEC };
	die(&stage.argv[0], errno, code)
}

#[derive(Debug)]
pub enum EvalResult {
	/// Foreground work; every process has been waited for.
	Done(Job),
	/// Detached; left to the reaper.
	Running(Job),
}

fn finish(mut job: Job, background: bool, block: SigchldBlock) -> Result<EvalResult, ExecError> {
	if background {
		drop(block);
		return Ok(EvalResult::Running(job));
	}
	let r = job.wait();
	drop(block);
	r.map(|_| EvalResult::Done(job))
}

/// Runs a single command, waiting for it unless `background` is set.
pub fn exec_command(command: &Command, background: bool) -> Result<EvalResult, ExecError> {
	let stage = Stage::prepare(command, false, false)?;
	let block = SigchldBlock::new()?;
	let mut job_builder = JobBuilder::new(1);
	// Safety: the child only runs exec_child.
	match unsafe { job_builder.push_fork() }.map_err(ExecError::Fork)? {
		ForkResult::Parent{ child } => {
			debug!(pid = %child, program = command.program(), background, "spawned");
		},
		ForkResult::Child => {
			exec_child(&stage, None, None, &PipeSet::empty(), block.previous());
		},
	}
	drop(stage);
	finish(job_builder.build(), background, block)
}

/// Runs every stage of `pipeline`, stage i's stdout feeding stage i+1's stdin.
pub fn exec_pipeline(pipeline: &Pipeline) -> Result<EvalResult, ExecError> {
	let commands = &pipeline.commands;
	if commands.is_empty() {
		return Ok(EvalResult::Done(Job::default()));
	}
	if commands.len() == 1 {
		return exec_command(&commands[0], pipeline.is_background);
	}

	let last = commands.len() - 1;
	let stages = commands.iter().enumerate()
		.map(|(i, command)| Stage::prepare(command, i > 0, i < last))
		.collect::<Result<Vec<Stage>, ExecError>>()?;
	let pipes = PipeSet::new(last)?;

	let block = SigchldBlock::new()?;
	let mut job_builder = JobBuilder::new(commands.len());
	let mut fork_error = None;
	for (i, stage) in stages.iter().enumerate() {
		let pipe_in = (i > 0).then(|| pipes.read_end(i - 1));
		let pipe_out = (i < last).then(|| pipes.write_end(i));
		// Safety: the child only runs exec_child.
		match unsafe { job_builder.push_fork() } {
			Ok(ForkResult::Parent{ child }) => {
				debug!(pid = %child, program = commands[i].program(), stage = i, "spawned");
			},
			Ok(ForkResult::Child) => {
				exec_child(stage, pipe_in, pipe_out, &pipes, block.previous());
			},
			Err(e) => {
				fork_error = Some(ExecError::Fork(e));
				break;
			},
		}
	}
	pipes.close();
	drop(stages);

	let job = job_builder.build();
	if let Some(e) = fork_error {
		abandon(job);
		drop(block);
		return Err(e);
	}
	finish(job, pipeline.is_background, block)
}

/// Kills and collects the stages of a pipeline that could not be started
/// completely, so none is left without its neighbours.
fn abandon(mut job: Job) -> Job {
	job.kill(Signal::SIGKILL);
	if let Err(e) = job.wait() {
		warn!(error = %e, "collecting abandoned stages");
	}
	job
}

/// Runs a parsed line: one command directly, several as a pipeline.
pub fn eval(pipeline: &Pipeline) -> Result<EvalResult, ExecError> {
	match pipeline.commands.as_slice() {
		[command] => exec_command(command, pipeline.is_background),
		_ => exec_pipeline(pipeline),
	}
}
