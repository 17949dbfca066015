//! One iteration of the read loop: parse a line, then run it as a built-in,
//! a single command, or a pipeline.

use crate::builtin::{self, Flow};
use crate::eval::{self, EvalResult};
use crate::job::Job;
use crate::parser;

use std::env;
use std::io::{self, Write};
use nix::unistd::{self, User};
use tracing::debug;

const UNKNOWN: &str = "unknown";

/// Prints who and where the shell is running, for interactive sessions.
pub fn banner(out: &mut dyn Write) -> io::Result<()> {
	let user = User::from_uid(unistd::getuid()).ok().flatten()
		.map_or_else(|| UNKNOWN.to_string(), |u| u.name);
	let host = unistd::gethostname().ok()
		.and_then(|h| h.into_string().ok())
		.unwrap_or_else(|| UNKNOWN.to_string());
	let cwd = env::current_dir()
		.map_or_else(|_| UNKNOWN.to_string(), |p| p.display().to_string());
	writeln!(out, "User: {}", user)?;
	writeln!(out, "Host: {}", host)?;
	writeln!(out, "CWD: {}", cwd)
}

fn report_background(job: &Job, stages: usize, out: &mut dyn Write) -> io::Result<()> {
	let pids = job.pids();
	if stages == 1 {
		writeln!(out, "[background job started] pid {}", pids[0])
	} else {
		let pids: Vec<String> = pids.iter().map(|p| p.to_string()).collect();
		writeln!(out, "[background pipeline started] pids {}", pids.join(" "))
	}
}

/// Runs one input line. Every failure is written to `err`; only the `exit`
/// built-in stops the loop.
pub fn run_line(line: &str, out: &mut dyn Write, err: &mut dyn Write) -> Flow {
	let pipeline = match parser::parse(line) {
		Ok(Some(pipeline)) => pipeline,
		Ok(None) => { return Flow::Continue; },
		Err(e) => {
			let _ = writeln!(err, "parse error: {}", e);
			return Flow::Continue;
		},
	};

	if let [command] = pipeline.commands.as_slice() {
		if command.redirects.is_empty() {
			if let Some(func) = builtin::match_builtin(command.program()) {
				return func(&command.arguments, out).unwrap_or_else(|e| {
					let _ = writeln!(err, "{}: {}", command.program(), e);
					Flow::Continue
				});
			}
		}
	}

	let _ = out.flush();
	match eval::eval(&pipeline) {
		Ok(EvalResult::Running(job)) => {
			let _ = report_background(&job, pipeline.commands.len(), out);
		},
		Ok(EvalResult::Done(job)) => {
			debug!(terminated = job.terminated(), "foreground job finished");
		},
		Err(e) => {
			let _ = writeln!(err, "{}", e);
		},
	}
	Flow::Continue
}

/// Runs one raw input line. Words are handled as UTF-8 text, so a line that
/// is not valid UTF-8 is refused instead of having its bytes replaced.
pub fn run_bytes(line: &[u8], out: &mut dyn Write, err: &mut dyn Write) -> Flow {
	match std::str::from_utf8(line) {
		Ok(line) => run_line(line, out, err),
		Err(e) => {
			let _ = writeln!(err, "input is not valid UTF-8 at byte {}; line ignored", e.valid_up_to());
			Flow::Continue
		},
	}
}
