use forksh::eval::{self, EvalResult};
use forksh::parser;

use std::fs;

fn open_fds() -> usize {
	fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
fn parent_keeps_no_pipe_descriptors() {
	let dir = tempfile::tempdir().unwrap();
	let out = dir.path().join("out");

	let before = open_fds();
	let line = format!("printf abc | cat | cat | cat > {}", out.display());
	let pipeline = parser::parse(&line).unwrap().unwrap();
	match eval::eval(&pipeline).unwrap() {
		EvalResult::Done(job) => assert_eq!(job.terminated(), 4),
		r => panic!("expected a finished job, got {:?}", r),
	}
	assert_eq!(open_fds(), before);
	assert_eq!(fs::read_to_string(&out).unwrap(), "abc");

	let pipeline = parser::parse("sleep 5 | cat | cat &").unwrap().unwrap();
	let mut job = match eval::eval(&pipeline).unwrap() {
		EvalResult::Running(job) => job,
		r => panic!("expected a running job, got {:?}", r),
	};
	assert_eq!(open_fds(), before);
	job.kill(nix::sys::signal::Signal::SIGKILL);
	job.wait().unwrap();
}
