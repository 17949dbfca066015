//! Runs without the test harness: the SIGCHLD block is per thread, so this
//! has to be single-threaded like the shell itself.

use forksh::eval::{self, EvalResult};
use forksh::job::WaitStatusExt;
use forksh::{parser, reaper};

use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant};
use nix::unistd::Pid;

fn run(line: &str) -> EvalResult {
	let pipeline = parser::parse(line).unwrap().unwrap();
	eval::eval(&pipeline).unwrap()
}

fn background(line: &str) -> Vec<Pid> {
	match run(line) {
		EvalResult::Running(job) => job.pids(),
		r => panic!("expected a running job, got {:?}", r),
	}
}

/// Checked through /proc so the test itself never waits on the pid.
fn is_reaped(pid: Pid) -> bool {
	!Path::new(&format!("/proc/{}", pid)).exists()
}

fn wait_until_reaped(pids: &[Pid]) {
	let deadline = Instant::now() + Duration::from_secs(5);
	while !pids.iter().all(|&pid| is_reaped(pid)) {
		assert!(Instant::now() < deadline, "background children left unreaped: {:?}", pids);
		sleep(Duration::from_millis(10));
	}
}

fn background_children_are_reaped() {
	let before = reaper::reaped();
	let pids = background("true &");
	wait_until_reaped(&pids);

	let pids = background("true | true | true &");
	assert_eq!(pids.len(), 3);
	wait_until_reaped(&pids);
	assert!(reaper::reaped() >= before + 4);
}

fn foreground_waits_are_not_stolen() {
	for _ in 0 .. 20 {
		let pids = background("sleep 0.01 &");
		match run("sleep 0.02 | true") {
			EvalResult::Done(job) => {
				assert_eq!(job.processes.len(), 2);
				assert!(job.processes.iter().all(|pr| pr.status.is_some_and(|s| s.is_terminated())));
			},
			r => panic!("expected a finished job, got {:?}", r),
		}
		wait_until_reaped(&pids);
	}
}

fn main() {
	reaper::install().unwrap();
	background_children_are_reaped();
	foreground_waits_are_not_stolen();
	println!("reaper: ok");
}
