use forksh::builtin::Flow;
use forksh::{reaper, shell};

use std::io;
use std::io::{BufRead, IsTerminal, Write};
use argh::FromArgs;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Run external programs with pipes, redirections and background jobs.
struct Args {
	/// prompt printed before each line when stdin is a terminal
	#[argh(option, default = "String::from(\"shell> \")")]
	prompt: String,

	/// log filter used when RUST_LOG is not set
	#[argh(option, default = "String::from(\"warn\")")]
	log: String,

	/// do not print the start-up banner
	#[argh(switch, short = 'q')]
	quiet: bool,

	/// run a single line and exit
	#[argh(option, short = 'c')]
	command: Option<String>,
}

fn main() {
	let args: Args = argh::from_env();
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

	let mut stdout = io::stdout();
	let mut stderr = io::stderr();
	if let Err(e) = reaper::install() {
		let _ = writeln!(stderr, "{}", e);
	}

	if let Some(line) = args.command {
		shell::run_line(&line, &mut stdout, &mut stderr);
		return;
	}

	let stdin = io::stdin();
	let interactive = stdin.is_terminal();
	if interactive && !args.quiet {
		let _ = shell::banner(&mut stdout);
	}

	let mut stdin_locked = stdin.lock();
	let mut reaped = reaper::reaped();
	loop {
		if interactive {
			let _ = stdout.write_all(args.prompt.as_bytes());
			let _ = stdout.flush();
		}
		let mut line: Vec<u8> = vec![];
		match stdin_locked.read_until(b'\n', &mut line) {
			Ok(0) => { break; },
			Ok(_) => {},
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => { continue; },
			Err(e) => {
				let _ = writeln!(stderr, "read: {}", e);
				break;
			},
		}
		if shell::run_bytes(&line, &mut stdout, &mut stderr) == Flow::Exit {
			break;
		}
		let now = reaper::reaped();
		if now != reaped {
			debug!(count = now - reaped, "background children reaped");
			reaped = now;
		}
	}
}
