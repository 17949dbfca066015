use std::{env, fs, io};
use std::io::Write;
use std::os::unix::fs::DirBuilderExt;

const MKDIR_MODE: u32 = 0o755;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Exit }

/// A command run inside the shell process. `args[0]` is its own name.
pub type Builtin = fn(&[&str], &mut dyn Write) -> io::Result<Flow>;

pub fn builtin_cd(args: &[&str], _: &mut dyn Write) -> io::Result<Flow> {
	let dir = match args.get(1) {
		Some(dir) => dir.to_string(),
		None => env::var("HOME").unwrap_or_else(|_| "/".to_string()),
	};
	env::set_current_dir(&dir).map_err(|e| io::Error::new(e.kind(), format!("{}: {}", dir, e)))?;
	Ok(Flow::Continue)
}

pub fn builtin_mkdir(args: &[&str], _: &mut dyn Write) -> io::Result<Flow> {
	let dir = args.get(1).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "missing operand"))?;
	fs::DirBuilder::new().mode(MKDIR_MODE).create(dir)
		.map_err(|e| io::Error::new(e.kind(), format!("{}: {}", dir, e)))?;
	Ok(Flow::Continue)
}

pub fn builtin_exit(_: &[&str], out: &mut dyn Write) -> io::Result<Flow> {
	writeln!(out, "Exiting shell.")?;
	Ok(Flow::Exit)
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(builtin_cd),
		"mkdir" => Some(builtin_mkdir),
		"exit" => Some(builtin_exit),
		_ => None,
	}
}
