use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ParseError {
	#[error("missing file name after '{0}'")]
	MissingTarget(&'static str),
	#[error("empty command")]
	EmptyCommand,
	#[error("'&' is only allowed at the end of a line")]
	MisplacedBackground,
	#[error("unexpected '{0}'")]
	UnexpectedOperator(&'static str),
}

#[derive(Debug, Error)]
pub enum ExecError {
	#[error("{}: {source}", path.display())]
	Open { path: PathBuf, source: io::Error },
	#[error("pipe: {0}")]
	Pipe(#[source] nix::Error),
	#[error("fork: {0}")]
	Fork(#[source] nix::Error),
	#[error("wait: {0}")]
	Wait(#[source] nix::Error),
	#[error("sigprocmask: {0}")]
	SignalMask(#[source] nix::Error),
	#[error("sigaction: {0}")]
	SignalHandler(#[source] nix::Error),
	#[error("{0}: argument contains a nul byte")]
	Nul(String),
}
