//! Redirection operators: pulling them out of a command's words and opening
//! the files they name.

use crate::error::{ExecError, ParseError};
use crate::parser::Token;
use crate::types::{Command, Redirect, RedirectType};

use std::fs::{self, File};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

const CREATE_MODE: u32 = 0o644;

/// Splits one stage's tokens into its arguments and its redirections, in
/// the order they were written.
pub fn scan<'a>(tokens: &[Token<'a>]) -> Result<Command<'a>, ParseError> {
	let mut arguments: Vec<&'a str> = vec![];
	let mut redirects: Vec<Redirect<'a>> = vec![];

	let mut iter = tokens.iter();
	while let Some(&token) = iter.next() {
		match token {
			Token::Word(w) => arguments.push(w),
			Token::Redirect(typ) => match iter.next() {
				Some(&Token::Word(target)) => redirects.push(Redirect { target, typ }),
				_ => { return Err(ParseError::MissingTarget(typ.as_str())); },
			},
			Token::Pipe => { return Err(ParseError::UnexpectedOperator("|")); },
			Token::Background => { return Err(ParseError::UnexpectedOperator("&")); },
		}
	}
	if arguments.is_empty() {
		return Err(ParseError::EmptyCommand);
	}
	Ok(Command { arguments, redirects })
}

/// Files a child will see as its standard input and output.
///
/// Dropping this closes whatever is still open, so every early return in the
/// executors releases the files it had opened.
#[derive(Debug, Default)]
pub struct Redirections {
	pub stdin: Option<File>,
	pub stdout: Option<File>,
}

impl Redirections {
	/// Opens `redirects` left to right. A later redirection of the same
	/// direction replaces, and closes, the earlier one.
	pub fn open<'r, 'a: 'r, I>(redirects: I) -> Result<Redirections, ExecError>
		where I: IntoIterator<Item = &'r Redirect<'a>>
	{
		let mut this = Redirections::default();
		for redirect in redirects {
			let file = open_target(redirect)?;
			if redirect.typ.is_input() {
				this.stdin = Some(file);
			} else {
				this.stdout = Some(file);
			}
		}
		Ok(this)
	}

	pub fn input_fd(&self) -> Option<RawFd> {
		self.stdin.as_ref().map(|f| f.as_raw_fd())
	}

	pub fn output_fd(&self) -> Option<RawFd> {
		self.stdout.as_ref().map(|f| f.as_raw_fd())
	}

	pub fn raw_fds(&self) -> impl Iterator<Item = RawFd> {
		self.input_fd().into_iter().chain(self.output_fd())
	}
}

fn open_target(redirect: &Redirect) -> Result<File, ExecError> {
	let mut oopt = fs::OpenOptions::new();
	let _ = match redirect.typ {
		RedirectType::Input => oopt.read(true),
		RedirectType::Output => oopt.write(true).create(true).truncate(true).mode(CREATE_MODE),
		RedirectType::Append => oopt.append(true).create(true).mode(CREATE_MODE),
	};
	let path = Path::new(redirect.target);
	oopt.open(path).map_err(|source| ExecError::Open { path: path.to_owned(), source })
}
