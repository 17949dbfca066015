use std::path::Path;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output, Append }

impl RedirectType {
	pub fn is_input(self) -> bool {
		self == RedirectType::Input
	}

	pub fn as_str(self) -> &'static str {
		match self {
			RedirectType::Input => "<",
			RedirectType::Output => ">",
			RedirectType::Append => ">>",
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect<'a> {
	pub target: &'a str,
	pub typ: RedirectType,
}

/// One stage of a pipeline. `arguments[0]` is the program name as typed.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command<'a> {
	pub arguments: Vec<&'a str>,
	pub redirects: Vec<Redirect<'a>>,
}

impl<'a> Command<'a> {
	pub fn program(&self) -> &'a str {
		self.arguments[0]
	}

	/// The input file that wins when `<` is given more than once.
	pub fn input_redirect(&self) -> Option<&Path> {
		self.redirects.iter().rev()
			.find(|r| r.typ.is_input())
			.map(|r| Path::new(r.target))
	}

	/// The output file and its mode that wins among `>` and `>>`.
	pub fn output_redirect(&self) -> Option<(&Path, RedirectType)> {
		self.redirects.iter().rev()
			.find(|r| !r.typ.is_input())
			.map(|r| (Path::new(r.target), r.typ))
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline<'a> {
	pub commands: Vec<Command<'a>>,
	pub is_background: bool,
}
