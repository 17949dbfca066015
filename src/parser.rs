use crate::error::ParseError;
use crate::redirect;
use crate::types::*;

type ParseResult<T> = Result<T, ParseError>;

/// A whitespace-separated word, classified once so the rest of the shell
/// never compares operator strings by hand.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token<'a> {
	Word(&'a str),
	Pipe,
	Background,
	Redirect(RedirectType),
}

impl<'a> Token<'a> {
	pub fn classify(word: &'a str) -> Token<'a> {
		match word {
			"|" => Token::Pipe,
			"&" => Token::Background,
			"<" => Token::Redirect(RedirectType::Input),
			">" => Token::Redirect(RedirectType::Output),
			">>" => Token::Redirect(RedirectType::Append),
			_ => Token::Word(word),
		}
	}

	/// How an operator is spelled; `None` for a plain word.
	pub fn operator(self) -> Option<&'static str> {
		match self {
			Token::Word(_) => None,
			Token::Pipe => Some("|"),
			Token::Background => Some("&"),
			Token::Redirect(typ) => Some(typ.as_str()),
		}
	}
}

pub fn tokenize(line: &str) -> Vec<Token<'_>> {
	line.split_whitespace().map(Token::classify).collect()
}

struct Parser<'a> {
	tokens: Vec<Token<'a>>,
	i: usize,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<Token<'a>> {
		self.tokens.get(self.i).copied()
	}

	fn parse_command(&mut self) -> ParseResult<Command<'a>> {
		let orig = self.i;
		while let Some(token) = self.peek() {
			match token {
				Token::Pipe | Token::Background => { break; },
				_ => { self.i += 1; },
			}
		}
		redirect::scan(&self.tokens[orig .. self.i])
	}

	fn parse_pipeline(&mut self) -> ParseResult<Pipeline<'a>> {
		let mut commands: Vec<Command<'a>> = vec![];
		let mut is_background = false;

		loop {
			commands.push(self.parse_command()?);
			match self.peek() {
				Some(Token::Pipe) => { self.i += 1; },
				Some(Token::Background) => {
					self.i += 1;
					if self.peek().is_some() {
						return Err(ParseError::MisplacedBackground);
					}
					is_background = true;
					break;
				},
				Some(_) => unreachable!("parse_command stops only at '|' or '&'"),
				None => { break; },
			}
		}
		Ok(Pipeline { commands, is_background })
	}
}

/// Parses one input line. A blank line yields `Ok(None)`.
pub fn parse(line: &str) -> ParseResult<Option<Pipeline<'_>>> {
	let tokens = tokenize(line);
	if tokens.is_empty() {
		return Ok(None);
	}
	let mut parser = Parser { tokens, i: 0 };
	parser.parse_pipeline().map(Some)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words<'a>(pipeline: &Pipeline<'a>) -> Vec<Vec<&'a str>> {
		pipeline.commands.iter().map(|c| c.arguments.clone()).collect()
	}

	#[test]
	fn classify_operators() {
		assert_eq!(tokenize("a | b & < > >> c>"), vec![
			Token::Word("a"),
			Token::Pipe,
			Token::Word("b"),
			Token::Background,
			Token::Redirect(RedirectType::Input),
			Token::Redirect(RedirectType::Output),
			Token::Redirect(RedirectType::Append),
			Token::Word("c>"),
		]);
	}

	#[test]
	fn operator_spelling() {
		for op in ["|", "&", "<", ">", ">>"] {
			assert_eq!(Token::classify(op).operator(), Some(op));
		}
		assert_eq!(Token::classify("cat").operator(), None);
	}

	#[test]
	fn blank_line() {
		assert_eq!(parse(""), Ok(None));
		assert_eq!(parse("  \t \n"), Ok(None));
	}

	#[test]
	fn single_command() {
		let pipeline = parse("ls -l /tmp\n").unwrap().unwrap();
		assert_eq!(words(&pipeline), vec![vec!["ls", "-l", "/tmp"]]);
		assert!(!pipeline.is_background);
	}

	#[test]
	fn pipeline_with_background() {
		let pipeline = parse("cat f | sort -r | uniq &").unwrap().unwrap();
		assert_eq!(words(&pipeline), vec![vec!["cat", "f"], vec!["sort", "-r"], vec!["uniq"]]);
		assert!(pipeline.is_background);
	}

	#[test]
	fn background_only_at_end() {
		assert_eq!(parse("sleep 1 & | cat"), Err(ParseError::MisplacedBackground));
		assert_eq!(parse("a & b"), Err(ParseError::MisplacedBackground));
	}

	#[test]
	fn redirects_are_stripped_from_arguments() {
		let pipeline = parse("sort < in -r >> out").unwrap().unwrap();
		let command = &pipeline.commands[0];
		assert_eq!(command.arguments, vec!["sort", "-r"]);
		assert_eq!(command.redirects, vec![
			Redirect { target: "in", typ: RedirectType::Input },
			Redirect { target: "out", typ: RedirectType::Append },
		]);
	}

	#[test]
	fn missing_redirect_target() {
		assert_eq!(parse("echo hi >"), Err(ParseError::MissingTarget(">")));
		assert_eq!(parse("cat < | wc"), Err(ParseError::MissingTarget("<")));
		assert_eq!(parse("echo hi >> &"), Err(ParseError::MissingTarget(">>")));
	}

	#[test]
	fn empty_stage() {
		assert_eq!(parse("| cat"), Err(ParseError::EmptyCommand));
		assert_eq!(parse("ls |"), Err(ParseError::EmptyCommand));
		assert_eq!(parse("ls | | wc"), Err(ParseError::EmptyCommand));
		assert_eq!(parse("&"), Err(ParseError::EmptyCommand));
		assert_eq!(parse("> out"), Err(ParseError::EmptyCommand));
	}
}
