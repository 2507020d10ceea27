//! A deliberately small list-literal parser for table keys.
//!
//! The grammar only accepts a flat list of primitives:
//!
//! ```text
//! list      = "[" [ primitive { "," primitive } [ "," ] ] "]"
//! primitive = string | number | "True" | "False" | "None"
//! string    = "'" chars "'" | '"' chars '"'
//! ```
//!
//! Strings understand the usual backslash escapes. `None` becomes an empty
//! item.

use crate::record::float_repr;

/// Parse `text` into the list of item texts. Blank input is an empty list.
pub fn parse_list(text: &str) -> Result<Vec<String>, String> {
	if text.trim().is_empty() {
		return Ok(Vec::new());
	}

	let mut parser = LiteralParser::new(text);
	let items = parser.list()?;
	parser.skip_whitespace();
	if let Some(ch) = parser.peek() {
		return Err(parser.error(&format!("unexpected `{ch}` after the list")));
	}

	Ok(items)
}

struct LiteralParser<'a> {
	source: &'a str,
	position: usize,
}

impl<'a> LiteralParser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			position: 0,
		}
	}

	fn rest(&self) -> &'a str {
		&self.source[self.position..]
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		Some(ch)
	}

	fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.bump();
		}
	}

	fn error(&self, message: &str) -> String {
		format!("{message} at offset {}", self.position)
	}

	fn expect(&mut self, expected: char) -> Result<(), String> {
		match self.bump() {
			Some(ch) if ch == expected => Ok(()),
			Some(ch) => Err(self.error(&format!("expected `{expected}`, found `{ch}`"))),
			None => Err(self.error(&format!("expected `{expected}`, found end of input"))),
		}
	}

	fn list(&mut self) -> Result<Vec<String>, String> {
		self.skip_whitespace();
		match self.peek() {
			Some('[') => {}
			Some(_) => return Err(self.error("expected a list literal")),
			None => return Err(self.error("expected a list literal, found end of input")),
		}
		self.expect('[')?;

		let mut items = Vec::new();
		loop {
			self.skip_whitespace();
			if self.peek() == Some(']') {
				self.bump();
				return Ok(items);
			}

			items.push(self.primitive()?);

			self.skip_whitespace();
			match self.bump() {
				Some(',') => {}
				Some(']') => return Ok(items),
				Some(ch) => return Err(self.error(&format!("expected `,` or `]`, found `{ch}`"))),
				None => return Err(self.error("unterminated list")),
			}
		}
	}

	fn primitive(&mut self) -> Result<String, String> {
		match self.peek() {
			Some(quote @ ('\'' | '"')) => self.string(quote),
			Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => self.number(),
			Some(ch) if ch.is_ascii_alphabetic() => self.keyword(),
			Some('[' | '(' | '{') => Err(self.error("nested containers are not supported")),
			Some(ch) => Err(self.error(&format!("unexpected `{ch}`"))),
			None => Err(self.error("unexpected end of input")),
		}
	}

	fn keyword(&mut self) -> Result<String, String> {
		let start = self.position;
		while self
			.peek()
			.is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
		{
			self.bump();
		}

		match &self.source[start..self.position] {
			"True" => Ok("True".to_string()),
			"False" => Ok("False".to_string()),
			"None" => Ok(String::new()),
			other => {
				self.position = start;
				Err(self.error(&format!("`{other}` is not a literal")))
			}
		}
	}

	fn number(&mut self) -> Result<String, String> {
		let start = self.position;
		if matches!(self.peek(), Some('-' | '+')) {
			self.bump();
		}

		let mut is_float = false;
		while let Some(ch) = self.peek() {
			match ch {
				'0'..='9' | '_' => {}
				'.' => is_float = true,
				'e' | 'E' => {
					is_float = true;
					self.bump();
					if matches!(self.peek(), Some('-' | '+')) {
						self.bump();
					}
					continue;
				}
				_ => break,
			}
			self.bump();
		}

		let raw = self.source[start..self.position].replace('_', "");
		let invalid = || format!("invalid number `{raw}` at offset {start}");
		if is_float {
			let value: f64 = raw.parse().map_err(|_| invalid())?;
			Ok(float_repr(value))
		} else {
			let value: i128 = raw.parse().map_err(|_| invalid())?;
			Ok(value.to_string())
		}
	}

	fn string(&mut self, quote: char) -> Result<String, String> {
		let start = self.position;
		self.bump();
		let mut text = String::new();

		loop {
			let Some(ch) = self.bump() else {
				self.position = start;
				return Err(self.error("unterminated string"));
			};

			match ch {
				'\\' => self.escape(&mut text)?,
				'\n' => {
					self.position = start;
					return Err(self.error("unterminated string"));
				}
				c if c == quote => return Ok(text),
				c => text.push(c),
			}
		}
	}

	fn escape(&mut self, text: &mut String) -> Result<(), String> {
		let Some(ch) = self.bump() else {
			return Err(self.error("unterminated escape sequence"));
		};

		match ch {
			'\\' => text.push('\\'),
			'\'' => text.push('\''),
			'"' => text.push('"'),
			'n' => text.push('\n'),
			'r' => text.push('\r'),
			't' => text.push('\t'),
			'0' => text.push('\0'),
			'a' => text.push('\u{07}'),
			'b' => text.push('\u{08}'),
			'f' => text.push('\u{0c}'),
			'v' => text.push('\u{0b}'),
			'\n' => {}
			'x' => text.push(self.hex_escape(2)?),
			'u' => text.push(self.hex_escape(4)?),
			'U' => text.push(self.hex_escape(8)?),
			other => {
				text.push('\\');
				text.push(other);
			}
		}

		Ok(())
	}

	fn hex_escape(&mut self, digits: usize) -> Result<char, String> {
		let start = self.position;
		for _ in 0..digits {
			if !self.peek().is_some_and(|ch| ch.is_ascii_hexdigit()) {
				return Err(self.error("truncated hex escape"));
			}
			self.bump();
		}

		u32::from_str_radix(&self.source[start..self.position], 16)
			.ok()
			.and_then(char::from_u32)
			.ok_or_else(|| self.error("invalid unicode escape"))
	}
}
