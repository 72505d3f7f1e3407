use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A line/column position in the text.
///
/// Both fields are zero-based; `column` counts bytes from the start of the
/// line. The textual form (`Display`/`FromStr`) is one-based, `LINE:COLUMN`,
/// with the column optional when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextPos {
	/// Zero-based line index.
	pub line: usize,
	/// Zero-based byte column within the line.
	pub column: usize,
}

impl TextPos {
	/// Creates a position from zero-based line and column.
	pub const fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}
}

impl fmt::Display for TextPos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line + 1, self.column + 1)
	}
}

/// Error returned when a `LINE[:COLUMN]` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid text position {input:?}: expected LINE[:COLUMN] with one-based numbers")]
pub struct ParsePosError {
	/// The rejected input.
	pub input: String,
}

impl FromStr for TextPos {
	type Err = ParsePosError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ParsePosError { input: s.to_string() };
		let (line, column) = match s.split_once(':') {
			Some((line, column)) => (line, Some(column)),
			None => (s, None),
		};
		let line: usize = line.trim().parse().map_err(|_| err())?;
		let column: usize = match column {
			Some(c) => c.trim().parse().map_err(|_| err())?,
			None => 1,
		};
		if line == 0 || column == 0 {
			return Err(err());
		}
		Ok(Self::new(line - 1, column - 1))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_is_one_based() {
		assert_eq!(TextPos::new(0, 4).to_string(), "1:5");
	}

	#[test]
	fn parse_line_only() {
		assert_eq!("3".parse::<TextPos>(), Ok(TextPos::new(2, 0)));
	}

	#[test]
	fn parse_roundtrip() {
		let pos = TextPos::new(9, 12);
		assert_eq!(pos.to_string().parse::<TextPos>(), Ok(pos));
	}

	#[test]
	fn parse_rejects_zero_and_garbage() {
		assert!("0:1".parse::<TextPos>().is_err());
		assert!("a:b".parse::<TextPos>().is_err());
		assert!("".parse::<TextPos>().is_err());
	}
}
