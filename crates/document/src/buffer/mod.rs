//! Text storage for a document.
//!
//! [`TextBuffer`] owns the rope and a monotonically increasing version. All
//! offsets are byte offsets into the UTF-8 text, and every successful edit is
//! assigned an [`EditId`].


use std::ops::{ControlFlow, Range};

use folio_primitives::{Edit, EditId, Rope, RopeSlice, TextPos, first_line_end};

use crate::error::RangeError;

/// Outcome of [`TextBuffer::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
	/// Identifier of the edit.
	pub id: EditId,
	/// Text that was replaced.
	pub removed: String,
	/// Whether the edit started on the first line.
	pub first_line_touched: bool,
}

/// The textual content of a document.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
	rope: Rope,
	/// Incremented on every successful edit.
	version: u64,
	next_edit: u64,
}

impl TextBuffer {
	/// Creates a buffer holding `text`.
	pub fn new(text: &str) -> Self {
		Self {
			rope: Rope::from_str(text),
			version: 0,
			next_edit: 1,
		}
	}

	/// Returns the underlying rope.
	pub fn rope(&self) -> &Rope {
		&self.rope
	}

	/// Returns a slice over the whole text.
	pub fn slice(&self) -> RopeSlice<'_> {
		self.rope.slice(..)
	}

	/// Returns the current version.
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Length of the text in bytes.
	pub fn len_bytes(&self) -> usize {
		self.rope.len_bytes()
	}

	/// Number of lines; a trailing newline starts an empty last line.
	pub fn len_lines(&self) -> usize {
		self.rope.len_lines()
	}

	/// Returns true if the buffer holds no text.
	pub fn is_empty(&self) -> bool {
		self.rope.len_bytes() == 0
	}

	/// Copies out the text in `range`.
	///
	/// # Errors
	///
	/// Returns [`RangeError`] if the range is reversed, out of bounds, or splits
	/// a character.
	pub fn read(&self, range: Range<usize>) -> Result<String, RangeError> {
		self.check_range(&range)?;
		Ok(self.rope.byte_slice(range).to_string())
	}

	/// Visits the text as contiguous chunks, starting at byte `from`.
	///
	/// The callback receives each chunk with its absolute byte range and may
	/// return [`ControlFlow::Break`] to stop. Returns the offset to resume from
	/// when stopped early, or `None` when every chunk was visited.
	pub fn enumerate_byte_ranges<F>(&self, from: usize, mut f: F) -> Result<Option<usize>, RangeError>
	where
		F: FnMut(Range<usize>, &str) -> ControlFlow<()>,
	{
		self.check_offset(from)?;
		if from == self.len_bytes() {
			return Ok(None);
		}

		let (chunks, chunk_start, _, _) = self.rope.chunks_at_byte(from);
		let mut offset = chunk_start;
		for chunk in chunks {
			let chunk_end = offset + chunk.len();
			let skip = from.saturating_sub(offset);
			let piece = &chunk[skip..];
			let range = offset + skip..chunk_end;
			offset = chunk_end;
			if piece.is_empty() {
				continue;
			}
			if f(range, piece).is_break() {
				return Ok((chunk_end < self.len_bytes()).then_some(chunk_end));
			}
		}
		Ok(None)
	}

	/// Replaces `range` with `text`.
	///
	/// # Errors
	///
	/// Returns [`RangeError`] if the range is invalid; the buffer is unchanged.
	pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<EditId, RangeError> {
		self.apply(&Edit::new(range, text)).map(|applied| applied.id)
	}

	/// Applies an edit, returning its id and the text it removed.
	pub fn apply(&mut self, edit: &Edit) -> Result<Applied, RangeError> {
		let range = edit.range();
		self.check_range(&range)?;
		let first_line_touched = range.start <= self.first_line_end();

		let removed = self.rope.byte_slice(range.clone()).to_string();
		let char_start = self.rope.byte_to_char(range.start);
		let char_end = self.rope.byte_to_char(range.end);
		self.rope.remove(char_start..char_end);
		self.rope.insert(char_start, &edit.replacement);

		self.version = self.version.wrapping_add(1);
		let id = EditId(self.next_edit);
		self.next_edit += 1;
		tracing::trace!(
			edit = id.0,
			start = range.start,
			end = range.end,
			inserted = edit.inserted_len(),
			version = self.version,
			"buffer.apply"
		);
		Ok(Applied {
			id,
			removed,
			first_line_touched,
		})
	}

	/// Returns the first line without its terminator.
	pub fn first_line(&self) -> String {
		self.rope.byte_slice(..self.first_line_end()).to_string()
	}

	/// Byte offset where the first line ends.
	pub fn first_line_end(&self) -> usize {
		first_line_end(self.slice())
	}

	/// Converts a byte offset into a zero-based line/column position.
	pub fn offset_to_pos(&self, offset: usize) -> Result<TextPos, RangeError> {
		self.check_offset(offset)?;
		let line = self.rope.byte_to_line(offset);
		Ok(TextPos::new(line, offset - self.rope.line_to_byte(line)))
	}

	/// Converts a zero-based line/column position into a byte offset.
	///
	/// The column may address the line terminator's position but not past it.
	pub fn pos_to_offset(&self, pos: TextPos) -> Result<usize, RangeError> {
		let lines = self.len_lines();
		if pos.line >= lines {
			return Err(RangeError::LineOutOfBounds { line: pos.line, lines });
		}
		let start = self.rope.line_to_byte(pos.line);
		let end = if pos.line + 1 < lines {
			self.rope.line_to_byte(pos.line + 1) - 1
		} else {
			self.len_bytes()
		};
		let offset = start + pos.column;
		if offset > end {
			return Err(RangeError::OutOfBounds {
				start: offset,
				end: offset,
				len: self.len_bytes(),
			});
		}
		self.check_offset(offset)?;
		Ok(offset)
	}

	/// Checks that `offset` is within bounds and on a character boundary.
	pub fn validate_offset(&self, offset: usize) -> Result<(), RangeError> {
		self.check_offset(offset)
	}

	fn check_range(&self, range: &Range<usize>) -> Result<(), RangeError> {
		let len = self.len_bytes();
		if range.start > range.end || range.end > len {
			return Err(RangeError::OutOfBounds {
				start: range.start,
				end: range.end,
				len,
			});
		}
		self.check_offset(range.start)?;
		self.check_offset(range.end)
	}

	fn check_offset(&self, offset: usize) -> Result<(), RangeError> {
		let len = self.len_bytes();
		if offset > len {
			return Err(RangeError::OutOfBounds {
				start: offset,
				end: offset,
				len,
			});
		}
		if offset < len && self.rope.char_to_byte(self.rope.byte_to_char(offset)) != offset {
			return Err(RangeError::NotCharBoundary { offset });
		}
		Ok(())
	}
}

impl std::fmt::Display for TextBuffer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for chunk in self.rope.chunks() {
			f.write_str(chunk)?;
		}
		Ok(())
	}
}
