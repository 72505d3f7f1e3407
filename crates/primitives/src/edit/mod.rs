use crate::range::{ByteIdx, ByteLen};


/// Identifier handed out for every successfully applied edit.
///
/// Identifiers are unique per buffer and strictly increasing, which lets
/// observers order edits without comparing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditId(pub u64);

/// Bias determines how positions at edit boundaries are mapped.
///
/// When mapping a position through an insertion at exactly that position,
/// bias decides whether the position stays before the inserted text or moves
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// A single text change: replace the bytes `[start, end)` with `replacement`.
///
/// Deletion is an empty replacement; insertion is an empty range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
	/// The starting byte offset of the change.
	pub start: ByteIdx,
	/// The ending byte offset of the change (exclusive).
	pub end: ByteIdx,
	/// The replacement text.
	pub replacement: String,
}

impl Edit {
	/// Creates an edit replacing `range` with `replacement`.
	pub fn new(range: std::ops::Range<ByteIdx>, replacement: impl Into<String>) -> Self {
		Self {
			start: range.start,
			end: range.end,
			replacement: replacement.into(),
		}
	}

	/// Creates a pure insertion at `at`.
	pub fn insert(at: ByteIdx, text: impl Into<String>) -> Self {
		Self::new(at..at, text)
	}

	/// Creates a pure deletion of `[start, end)`.
	pub fn delete(start: ByteIdx, end: ByteIdx) -> Self {
		Self::new(start..end, String::new())
	}

	/// Returns the replaced byte range in pre-edit coordinates.
	pub fn range(&self) -> std::ops::Range<ByteIdx> {
		self.start..self.end
	}

	/// Number of bytes removed from the source text.
	#[inline]
	pub fn removed_len(&self) -> ByteLen {
		self.end - self.start
	}

	/// Number of bytes inserted in their place.
	#[inline]
	pub fn inserted_len(&self) -> ByteLen {
		self.replacement.len()
	}

	/// Builds the edit that undoes this one, given the text it removed.
	pub fn inverse(&self, removed: impl Into<String>) -> Edit {
		Edit {
			start: self.start,
			end: self.start + self.inserted_len(),
			replacement: removed.into(),
		}
	}

	/// Maps a position through this edit using the specified bias.
	///
	/// Positions inside the replaced span collapse to its start.
	pub fn map_pos(&self, pos: ByteIdx, bias: Bias) -> ByteIdx {
		if pos < self.start {
			return pos;
		}
		if pos == self.start && self.start == self.end {
			return match bias {
				Bias::Left => pos,
				Bias::Right => pos + self.inserted_len(),
			};
		}
		if pos < self.end {
			return self.start;
		}
		pos - self.removed_len() + self.inserted_len()
	}

	/// Rebases an anchored position through this edit.
	///
	/// Anchors before the edit are untouched, anchors at or after its end
	/// shift by the length delta, and anchors inside the replaced span no
	/// longer refer to surviving text and are dropped.
	pub fn rebase_anchor(&self, pos: ByteIdx) -> Option<ByteIdx> {
		if pos < self.start {
			Some(pos)
		} else if pos >= self.end {
			Some(pos - self.removed_len() + self.inserted_len())
		} else {
			None
		}
	}
}
