use crate::edit::{Bias, Edit};

/// Selection direction (anchor to head).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	/// Head is after anchor (normal selection).
	Forward,
	/// Head is before anchor (reverse selection).
	Backward,
}

/// A position in the text, measured in bytes of the UTF-8 encoding.
///
/// This is the canonical coordinate space for Folio: marks, edits, and
/// selections all address the buffer by byte offset.
pub type ByteIdx = usize;

/// A length or count in the text, measured in bytes.
///
/// Distinct from [`ByteIdx`] to avoid passing an index where a length is
/// expected or vice versa.
pub type ByteLen = usize;

/// A text range defined by anchor and head positions.
///
/// The anchor is the fixed end, and the head moves during selection extension.
/// The covered extent is the half-open interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
	/// The fixed end of the range.
	pub anchor: ByteIdx,
	/// The moving end of the range (cursor position).
	pub head: ByteIdx,
}

impl Range {
	/// Creates a new range from anchor to head.
	pub fn new(anchor: ByteIdx, head: ByteIdx) -> Self {
		Self { anchor, head }
	}

	/// Creates a zero-width range (cursor) at the given position.
	pub fn point(pos: ByteIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the smaller of anchor and head.
	#[inline]
	pub fn min(&self) -> ByteIdx {
		std::cmp::min(self.anchor, self.head)
	}

	/// Returns the larger of anchor and head.
	#[inline]
	pub fn max(&self) -> ByteIdx {
		std::cmp::max(self.anchor, self.head)
	}

	/// Returns the covered extent as a standard half-open range.
	#[inline]
	pub fn span(&self) -> std::ops::Range<ByteIdx> {
		self.min()..self.max()
	}

	/// Returns the length of the range in bytes.
	#[inline]
	pub fn len(&self) -> ByteLen {
		self.max() - self.min()
	}

	/// Returns true if anchor equals head (zero-width cursor).
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.anchor == self.head
	}

	/// Returns the direction of this range.
	#[inline]
	pub fn direction(&self) -> Direction {
		if self.head < self.anchor {
			Direction::Backward
		} else {
			Direction::Forward
		}
	}

	/// Returns a new range with anchor and head swapped.
	pub fn flip(&self) -> Self {
		Self {
			anchor: self.head,
			head: self.anchor,
		}
	}

	/// Returns true if the two extents share at least one byte, or if either
	/// is a cursor sitting inside the other.
	pub fn overlaps(&self, other: &Range) -> bool {
		self.min() < other.max() && other.min() < self.max()
			|| self.min() == other.min()
	}

	/// Returns true if `pos` lies within `[min, max]`.
	pub fn contains(&self, pos: ByteIdx) -> bool {
		self.min() <= pos && pos <= self.max()
	}

	/// Returns the smallest range covering both, keeping this range's direction.
	pub fn merge(&self, other: &Range) -> Self {
		let (min, max) = (self.min().min(other.min()), self.max().max(other.max()));
		match self.direction() {
			Direction::Forward => Self::new(min, max),
			Direction::Backward => Self::new(max, min),
		}
	}

	/// Clamps both ends to `len`.
	pub fn clamp(&self, len: ByteLen) -> Self {
		Self::new(self.anchor.min(len), self.head.min(len))
	}

	/// Maps both ends of the range through an edit.
	///
	/// Cursors collapse to the end of inserted text; anchors of extended
	/// ranges keep their side of an insertion at the boundary.
	pub fn map(&self, edit: &Edit) -> Self {
		if self.is_empty() {
			let pos = edit.map_pos(self.head, Bias::Right);
			return Self::point(pos);
		}
		let (anchor_bias, head_bias) = match self.direction() {
			Direction::Forward => (Bias::Left, Bias::Right),
			Direction::Backward => (Bias::Right, Bias::Left),
		};
		Self {
			anchor: edit.map_pos(self.anchor, anchor_bias),
			head: edit.map_pos(self.head, head_bias),
		}
	}
}

impl From<std::ops::Range<ByteIdx>> for Range {
	fn from(range: std::ops::Range<ByteIdx>) -> Self {
		Self::new(range.start, range.end)
	}
}
