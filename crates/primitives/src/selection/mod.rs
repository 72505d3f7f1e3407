use smallvec::{SmallVec, smallvec};

use crate::edit::Edit;
use crate::range::{ByteIdx, ByteLen, Direction, Range};


/// A set of non-overlapping byte ranges with a designated primary.
///
/// A selection always contains at least one range. The primary range is the
/// one reported to editors as the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
	/// The collection of selection ranges (always non-empty).
	ranges: SmallVec<[Range; 1]>,
	/// Index of the primary range within `ranges`.
	primary_index: usize,
}

impl Selection {
	/// Creates a selection from a primary range plus any number of others.
	pub fn new(primary: Range, others: impl IntoIterator<Item = Range>) -> Self {
		let mut ranges: SmallVec<[Range; 1]> = smallvec![primary];
		ranges.extend(others);

		let mut sel = Self { ranges, primary_index: 0 };
		sel.normalize();
		sel
	}

	/// Creates a single-range selection.
	pub fn single(anchor: ByteIdx, head: ByteIdx) -> Self {
		Self {
			ranges: smallvec![Range::new(anchor, head)],
			primary_index: 0,
		}
	}

	/// Creates a point selection (zero-width cursor).
	pub fn point(pos: ByteIdx) -> Self {
		Self::single(pos, pos)
	}

	/// Returns the primary range.
	pub fn primary(&self) -> Range {
		self.ranges[self.primary_index]
	}

	/// Returns the index of the primary range.
	pub fn primary_index(&self) -> usize {
		self.primary_index
	}

	/// Returns all ranges, sorted by start.
	pub fn ranges(&self) -> &[Range] {
		&self.ranges
	}

	/// Returns the number of ranges in this selection (at least 1).
	#[allow(clippy::len_without_is_empty, reason = "Selection is never empty")]
	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	/// Iterates over all ranges.
	pub fn iter(&self) -> impl Iterator<Item = &Range> {
		self.ranges.iter()
	}

	/// Returns the direction of the primary range.
	pub fn direction(&self) -> Direction {
		self.primary().direction()
	}

	/// Transforms all ranges using the given function, returning a new selection.
	pub fn transform<F>(&self, mut f: F) -> Self
	where
		F: FnMut(&Range) -> Range,
	{
		let primary = f(&self.primary());
		let others = self
			.ranges
			.iter()
			.enumerate()
			.filter(|&(i, _)| i != self.primary_index)
			.map(|(_, r)| f(r));

		Self::new(primary, others)
	}

	/// Maps every range through an edit.
	pub fn map(&self, edit: &Edit) -> Self {
		self.transform(|r| r.map(edit))
	}

	/// Clamps all ranges to `[0, len]`.
	pub fn clamp(&self, len: ByteLen) -> Self {
		self.transform(|r| r.clamp(len))
	}

	/// Returns true if any range contains the given position.
	pub fn contains(&self, pos: ByteIdx) -> bool {
		self.ranges.iter().any(|r| r.contains(pos))
	}

	/// Sorts ranges and merges overlapping ones, tracking the primary.
	///
	/// Adjacent ranges such as `[0, 5)` and `[5, 10)` stay separate.
	fn normalize(&mut self) {
		if self.ranges.len() <= 1 {
			return;
		}

		let primary = self.ranges[self.primary_index];
		self.ranges.sort_by_key(|r| r.min());

		let mut merged: SmallVec<[Range; 1]> = SmallVec::new();
		let mut primary_index = 0;

		for range in &self.ranges {
			if let Some(last) = merged.last_mut()
				&& last.overlaps(range)
			{
				let old_last = *last;
				*last = last.merge(range);
				if *range == primary || old_last == primary {
					primary_index = merged.len() - 1;
				}
				continue;
			}

			if *range == primary {
				primary_index = merged.len();
			}
			merged.push(*range);
		}

		self.ranges = merged;
		self.primary_index = primary_index.min(self.ranges.len().saturating_sub(1));
	}
}

impl Default for Selection {
	fn default() -> Self {
		Self::point(0)
	}
}

impl From<Range> for Selection {
	fn from(range: Range) -> Self {
		Self {
			ranges: smallvec![range],
			primary_index: 0,
		}
	}
}
