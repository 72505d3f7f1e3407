//! Typed annotations anchored to byte offsets.
//!
//! A [`MarkTable`] maps a mark type (such as `"bookmark"` or `"search"`) to
//! an ordered set of `(offset, content)` pairs. Anchors are rebased through
//! every edit: marks before the edit stay, marks at or after its end shift,
//! and marks inside the replaced span are dropped.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use folio_primitives::Edit;
use serde::Serialize;

use crate::buffer::TextBuffer;

/// Marks of every type for one document.
#[derive(Debug, Clone, Default)]
pub struct MarkTable {
	types: BTreeMap<String, BTreeMap<usize, String>>,
}

#[derive(Serialize)]
struct MarkEntry<'a> {
	pos: String,
	content: &'a str,
}

impl MarkTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a mark, replacing any mark of the same type at `offset`.
	pub fn set(&mut self, mark_type: &str, offset: usize, content: impl Into<String>) {
		self.types
			.entry(mark_type.to_string())
			.or_default()
			.insert(offset, content.into());
	}

	/// Removes the mark of `mark_type` at `offset`. Returns true if one existed.
	pub fn remove(&mut self, mark_type: &str, offset: usize) -> bool {
		let Some(marks) = self.types.get_mut(mark_type) else {
			return false;
		};
		let removed = marks.remove(&offset).is_some();
		if marks.is_empty() {
			self.types.remove(mark_type);
		}
		removed
	}

	/// Removes every mark of `mark_type`. Returns true if any existed.
	pub fn remove_all(&mut self, mark_type: &str) -> bool {
		self.types.remove(mark_type).is_some_and(|m| !m.is_empty())
	}

	/// Removes every mark of every type. Returns true if any existed.
	pub fn clear(&mut self) -> bool {
		let had_marks = !self.types.is_empty();
		self.types.clear();
		had_marks
	}

	/// Iterates over marks of `mark_type` in offset order.
	pub fn marks_of_type<'a>(&'a self, mark_type: &str) -> impl Iterator<Item = (usize, &'a str)> + use<'a> {
		self.types
			.get(mark_type)
			.into_iter()
			.flat_map(|m| m.iter().map(|(&pos, content)| (pos, content.as_str())))
	}

	/// Returns the content of the mark at `offset`, if any.
	pub fn get(&self, mark_type: &str, offset: usize) -> Option<&str> {
		self.types.get(mark_type)?.get(&offset).map(String::as_str)
	}

	/// Iterates over the mark types currently present.
	pub fn types(&self) -> impl Iterator<Item = &str> {
		self.types.keys().map(String::as_str)
	}

	/// Returns true if no marks are set.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Rebases all anchors through an applied edit.
	///
	/// Returns true if any mark moved or was dropped.
	pub fn rebase(&mut self, edit: &Edit) -> bool {
		let mut changed = false;
		for marks in self.types.values_mut() {
			if marks.range(edit.start..).next().is_none() {
				continue;
			}
			let old = std::mem::take(marks);
			for (pos, content) in old {
				match edit.rebase_anchor(pos) {
					Some(new_pos) => {
						changed |= new_pos != pos;
						marks.insert(new_pos, content);
					}
					None => changed = true,
				}
			}
		}
		self.types.retain(|_, marks| !marks.is_empty());
		changed
	}

	/// Serializes marks of `mark_type` as a compact JSON array.
	///
	/// Each entry is `{"pos":"LINE:COL","content":"..."}` with one-based line
	/// and byte column, in offset order.
	pub fn stringify(&self, mark_type: &str, buffer: &TextBuffer) -> Result<String, serde_json::Error> {
		let entries: Vec<MarkEntry<'_>> = self
			.marks_of_type(mark_type)
			.map(|(offset, content)| {
				let pos = buffer
					.offset_to_pos(offset.min(buffer.len_bytes()))
					.unwrap_or_default();
				MarkEntry {
					pos: pos.to_string(),
					content,
				}
			})
			.collect();
		serde_json::to_string(&entries)
	}
}
