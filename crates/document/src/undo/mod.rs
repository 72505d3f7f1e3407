//! Grouped undo/redo history.
//!
//! Every step stores forward and inverse [`Edit`]s rather than snapshots,
//! together with the selection before and after the step. Steps carry
//! monotonic identifiers so the clean (saved) checkpoint survives eviction of
//! old history.

#[cfg(test)]
mod tests;

use folio_primitives::{Edit, Selection};

use crate::buffer::TextBuffer;
use crate::error::RangeError;

/// Maximum undo history size in steps.
pub const MAX_UNDO: usize = 1000;

/// A single step in the undo/redo history.
///
/// Bundles the edits made inside one outermost grouping, or a single
/// ungrouped edit.
#[derive(Debug, Clone)]
pub struct UndoStep {
	id: u64,
	/// Edits applied during the forward operation (for redo).
	pub redo: Vec<Edit>,
	/// Inverse edits (for undo), applied in reverse order.
	pub undo: Vec<Edit>,
	/// Selection before the first edit of the step.
	pub selection_before: Selection,
	/// Selection after the last edit of the step.
	pub selection_after: Selection,
}

impl UndoStep {
	fn new(id: u64, selection: &Selection) -> Self {
		Self {
			id,
			redo: Vec::new(),
			undo: Vec::new(),
			selection_before: selection.clone(),
			selection_after: selection.clone(),
		}
	}

	fn push(&mut self, forward: Edit, inverse: Edit, after: &Selection) {
		self.redo.push(forward);
		self.undo.push(inverse);
		self.selection_after = after.clone();
	}

	/// Number of edits in the step.
	pub fn len(&self) -> usize {
		self.redo.len()
	}

	/// Returns true if the step holds no edits.
	pub fn is_empty(&self) -> bool {
		self.redo.is_empty()
	}
}

/// Result of a successful undo or redo.
#[derive(Debug, Clone)]
pub struct Reverted {
	/// The edits applied to the buffer, in application order.
	pub edits: Vec<Edit>,
	/// The selection to restore.
	pub selection: Selection,
	/// Whether any applied edit started on the first line.
	pub first_line_touched: bool,
}

/// Transaction-based grouped undo history.
#[derive(Debug, Default)]
pub struct UndoEngine {
	undo_stack: Vec<UndoStep>,
	redo_stack: Vec<UndoStep>,
	/// Step being accumulated while a grouping is open.
	open: Option<UndoStep>,
	depth: usize,
	next_id: u64,
	/// Id of the newest evicted step; the state at the bottom of the stack.
	base: Option<u64>,
	/// State recorded by the last [`UndoEngine::mark_clean`].
	clean: Option<u64>,
}

impl UndoEngine {
	/// Creates an empty history.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns whether undo is available.
	pub fn can_undo(&self) -> bool {
		!self.undo_stack.is_empty() || self.open.as_ref().is_some_and(|s| !s.is_empty())
	}

	/// Returns whether redo is available.
	pub fn can_redo(&self) -> bool {
		!self.redo_stack.is_empty()
	}

	/// Returns the number of closed steps in the undo stack.
	pub fn undo_len(&self) -> usize {
		self.undo_stack.len()
	}

	/// Returns the number of steps in the redo stack.
	pub fn redo_len(&self) -> usize {
		self.redo_stack.len()
	}

	/// Current grouping depth; zero when no group is open.
	pub fn group_depth(&self) -> usize {
		self.depth
	}

	/// Opens a grouping. Groupings nest; only the outermost one forms a step.
	pub fn begin_grouping(&mut self, selection: &Selection) {
		self.depth += 1;
		if self.depth == 1 {
			let id = self.alloc_id();
			self.open = Some(UndoStep::new(id, selection));
		}
	}

	/// Closes a grouping. Returns true if this closed the outermost group.
	///
	/// An end without a matching begin is logged and ignored.
	pub fn end_grouping(&mut self) -> bool {
		if self.depth == 0 {
			tracing::warn!("undo.end_grouping without open group");
			return false;
		}
		self.depth -= 1;
		if self.depth == 0 {
			self.close_open_group();
			return true;
		}
		false
	}

	/// Records an applied edit and its inverse.
	///
	/// With no open group the edit forms its own step. Clears the redo stack.
	pub fn record_edit(&mut self, forward: Edit, inverse: Edit, before: &Selection, after: &Selection) {
		self.redo_stack.clear();
		if let Some(step) = self.open.as_mut() {
			step.push(forward, inverse, after);
			return;
		}
		let mut step = UndoStep::new(self.alloc_id(), before);
		step.push(forward, inverse, after);
		self.push_undo(step);
	}

	/// Reverts the newest step, applying its inverse edits in reverse order.
	///
	/// Closes any open grouping first. Returns `None` when there is nothing
	/// to undo.
	pub fn undo(&mut self, buffer: &mut TextBuffer) -> Result<Option<Reverted>, RangeError> {
		self.force_close();
		let Some(step) = self.undo_stack.pop() else {
			return Ok(None);
		};

		let (edits, first_line_touched) = match apply_all(buffer, step.undo.iter().rev()) {
			Ok(applied) => applied,
			Err(e) => {
				self.undo_stack.push(step);
				return Err(e);
			}
		};

		let selection = step.selection_before.clone();
		self.redo_stack.push(step);
		Ok(Some(Reverted {
			edits,
			selection,
			first_line_touched,
		}))
	}

	/// Re-applies the newest undone step.
	pub fn redo(&mut self, buffer: &mut TextBuffer) -> Result<Option<Reverted>, RangeError> {
		self.force_close();
		let Some(step) = self.redo_stack.pop() else {
			return Ok(None);
		};

		let (edits, first_line_touched) = match apply_all(buffer, step.redo.iter()) {
			Ok(applied) => applied,
			Err(e) => {
				self.redo_stack.push(step);
				return Err(e);
			}
		};

		let selection = step.selection_after.clone();
		self.push_undo(step);
		Ok(Some(Reverted {
			edits,
			selection,
			first_line_touched,
		}))
	}

	/// Records the current state as the saved checkpoint.
	pub fn mark_clean(&mut self) {
		self.clean = self.top();
	}

	/// Returns true if the history is at the saved checkpoint.
	pub fn is_clean(&self) -> bool {
		self.top() == self.clean
	}

	/// Drops all history and resets the clean checkpoint to the current state.
	pub fn clear(&mut self) {
		self.undo_stack.clear();
		self.redo_stack.clear();
		self.open = None;
		self.depth = 0;
		self.base = None;
		self.clean = None;
	}

	fn top(&self) -> Option<u64> {
		if let Some(step) = self.open.as_ref().filter(|s| !s.is_empty()) {
			return Some(step.id);
		}
		self.undo_stack.last().map(|s| s.id).or(self.base)
	}

	fn alloc_id(&mut self) -> u64 {
		self.next_id += 1;
		self.next_id
	}

	fn close_open_group(&mut self) {
		if let Some(step) = self.open.take()
			&& !step.is_empty()
		{
			self.push_undo(step);
		}
	}

	fn force_close(&mut self) {
		if self.depth > 0 {
			tracing::debug!(depth = self.depth, "undo.closing open group");
			self.depth = 0;
			self.close_open_group();
		}
	}

	fn push_undo(&mut self, step: UndoStep) {
		self.undo_stack.push(step);
		while self.undo_stack.len() > MAX_UNDO {
			let oldest = self.undo_stack.remove(0);
			self.base = Some(oldest.id);
		}
	}
}

/// Applies edits in order, collecting them and whether any touched line 1.
fn apply_all<'a>(
	buffer: &mut TextBuffer,
	edits: impl Iterator<Item = &'a Edit>,
) -> Result<(Vec<Edit>, bool), RangeError> {
	let mut applied = Vec::new();
	let mut first_line_touched = false;
	for edit in edits {
		first_line_touched |= buffer.apply(edit)?.first_line_touched;
		applied.push(edit.clone());
	}
	Ok((applied, first_line_touched))
}
