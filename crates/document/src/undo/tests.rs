use proptest::prelude::*;

use super::*;

fn edit(buffer: &mut TextBuffer, engine: &mut UndoEngine, forward: Edit) {
	let applied = buffer.apply(&forward).unwrap();
	let inverse = forward.inverse(applied.removed);
	let sel = Selection::point(0);
	engine.record_edit(forward, inverse, &sel, &sel);
}

#[test]
fn single_edits_form_their_own_steps() {
	let mut buf = TextBuffer::new("abc");
	let mut undo = UndoEngine::new();
	edit(&mut buf, &mut undo, Edit::insert(3, "d"));
	edit(&mut buf, &mut undo, Edit::insert(4, "e"));
	assert_eq!(undo.undo_len(), 2);

	undo.undo(&mut buf).unwrap();
	assert_eq!(buf.to_string(), "abcd");
	assert!(undo.can_redo());
}

#[test]
fn grouped_edits_undo_together() {
	let mut buf = TextBuffer::new("");
	let mut undo = UndoEngine::new();
	let sel = Selection::point(0);
	undo.begin_grouping(&sel);
	edit(&mut buf, &mut undo, Edit::insert(0, "a"));
	undo.begin_grouping(&sel);
	edit(&mut buf, &mut undo, Edit::insert(1, "b"));
	assert!(!undo.end_grouping());
	edit(&mut buf, &mut undo, Edit::insert(2, "c"));
	assert!(undo.end_grouping());

	assert_eq!(undo.undo_len(), 1);
	let reverted = undo.undo(&mut buf).unwrap().unwrap();
	assert_eq!(reverted.edits.len(), 3);
	assert_eq!(buf.to_string(), "");
	assert!(!undo.can_undo());
}

#[test]
fn unbalanced_end_is_ignored() {
	let mut undo = UndoEngine::new();
	assert!(!undo.end_grouping());
	assert_eq!(undo.group_depth(), 0);
}

#[test]
fn empty_group_records_nothing() {
	let mut undo = UndoEngine::new();
	undo.begin_grouping(&Selection::point(0));
	undo.end_grouping();
	assert!(!undo.can_undo());
	assert!(undo.is_clean());
}

#[test]
fn undo_closes_open_group() {
	let mut buf = TextBuffer::new("x");
	let mut undo = UndoEngine::new();
	undo.begin_grouping(&Selection::point(0));
	edit(&mut buf, &mut undo, Edit::insert(1, "y"));
	assert!(undo.can_undo());

	undo.undo(&mut buf).unwrap();
	assert_eq!(undo.group_depth(), 0);
	assert_eq!(buf.to_string(), "x");
}

#[test]
fn new_edit_clears_redo() {
	let mut buf = TextBuffer::new("");
	let mut undo = UndoEngine::new();
	edit(&mut buf, &mut undo, Edit::insert(0, "a"));
	undo.undo(&mut buf).unwrap();
	assert!(undo.can_redo());
	edit(&mut buf, &mut undo, Edit::insert(0, "b"));
	assert!(!undo.can_redo());
}

#[test]
fn undo_on_empty_stack_is_noop() {
	let mut buf = TextBuffer::new("abc");
	let mut undo = UndoEngine::new();
	assert!(undo.undo(&mut buf).unwrap().is_none());
	assert!(undo.redo(&mut buf).unwrap().is_none());
	assert_eq!(buf.version(), 0);
}

#[test]
fn selection_restored_from_step() {
	let mut buf = TextBuffer::new("abc");
	let mut undo = UndoEngine::new();
	let forward = Edit::insert(3, "d");
	let applied = buf.apply(&forward).unwrap();
	undo.record_edit(forward.clone(), forward.inverse(applied.removed), &Selection::point(3), &Selection::point(4));

	assert_eq!(undo.undo(&mut buf).unwrap().unwrap().selection, Selection::point(3));
	assert_eq!(undo.redo(&mut buf).unwrap().unwrap().selection, Selection::point(4));
}

#[test]
fn clean_checkpoint_tracks_undo_and_redo() {
	let mut buf = TextBuffer::new("");
	let mut undo = UndoEngine::new();
	assert!(undo.is_clean());

	edit(&mut buf, &mut undo, Edit::insert(0, "a"));
	assert!(!undo.is_clean());
	undo.mark_clean();
	assert!(undo.is_clean());

	edit(&mut buf, &mut undo, Edit::insert(1, "b"));
	assert!(!undo.is_clean());
	undo.undo(&mut buf).unwrap();
	assert!(undo.is_clean());
	undo.undo(&mut buf).unwrap();
	assert!(!undo.is_clean());
	undo.redo(&mut buf).unwrap();
	assert!(undo.is_clean());
}

#[test]
fn eviction_keeps_clean_state() {
	let mut buf = TextBuffer::new("");
	let mut undo = UndoEngine::new();
	for i in 0..MAX_UNDO + 5 {
		edit(&mut buf, &mut undo, Edit::insert(i, "x"));
	}
	assert_eq!(undo.undo_len(), MAX_UNDO);
	assert!(!undo.is_clean());

	while undo.can_undo() {
		undo.undo(&mut buf).unwrap();
	}
	assert_eq!(buf.len_bytes(), 5);
	assert!(!undo.is_clean());
}

#[test]
fn eviction_preserves_checkpoint_at_top() {
	let mut buf = TextBuffer::new("");
	let mut undo = UndoEngine::new();
	for i in 0..MAX_UNDO {
		edit(&mut buf, &mut undo, Edit::insert(i, "x"));
	}
	undo.mark_clean();
	edit(&mut buf, &mut undo, Edit::insert(MAX_UNDO, "y"));
	assert!(!undo.is_clean());
	undo.undo(&mut buf).unwrap();
	assert!(undo.is_clean());
}

proptest! {
	/// Undoing every step restores the original text and the clean state.
	#[test]
	fn prop_undo_all_restores_original(
		original in "[a-z\n]{0,32}",
		ops in prop::collection::vec((0usize..64, 0usize..64, "[a-z]{0,4}"), 0..24),
	) {
		let mut buf = TextBuffer::new(&original);
		let mut undo = UndoEngine::new();
		for (a, b, text) in ops {
			let len = buf.len_bytes();
			let (start, end) = (a.min(b).min(len), a.max(b).min(len));
			edit(&mut buf, &mut undo, Edit::new(start..end, text));
		}
		while undo.can_undo() {
			undo.undo(&mut buf).unwrap();
		}
		prop_assert_eq!(buf.to_string(), original);
		prop_assert!(undo.is_clean());
	}
}
