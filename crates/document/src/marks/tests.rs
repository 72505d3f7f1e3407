use proptest::prelude::*;

use super::*;

#[test]
fn mark_shifts_after_edit_before_it() {
	let mut marks = MarkTable::new();
	marks.set("bookmark", 10, "x");
	assert!(marks.rebase(&Edit::new(0..5, "ab")));
	assert_eq!(marks.marks_of_type("bookmark").collect::<Vec<_>>(), vec![(7, "x")]);
}

#[test]
fn overlapping_edit_drops_mark() {
	let mut marks = MarkTable::new();
	marks.set("bookmark", 10, "x");
	assert!(marks.rebase(&Edit::delete(8, 12)));
	assert!(marks.is_empty());
}

#[test]
fn edit_after_mark_leaves_it() {
	let mut marks = MarkTable::new();
	marks.set("bookmark", 3, "x");
	assert!(!marks.rebase(&Edit::insert(10, "abc")));
	assert_eq!(marks.get("bookmark", 3), Some("x"));
}

#[test]
fn set_replaces_at_same_offset() {
	let mut marks = MarkTable::new();
	marks.set("note", 4, "first");
	marks.set("note", 4, "second");
	marks.set("other", 4, "kept");
	assert_eq!(marks.marks_of_type("note").collect::<Vec<_>>(), vec![(4, "second")]);
	assert_eq!(marks.get("other", 4), Some("kept"));
}

#[test]
fn remove_and_remove_all() {
	let mut marks = MarkTable::new();
	marks.set("a", 1, "");
	marks.set("a", 2, "");
	marks.set("b", 1, "");
	assert!(marks.remove("a", 1));
	assert!(!marks.remove("a", 1));
	assert!(marks.remove_all("a"));
	assert!(!marks.remove_all("a"));
	assert_eq!(marks.types().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn stringify_uses_one_based_positions() {
	let buffer = TextBuffer::new("first\nsecond \"line\"\n");
	let mut marks = MarkTable::new();
	marks.set("bookmark", 8, "say \"hi\"");
	marks.set("bookmark", 0, "top");
	let json = marks.stringify("bookmark", &buffer).unwrap();
	assert_eq!(
		json,
		r#"[{"pos":"1:1","content":"top"},{"pos":"2:3","content":"say \"hi\""}]"#
	);
	assert_eq!(marks.stringify("missing", &buffer).unwrap(), "[]");
}

proptest! {
	/// Surviving marks keep their relative order and stay in bounds.
	#[test]
	fn prop_rebase_keeps_order(
		positions in prop::collection::btree_set(0usize..100, 0..10),
		a in 0usize..=100,
		b in 0usize..=100,
		inserted in 0usize..20,
	) {
		let mut marks = MarkTable::new();
		for &p in &positions {
			marks.set("m", p, p.to_string());
		}
		let (start, end) = (a.min(b), a.max(b));
		marks.rebase(&Edit::new(start..end, "x".repeat(inserted)));

		let survivors: Vec<_> = marks.marks_of_type("m").collect();
		let originals: Vec<usize> = survivors.iter().map(|(_, c)| c.parse().unwrap()).collect();
		prop_assert!(originals.windows(2).all(|w| w[0] < w[1]));
		for (pos, original) in survivors.iter().map(|(p, _)| *p).zip(originals) {
			prop_assert!(original < start || original >= end);
			prop_assert!(pos <= 100 + inserted);
		}
	}
}
