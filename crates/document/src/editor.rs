//! Presentation surfaces attached to a document.

use std::collections::BTreeMap;

use folio_primitives::Range;

use crate::event::DocumentObserver;

/// Where command output should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPlacement {
	/// Replace the input ranges.
	#[default]
	Replace,
	/// Insert after the input ranges.
	After,
	/// Replace the whole document.
	ReplaceDocument,
	/// Open in a new document.
	NewDocument,
	/// Show as a tooltip.
	ToolTip,
	/// Discard.
	Discard,
}

/// How command output should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
	/// Plain text.
	#[default]
	Text,
	/// A snippet with tab stops.
	Snippet,
	/// HTML to render.
	Html,
	/// Completion candidates, one per line.
	Completions,
}

/// Where the caret goes after output is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaretPlacement {
	/// After the inserted output.
	#[default]
	AfterOutput,
	/// Select the inserted output.
	SelectOutput,
	/// Keep the caret's line and column.
	Interpolate,
	/// Keep the heuristic position.
	Heuristic,
}

/// Output produced by an external command for an editor to route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRequest {
	/// The produced text.
	pub text: String,
	/// Placement policy.
	pub placement: OutputPlacement,
	/// Format policy.
	pub format: OutputFormat,
	/// Caret policy.
	pub caret: CaretPlacement,
	/// Input ranges the command ran on.
	pub ranges: Vec<Range>,
	/// Environment the command ran with.
	pub environment: BTreeMap<String, String>,
}

/// A presentation surface showing a document.
///
/// Editors receive every [`crate::DocumentEvent`] before plain subscribers.
/// The first registered editor receives output requests.
pub trait DocumentEditor: DocumentObserver {
	/// Handles command output. Returns true if the output was consumed.
	fn handle_output(&self, request: &OutputRequest) -> bool;
}
