//! Lifecycle notifications and the observer contract.

use std::path::PathBuf;

use folio_primitives::Edit;

use crate::document::Document;

/// What caused a content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
	/// A direct edit through the document.
	Edit,
	/// An undo step was reverted.
	Undo,
	/// An undone step was re-applied.
	Redo,
	/// Content was replaced by a load.
	Load,
}

/// Notification delivered to editors and subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
	/// The buffer changed; marks are already rebased.
	ContentChanged {
		/// Buffer version after the change.
		version: u64,
		/// Applied edits in order.
		edits: Vec<Edit>,
		/// Source of the change.
		cause: ChangeCause,
	},
	/// Marks were added, removed, or moved.
	MarksChanged {
		/// The affected type, or `None` when several types may have changed.
		mark_type: Option<String>,
	},
	/// A save is about to serialize the content.
	WillSave,
	/// A save completed.
	DidSave {
		/// The written path.
		path: PathBuf,
	},
	/// The document is closing.
	WillClose,
	/// A load or save is about to complete with a failure.
	WillShowAlert {
		/// The failure message carried by the completion.
		message: String,
	},
}

/// Receiver of document notifications.
///
/// Callbacks run while the document lock is held. They must not lock the
/// same document again through its handle.
pub trait DocumentObserver: Send + Sync {
	/// Called for every event, in registration order.
	fn on_event(&self, doc: &Document, event: &DocumentEvent);

	/// Called before [`DocumentEvent::WillSave`] is broadcast, with mutable
	/// access so the content can be adjusted before it is written.
	fn will_save(&self, _doc: &mut Document) {}
}

/// Handle returned by [`Document::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);
