//! Shared access to a document.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::document::{Document, DocumentId};
use crate::error::{DocumentError, Result};
use crate::io::{self, IoTask};
use crate::registry::RegistryInner;

pub(crate) struct HandleInner {
	id: DocumentId,
	doc: RwLock<Document>,
	/// Set while a load or save runs. Kept outside the lock.
	in_flight: AtomicBool,
	registry: Weak<RegistryInner>,
}

/// Cloneable, thread-safe reference to a [`Document`].
///
/// The lock is never held across an `.await`; callbacks passed to
/// [`DocumentHandle::with`] and [`DocumentHandle::with_mut`] must not lock
/// the same document again.
#[derive(Clone)]
pub struct DocumentHandle(Arc<HandleInner>);

impl DocumentHandle {
	pub(crate) fn new(document: Document, registry: Weak<RegistryInner>) -> Self {
		Self(Arc::new(HandleInner {
			id: document.id(),
			doc: RwLock::new(document),
			in_flight: AtomicBool::new(false),
			registry,
		}))
	}

	/// The document's identifier, readable without locking.
	pub fn id(&self) -> DocumentId {
		self.0.id
	}

	/// Runs `f` with shared access to the document.
	pub fn with<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
		let guard = self.0.doc.read();
		f(&guard)
	}

	/// Runs `f` with exclusive access to the document.
	pub fn with_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
		let mut guard = self.0.doc.write();
		f(&mut guard)
	}

	/// Returns true if both handles refer to the same document.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Returns true while a load or save is running.
	pub fn is_busy(&self) -> bool {
		self.0.in_flight.load(Ordering::Acquire)
	}

	/// Starts reading the document's file into its buffer.
	///
	/// # Errors
	///
	/// [`DocumentError::Busy`] if another load or save is running,
	/// [`DocumentError::Closed`] after close. Everything else is reported
	/// through the task's completion.
	pub fn load(&self) -> Result<IoTask> {
		io::start_load(self)
	}

	/// Starts writing the buffer to the document's file.
	pub fn save(&self) -> Result<IoTask> {
		io::start_save(self, None)
	}

	/// Starts writing the buffer to `path`, which becomes the document's path
	/// on success.
	pub fn save_as(&self, path: impl Into<PathBuf>) -> Result<IoTask> {
		io::start_save(self, Some(path.into()))
	}

	/// Closes the document and removes it from its registry.
	///
	/// Unsaved edits are discarded without prompting.
	pub fn close(&self) {
		self.with_mut(Document::close);
		if let Some(registry) = self.0.registry.upgrade() {
			registry.release(self.id());
		}
	}

	/// Removes marks of `mark_type` from every document in this document's
	/// registry. Returns the number of documents that had such marks.
	pub fn remove_all_marks_everywhere(&self, mark_type: &str) -> usize {
		match self.0.registry.upgrade() {
			Some(registry) => registry.remove_all_marks_everywhere(mark_type),
			None => usize::from(self.with_mut(|doc| doc.remove_all_marks(mark_type))),
		}
	}

	pub(crate) fn begin_io(&self) -> Result<InFlight> {
		self.0
			.in_flight
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.map_err(|_| DocumentError::Busy)?;
		Ok(InFlight(Arc::clone(&self.0)))
	}
}

impl fmt::Debug for DocumentHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DocumentHandle")
			.field("id", &self.0.id)
			.field("busy", &self.is_busy())
			.finish_non_exhaustive()
	}
}

/// Clears the in-flight flag when dropped.
pub(crate) struct InFlight(Arc<HandleInner>);

impl Drop for InFlight {
	fn drop(&mut self) {
		self.0.in_flight.store(false, Ordering::Release);
	}
}
