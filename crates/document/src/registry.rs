//! Open documents, looked up by identifier or path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::document::{Document, DocumentId};
use crate::handle::DocumentHandle;
use crate::metadata::{Encoding, Newlines};
use crate::services::Services;

pub(crate) struct RegistryInner {
	/// Held only for lookup, insert and remove; never across a document lock.
	documents: Mutex<HashMap<DocumentId, DocumentHandle>>,
	services: Services,
}

impl RegistryInner {
	pub(crate) fn release(&self, id: DocumentId) -> Option<DocumentHandle> {
		let released = self.documents.lock().remove(&id);
		if released.is_some() {
			tracing::debug!(%id, "registry.release");
		}
		released
	}

	fn snapshot(&self) -> Vec<DocumentHandle> {
		self.documents.lock().values().cloned().collect()
	}

	pub(crate) fn remove_all_marks_everywhere(&self, mark_type: &str) -> usize {
		let count = self
			.snapshot()
			.iter()
			.filter(|handle| handle.with_mut(|doc| doc.remove_all_marks(mark_type)))
			.count();
		tracing::debug!(mark_type, documents = count, "registry.remove_all_marks");
		count
	}
}

/// The set of open documents.
///
/// Documents are created through the factories here and stay registered
/// until [`DocumentHandle::close`].
#[derive(Clone)]
pub struct DocumentRegistry {
	inner: Arc<RegistryInner>,
}

impl DocumentRegistry {
	/// Creates an empty registry whose documents use `services`.
	pub fn new(services: Services) -> Self {
		Self {
			inner: Arc::new(RegistryInner {
				documents: Mutex::new(HashMap::new()),
				services,
			}),
		}
	}

	/// The process-wide registry, created on first use with default services.
	pub fn global() -> &'static DocumentRegistry {
		static GLOBAL: OnceLock<DocumentRegistry> = OnceLock::new();
		GLOBAL.get_or_init(|| DocumentRegistry::new(Services::default()))
	}

	/// Services handed to new documents.
	pub fn services(&self) -> &Services {
		&self.inner.services
	}

	/// Returns the document for `path`, creating it if none is open.
	///
	/// A new document is empty until [`DocumentHandle::load`] completes.
	pub fn open_path(&self, path: impl AsRef<Path>) -> DocumentHandle {
		let path = absolute(path.as_ref());
		if let Some(existing) = self.find_by_path(&path) {
			return existing;
		}
		let handle = self.insert(Document::for_path(path.clone(), self.inner.services.clone()));
		tracing::debug!(id = %handle.id(), path = %path.display(), "registry.open_path");
		handle
	}

	/// Creates an open document from in-memory bytes.
	///
	/// The bytes are decoded with the detected encoding; the document is not
	/// on disk and starts unedited.
	pub fn from_data(&self, bytes: &[u8], file_type: &str, name: &str) -> DocumentHandle {
		let encoding = Encoding::detect(bytes);
		let (text, encoding) = match encoding.decode(bytes) {
			Ok(text) => (text, encoding),
			Err(error) => {
				tracing::debug!(%error, "registry.from_data_fallback");
				(Encoding::Latin1.decode(bytes).unwrap_or_default(), Encoding::Latin1)
			}
		};
		let newlines = Newlines::detect(&text);
		let doc = Document::from_text(text, encoding, newlines, file_type, name, self.inner.services.clone());
		let handle = self.insert(doc);
		tracing::debug!(id = %handle.id(), name, file_type, "registry.from_data");
		handle
	}

	/// Looks up a document by identifier.
	pub fn find(&self, id: DocumentId) -> Option<DocumentHandle> {
		self.inner.documents.lock().get(&id).cloned()
	}

	/// Looks up a document by file path.
	pub fn find_by_path(&self, path: impl AsRef<Path>) -> Option<DocumentHandle> {
		let path = absolute(path.as_ref());
		self.inner
			.snapshot()
			.into_iter()
			.find(|handle| handle.with(|doc| doc.path() == Some(path.as_path())))
	}

	/// All registered documents, in no particular order.
	pub fn documents(&self) -> Vec<DocumentHandle> {
		self.inner.snapshot()
	}

	/// Number of registered documents.
	pub fn len(&self) -> usize {
		self.inner.documents.lock().len()
	}

	/// Returns true if no documents are registered.
	pub fn is_empty(&self) -> bool {
		self.inner.documents.lock().is_empty()
	}

	/// Removes marks of `mark_type` from every registered document.
	///
	/// Returns the number of documents that had such marks.
	pub fn remove_all_marks_everywhere(&self, mark_type: &str) -> usize {
		self.inner.remove_all_marks_everywhere(mark_type)
	}

	fn insert(&self, doc: Document) -> DocumentHandle {
		let handle = DocumentHandle::new(doc, Arc::downgrade(&self.inner));
		self.inner.documents.lock().insert(handle.id(), handle.clone());
		handle
	}
}

impl Default for DocumentRegistry {
	fn default() -> Self {
		Self::new(Services::default())
	}
}

impl std::fmt::Debug for DocumentRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DocumentRegistry")
			.field("documents", &self.len())
			.field("services", &self.inner.services)
			.finish()
	}
}

fn absolute(path: &Path) -> PathBuf {
	std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
