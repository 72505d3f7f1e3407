//! Import/export transforms applied around load and save.
//!
//! A [`ContentFilter`] turns raw file bytes into the bytes that are decoded
//! into the buffer, and back. The filter chosen on load (by extension or by
//! sniffing the content) is remembered on the document and reused on save.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::FilterError;

/// Stable identifier of a content filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(pub Uuid);

impl FilterId {
	/// Generates a fresh identifier.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for FilterId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for FilterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A reversible byte transform between disk and buffer.
pub trait ContentFilter: Send + Sync {
	/// Identifier reported in completions.
	fn id(&self) -> FilterId;

	/// Human readable name.
	fn name(&self) -> &str;

	/// Returns true if this filter handles the file.
	///
	/// `prefix` holds the first bytes of the raw file content.
	fn matches(&self, path: &Path, prefix: &[u8]) -> bool;

	/// Transforms raw file bytes into importable bytes.
	fn decode(&self, raw: &[u8]) -> Result<Vec<u8>, FilterError>;

	/// Transforms exported bytes back into file bytes.
	fn encode(&self, data: &[u8]) -> Result<Vec<u8>, FilterError>;
}

/// Registered filters, consulted in registration order.
#[derive(Clone, Default)]
pub struct FilterSet {
	filters: Vec<Arc<dyn ContentFilter>>,
}

impl FilterSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a filter.
	pub fn register(&mut self, filter: Arc<dyn ContentFilter>) {
		tracing::debug!(filter = filter.name(), id = %filter.id(), "filter.register");
		self.filters.push(filter);
	}

	/// Returns the first filter handling the file.
	pub fn select(&self, path: &Path, prefix: &[u8]) -> Option<Arc<dyn ContentFilter>> {
		self.filters.iter().find(|f| f.matches(path, prefix)).cloned()
	}

	/// Looks up a filter by id.
	pub fn get(&self, id: FilterId) -> Option<Arc<dyn ContentFilter>> {
		self.filters.iter().find(|f| f.id() == id).cloned()
	}

	/// Number of registered filters.
	pub fn len(&self) -> usize {
		self.filters.len()
	}

	/// Returns true if no filters are registered.
	pub fn is_empty(&self) -> bool {
		self.filters.is_empty()
	}
}

impl fmt::Debug for FilterSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.filters.iter().map(|x| x.name())).finish()
	}
}
