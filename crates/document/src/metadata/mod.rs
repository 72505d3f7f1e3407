//! Metadata derived from a document's path and leading content.
//!
//! [`resolve`] is a pure function of the effective path and a content prefix.
//! Documents keep its result in a [`MetadataCache`], an explicit
//! `(inputs_hash, value)` cell that is only revalidated after the document
//! invalidates it (path change or an edit touching the first line).

pub mod encoding;
mod file_type;

#[cfg(test)]
mod tests;

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

pub use encoding::{Encoding, Newlines, SNIFF_LEN};
pub use file_type::{FileTypeDef, FileTypeTable, PLAIN_TEXT, modeline_name, shebang_interpreter};
use parking_lot::Mutex;

/// File type, encoding, and newline convention for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
	/// File type scope (e.g. `source.rust`).
	pub file_type: String,
	/// Detected encoding.
	pub encoding: Encoding,
	/// Detected newline convention.
	pub newlines: Newlines,
}

/// Resolves metadata from the effective path and the first bytes of content.
pub fn resolve(table: &FileTypeTable, path: Option<&Path>, prefix: &[u8]) -> ResolvedMetadata {
	let prefix = &prefix[..prefix.len().min(SNIFF_LEN)];
	let encoding = Encoding::detect(prefix);
	let text = decode_prefix(encoding, prefix);
	let first_line = text.split(['\n', '\r']).next().unwrap_or_default();
	ResolvedMetadata {
		file_type: table.resolve(path, first_line).to_string(),
		encoding,
		newlines: Newlines::detect(&text),
	}
}

/// Decodes a possibly truncated prefix, dropping an incomplete trailing unit.
fn decode_prefix(encoding: Encoding, prefix: &[u8]) -> String {
	if let Ok(text) = encoding.decode(prefix) {
		return text;
	}
	match encoding {
		Encoding::Utf16Le | Encoding::Utf16Be => {
			let even = prefix.len() & !1;
			encoding
				.decode(&prefix[..even])
				.unwrap_or_else(|_| String::from_utf8_lossy(prefix).into_owned())
		}
		_ => String::from_utf8_lossy(prefix).into_owned(),
	}
}

/// Service proposing grammars for a document, most relevant first.
pub trait GrammarProposer: Send + Sync {
	/// Returns candidate grammar names.
	fn propose(&self, path: Option<&Path>, first_line: &str, file_type: &str) -> Vec<String>;
}

#[derive(Debug, Default)]
struct CacheCell {
	value: Option<(u64, ResolvedMetadata)>,
	valid: bool,
	resolutions: u64,
}

/// Cache cell for resolved metadata.
#[derive(Debug, Default)]
pub struct MetadataCache {
	cell: Mutex<CacheCell>,
}

impl MetadataCache {
	/// Creates an empty, invalid cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the cached value for revalidation on next access.
	pub fn invalidate(&self) {
		self.cell.lock().valid = false;
	}

	/// Returns true if the cached value can be served without revalidation.
	pub fn is_valid(&self) -> bool {
		let cell = self.cell.lock();
		cell.valid && cell.value.is_some()
	}

	/// Number of times the resolver has run.
	pub fn resolutions(&self) -> u64 {
		self.cell.lock().resolutions
	}

	/// Returns the cached value, revalidating it if invalidated.
	///
	/// After invalidation `inputs` is hashed; the resolver only runs when the
	/// hash differs from the cached one.
	pub fn get_or_resolve<I, F>(&self, inputs: I, resolver: F) -> ResolvedMetadata
	where
		I: FnOnce() -> u64,
		F: FnOnce() -> ResolvedMetadata,
	{
		let mut guard = self.cell.lock();
		let cell = &mut *guard;
		if cell.valid
			&& let Some((_, value)) = &cell.value
		{
			return value.clone();
		}

		let hash = inputs();
		if let Some((cached, value)) = &cell.value
			&& *cached == hash
		{
			let value = value.clone();
			cell.valid = true;
			return value;
		}

		let value = resolver();
		cell.resolutions += 1;
		cell.value = Some((hash, value.clone()));
		cell.valid = true;
		value
	}
}

/// Hashes the inputs that determine resolved metadata.
pub fn inputs_hash(path: Option<&Path>, first_line: &str) -> u64 {
	let mut hasher = DefaultHasher::new();
	path.hash(&mut hasher);
	first_line.hash(&mut hasher);
	hasher.finish()
}
