//! Per-document settings cascade.
//!
//! Settings come from a [`SettingsProvider`]. The default provider,
//! [`PropertiesCascade`], reads `.folio.toml` files from the document's
//! directory up to the filesystem root; nearer files override farther ones.
//!
//! ```toml
//! tab_size = 4
//! soft_tabs = true
//!
//! [variables]
//! PROJECT = "folio"
//!
//! [file_type."source.python"]
//! tab_size = 4
//!
//! [files."*.md"]
//! spell_checking = true
//! spelling_language = "en_GB"
//! ```

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use globset::{Glob, GlobMatcher};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::error::SettingsError;
use crate::metadata::{Encoding, Newlines};

/// Name of the settings file looked up in each directory.
pub const SETTINGS_FILE_NAME: &str = ".folio.toml";

/// Effective settings for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSettings {
	/// Width of a tab stop in columns.
	pub tab_size: usize,
	/// Insert spaces instead of tabs.
	pub soft_tabs: bool,
	/// Spell checking enabled.
	pub spell_checking: bool,
	/// Spelling language, if any.
	pub spelling_language: Option<String>,
	/// Encoding for new files.
	pub encoding: Option<Encoding>,
	/// Newline convention for new files.
	pub newlines: Option<Newlines>,
	/// Extra variables exported to commands.
	pub variables: BTreeMap<String, String>,
}

impl Default for DocumentSettings {
	fn default() -> Self {
		Self {
			tab_size: 4,
			soft_tabs: false,
			spell_checking: false,
			spelling_language: None,
			encoding: None,
			newlines: None,
			variables: BTreeMap::new(),
		}
	}
}

/// Source of settings for documents.
pub trait SettingsProvider: Send + Sync {
	/// Returns the settings for a document.
	///
	/// # Parameters
	///
	/// - `path`: file path (or virtual path), if any.
	/// - `directory`: lookup directory for documents without a path.
	/// - `file_type`: resolved file type scope.
	fn settings(&self, path: Option<&Path>, directory: Option<&Path>, file_type: &str) -> DocumentSettings;
}

impl SettingsProvider for DocumentSettings {
	fn settings(&self, _path: Option<&Path>, _directory: Option<&Path>, _file_type: &str) -> DocumentSettings {
		self.clone()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SettingsLayer {
	tab_size: Option<usize>,
	soft_tabs: Option<bool>,
	spell_checking: Option<bool>,
	spelling_language: Option<String>,
	encoding: Option<String>,
	newlines: Option<String>,
	#[serde(default)]
	variables: BTreeMap<String, String>,
}

impl SettingsLayer {
	fn apply(&self, source: &Path, settings: &mut DocumentSettings) {
		if let Some(tab_size) = self.tab_size.filter(|&n| n > 0) {
			settings.tab_size = tab_size;
		}
		if let Some(soft_tabs) = self.soft_tabs {
			settings.soft_tabs = soft_tabs;
		}
		if let Some(spell_checking) = self.spell_checking {
			settings.spell_checking = spell_checking;
		}
		if let Some(language) = &self.spelling_language {
			settings.spelling_language = Some(language.clone());
		}
		if let Some(name) = &self.encoding {
			match name.parse() {
				Ok(encoding) => settings.encoding = Some(encoding),
				Err(error) => tracing::warn!(path = %source.display(), %error, "settings.ignored_encoding"),
			}
		}
		if let Some(name) = &self.newlines {
			match name.parse() {
				Ok(newlines) => settings.newlines = Some(newlines),
				Err(error) => tracing::warn!(path = %source.display(), %error, "settings.ignored_newlines"),
			}
		}
		settings
			.variables
			.extend(self.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
	}
}

#[derive(Debug, Deserialize)]
struct RawSettingsFile {
	#[serde(flatten)]
	base: SettingsLayer,
	#[serde(default)]
	file_type: BTreeMap<String, SettingsLayer>,
	#[serde(default)]
	files: BTreeMap<String, SettingsLayer>,
}

/// A parsed settings file with compiled glob sections.
#[derive(Debug)]
struct SettingsFile {
	path: PathBuf,
	base: SettingsLayer,
	file_type: BTreeMap<String, SettingsLayer>,
	files: Vec<(GlobMatcher, SettingsLayer)>,
}

impl SettingsFile {
	fn parse(path: &Path, text: &str) -> Result<Self, SettingsError> {
		let raw: RawSettingsFile = toml::from_str(text).map_err(|error| SettingsError::Parse {
			path: path.to_path_buf(),
			error,
		})?;
		let files = raw
			.files
			.into_iter()
			.map(|(pattern, layer)| {
				Glob::new(&pattern)
					.map(|glob| (glob.compile_matcher(), layer))
					.map_err(|error| SettingsError::Glob {
						path: path.to_path_buf(),
						pattern,
						error,
					})
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self {
			path: path.to_path_buf(),
			base: raw.base,
			file_type: raw.file_type,
			files,
		})
	}

	fn read(path: &Path) -> Result<Self, SettingsError> {
		let text = std::fs::read_to_string(path).map_err(|error| SettingsError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(path, &text)
	}

	/// Applies the base layer, then the file type section, then matching globs.
	fn apply(&self, doc_path: Option<&Path>, file_type: &str, settings: &mut DocumentSettings) {
		self.base.apply(&self.path, settings);
		if let Some(layer) = self.file_type.get(file_type) {
			layer.apply(&self.path, settings);
		}
		let Some(doc_path) = doc_path else {
			return;
		};
		let dir = self.path.parent().unwrap_or(Path::new(""));
		let relative = doc_path.strip_prefix(dir).unwrap_or(doc_path);
		let file_name = doc_path.file_name().map(Path::new);
		for (matcher, layer) in &self.files {
			if matcher.is_match(relative) || file_name.is_some_and(|name| matcher.is_match(name)) {
				layer.apply(&self.path, settings);
			}
		}
	}
}

#[derive(Debug, Clone)]
struct CacheEntry {
	modified: Option<SystemTime>,
	file: Option<Arc<SettingsFile>>,
}

/// Settings provider reading `.folio.toml` files up the directory tree.
///
/// Parsed files are cached by path and modification time. Unreadable or
/// malformed files are logged and skipped.
#[derive(Debug, Default)]
pub struct PropertiesCascade {
	defaults: DocumentSettings,
	cache: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl PropertiesCascade {
	/// Creates a cascade starting from built-in defaults.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a cascade starting from `defaults`.
	pub fn with_defaults(defaults: DocumentSettings) -> Self {
		Self {
			defaults,
			cache: Mutex::default(),
		}
	}

	/// Returns the settings files that apply to `dir`, farthest first.
	pub fn files_for(&self, dir: &Path) -> Vec<PathBuf> {
		let mut found: Vec<PathBuf> = dir
			.ancestors()
			.map(|d| d.join(SETTINGS_FILE_NAME))
			.filter(|p| p.is_file())
			.collect();
		found.reverse();
		found
	}

	fn load(&self, path: &Path) -> Option<Arc<SettingsFile>> {
		let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
		if let Some(entry) = self.cache.lock().get(path)
			&& entry.modified.is_some()
			&& entry.modified == modified
		{
			return entry.file.clone();
		}

		let file = match SettingsFile::read(path) {
			Ok(file) => {
				tracing::debug!(path = %path.display(), "settings.loaded");
				Some(Arc::new(file))
			}
			Err(error) => {
				tracing::warn!(%error, "settings.skipped");
				None
			}
		};
		self.cache.lock().insert(
			path.to_path_buf(),
			CacheEntry {
				modified,
				file: file.clone(),
			},
		);
		file
	}
}

impl SettingsProvider for PropertiesCascade {
	fn settings(&self, path: Option<&Path>, directory: Option<&Path>, file_type: &str) -> DocumentSettings {
		let mut settings = self.defaults.clone();
		let Some(dir) = path.and_then(Path::parent).or(directory) else {
			return settings;
		};
		for file in self.files_for(dir) {
			if let Some(parsed) = self.load(&file) {
				parsed.apply(path, file_type, &mut settings);
			}
		}
		settings
	}
}
