//! Collaborators shared by every document of a registry.

use std::fmt;
use std::sync::Arc;

use crate::filter::{ContentFilter, FilterSet};
use crate::io::{AuthorizationPrompt, DeclinePrompt, LocalStorage, Storage};
use crate::metadata::{FileTypeDef, FileTypeTable};
use crate::settings::{PropertiesCascade, SettingsProvider};

/// External services a document consults.
///
/// Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct Services {
	/// Filesystem access for load and save.
	pub storage: Arc<dyn Storage>,
	/// Escalation prompt for foreign-owned files.
	pub prompt: Arc<dyn AuthorizationPrompt>,
	/// Settings cascade.
	pub settings: Arc<dyn SettingsProvider>,
	/// File type definitions.
	pub file_types: Arc<FileTypeTable>,
	/// Import/export filters.
	pub filters: Arc<FilterSet>,
}

impl Services {
	/// Replaces the storage backend.
	pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
		self.storage = Arc::new(storage);
		self
	}

	/// Replaces the authorization prompt.
	pub fn with_prompt(mut self, prompt: impl AuthorizationPrompt + 'static) -> Self {
		self.prompt = Arc::new(prompt);
		self
	}

	/// Replaces the settings provider.
	pub fn with_settings(mut self, settings: impl SettingsProvider + 'static) -> Self {
		self.settings = Arc::new(settings);
		self
	}

	/// Adds a file type definition on top of the current table.
	pub fn with_file_type(mut self, def: FileTypeDef) -> Self {
		Arc::make_mut(&mut self.file_types).register(def);
		self
	}

	/// Registers a content filter.
	pub fn with_filter(mut self, filter: impl ContentFilter + 'static) -> Self {
		Arc::make_mut(&mut self.filters).register(Arc::new(filter));
		self
	}
}

impl Default for Services {
	fn default() -> Self {
		Self {
			storage: Arc::new(LocalStorage),
			prompt: Arc::new(DeclinePrompt),
			settings: Arc::new(PropertiesCascade::new()),
			file_types: Arc::new(FileTypeTable::builtin()),
			filters: Arc::new(FilterSet::new()),
		}
	}
}

impl fmt::Debug for Services {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Services")
			.field("file_types", &self.file_types.iter().count())
			.field("filters", &self.filters)
			.finish_non_exhaustive()
	}
}
