//! The document aggregate.
//!
//! A [`Document`] binds an identity (id, path, display name) to exactly one
//! [`TextBuffer`], one [`UndoEngine`] and one [`MarkTable`] for its whole
//! lifetime. Every content change goes through the same path: the buffer is
//! edited, the undo history records it, marks are rebased, metadata is
//! invalidated when the first line was touched, and attached editors and
//! subscribers are notified in that order.
//!
//! Documents are shared through [`crate::DocumentHandle`]; loading and saving
//! live there because they run asynchronously.


use std::collections::BTreeMap;
use std::fmt;
use std::ops::{ControlFlow, Range};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_primitives::{Edit, EditId, Selection, normalize_to_lf};
use uuid::Uuid;

use crate::buffer::TextBuffer;
use crate::editor::{DocumentEditor, OutputRequest};
use crate::error::{DocumentError, Result};
use crate::event::{ChangeCause, DocumentEvent, DocumentObserver, SubscriptionId};
use crate::filter::FilterId;
use crate::io::Authorization;
use crate::marks::MarkTable;
use crate::metadata::{
	Encoding, GrammarProposer, MetadataCache, Newlines, ResolvedMetadata, SNIFF_LEN, inputs_hash, resolve,
};
use crate::services::Services;
use crate::settings::DocumentSettings;
use crate::undo::{Reverted, UndoEngine};

/// Name shown for documents with neither a custom name nor a path.
pub const UNTITLED: &str = "untitled";

/// Process-unique document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
	/// Generates a fresh identifier.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for DocumentId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for DocumentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Per-document values that take precedence over resolution and settings.
#[derive(Debug, Clone, Default)]
struct Overrides {
	file_type: Option<String>,
	encoding: Option<Encoding>,
	newlines: Option<Newlines>,
	tab_size: Option<usize>,
	soft_tabs: Option<bool>,
	spell_checking: Option<bool>,
	spelling_language: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
	on_disk: bool,
	open: bool,
	closed: bool,
	in_viewing_mode: bool,
	recent_tracking_disabled: bool,
	keep_backup_file: bool,
}

/// Content captured under the lock before a save serializes it.
#[derive(Debug, Clone)]
pub(crate) struct SaveSnapshot {
	pub text: String,
	pub version: u64,
	pub encoding: Encoding,
	pub newlines: Newlines,
	pub filter: Option<FilterId>,
	pub keep_backup: bool,
}

/// An open text document.
pub struct Document {
	id: DocumentId,
	path: Option<PathBuf>,
	virtual_path: Option<PathBuf>,
	custom_name: Option<String>,
	directory: Option<PathBuf>,

	buffer: TextBuffer,
	undo: UndoEngine,
	marks: MarkTable,
	selection: Selection,

	metadata: MetadataCache,
	overrides: Overrides,
	/// Encoding and newlines found by the last load or written by the last save.
	disk_format: Option<(Encoding, Newlines)>,
	authorization: Option<Authorization>,
	filter: Option<FilterId>,
	flags: Flags,

	editors: Vec<Arc<dyn DocumentEditor>>,
	observers: Vec<(SubscriptionId, Arc<dyn DocumentObserver>)>,
	next_subscription: u64,
	services: Services,
}

impl Document {
	/// Creates an empty, untitled document.
	pub fn new(services: Services) -> Self {
		Self {
			id: DocumentId::new(),
			path: None,
			virtual_path: None,
			custom_name: None,
			directory: None,
			buffer: TextBuffer::default(),
			undo: UndoEngine::new(),
			marks: MarkTable::new(),
			selection: Selection::default(),
			metadata: MetadataCache::new(),
			overrides: Overrides::default(),
			disk_format: None,
			authorization: None,
			filter: None,
			flags: Flags::default(),
			editors: Vec::new(),
			observers: Vec::new(),
			next_subscription: 0,
			services,
		}
	}

	/// Creates a document for `path`; its content is read by the first load.
	pub fn for_path(path: PathBuf, services: Services) -> Self {
		let mut doc = Self::new(services);
		doc.path = Some(path);
		doc
	}

	/// Creates an open document holding `text`, never written to disk.
	pub fn from_text(
		text: String,
		encoding: Encoding,
		newlines: Newlines,
		file_type: &str,
		name: &str,
		services: Services,
	) -> Self {
		let mut doc = Self::new(services);
		doc.buffer = TextBuffer::new(&normalize_to_lf(text));
		doc.disk_format = Some((encoding, newlines));
		doc.overrides.file_type = Some(file_type.to_string());
		doc.custom_name = Some(name.to_string());
		doc.flags.open = true;
		doc
	}

	/// The document's identifier.
	pub fn id(&self) -> DocumentId {
		self.id
	}

	/// Services this document consults.
	pub fn services(&self) -> &Services {
		&self.services
	}

	// Identity

	/// File path, if any.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Sets the file path.
	pub fn set_path(&mut self, path: Option<PathBuf>) {
		if self.path != path {
			self.path = path;
			self.metadata.invalidate();
		}
	}

	/// Path used for metadata resolution instead of [`Document::path`].
	pub fn virtual_path(&self) -> Option<&Path> {
		self.virtual_path.as_deref()
	}

	/// Sets the virtual path.
	pub fn set_virtual_path(&mut self, path: Option<PathBuf>) {
		if self.virtual_path != path {
			self.virtual_path = path;
			self.metadata.invalidate();
		}
	}

	/// The virtual path if set, else the file path.
	pub fn effective_path(&self) -> Option<&Path> {
		self.virtual_path.as_deref().or(self.path.as_deref())
	}

	/// Name overriding the path-derived display name.
	pub fn custom_name(&self) -> Option<&str> {
		self.custom_name.as_deref()
	}

	/// Sets the custom name.
	pub fn set_custom_name(&mut self, name: Option<String>) {
		self.custom_name = name;
	}

	/// Directory used for settings lookup of documents without a path.
	pub fn directory(&self) -> Option<&Path> {
		self.directory.as_deref()
	}

	/// Sets the settings lookup directory.
	pub fn set_directory(&mut self, directory: Option<PathBuf>) {
		self.directory = directory;
	}

	/// Custom name, else the last path component, else `untitled`.
	pub fn display_name(&self) -> String {
		self.display_name_with_extension(true)
	}

	/// Like [`Document::display_name`], optionally without the extension.
	pub fn display_name_with_extension(&self, with_extension: bool) -> String {
		let name = match (&self.custom_name, &self.path) {
			(Some(name), _) => name.clone(),
			(None, Some(path)) => match path.file_name() {
				Some(name) => name.to_string_lossy().into_owned(),
				None => return UNTITLED.to_string(),
			},
			(None, None) => return UNTITLED.to_string(),
		};
		if with_extension {
			return name;
		}
		Path::new(&name)
			.file_stem()
			.map_or(name.clone(), |stem| stem.to_string_lossy().into_owned())
	}

	// Content

	/// The text buffer.
	pub fn buffer(&self) -> &TextBuffer {
		&self.buffer
	}

	/// Returns the full text.
	pub fn content(&self) -> String {
		self.buffer.to_string()
	}

	/// Copies out the text in `range`.
	pub fn read(&self, range: Range<usize>) -> Result<String> {
		Ok(self.buffer.read(range)?)
	}

	/// Buffer version; changes with every edit.
	pub fn version(&self) -> u64 {
		self.buffer.version()
	}

	/// Replaces `range` with `text`.
	///
	/// Line endings in `text` are normalized to `\n`. With no grouping open
	/// the edit forms its own undo step.
	///
	/// # Errors
	///
	/// [`DocumentError::Range`] for invalid ranges, [`DocumentError::ViewingMode`]
	/// or [`DocumentError::Closed`] when mutation is disabled.
	pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<EditId> {
		self.ensure_mutable()?;
		let edit = Edit::new(range, normalize_to_lf(text.to_string()));
		let applied = self.buffer.apply(&edit)?;
		let inverse = edit.inverse(applied.removed);

		let before = self.selection.clone();
		self.selection = before.map(&edit).clamp(self.buffer.len_bytes());
		self.undo.record_edit(edit.clone(), inverse, &before, &self.selection);
		self.content_changed(vec![edit], applied.first_line_touched, ChangeCause::Edit);
		Ok(applied.id)
	}

	/// Replaces the whole content as one undoable step.
	pub fn set_content(&mut self, text: &str) -> Result<()> {
		self.ensure_mutable()?;
		self.begin_grouping();
		let result = self.replace(0..self.buffer.len_bytes(), text);
		self.end_grouping();
		result.map(|_| ())
	}

	/// Current selection.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Replaces the selection, clamped to the buffer.
	pub fn set_selection(&mut self, selection: Selection) {
		self.selection = selection.clamp(self.buffer.len_bytes());
	}

	// History

	/// Opens an undo grouping; groupings nest.
	pub fn begin_grouping(&mut self) {
		self.undo.begin_grouping(&self.selection);
	}

	/// Closes an undo grouping. Returns true if the outermost group closed.
	pub fn end_grouping(&mut self) -> bool {
		self.undo.end_grouping()
	}

	/// Returns whether undo is available.
	pub fn can_undo(&self) -> bool {
		self.undo.can_undo()
	}

	/// Returns whether redo is available.
	pub fn can_redo(&self) -> bool {
		self.undo.can_redo()
	}

	/// Reverts the newest undo step. Returns false when there was none.
	pub fn undo(&mut self) -> Result<bool> {
		self.ensure_mutable()?;
		match self.undo.undo(&mut self.buffer)? {
			Some(reverted) => {
				self.restore(reverted, ChangeCause::Undo);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Re-applies the newest undone step. Returns false when there was none.
	pub fn redo(&mut self) -> Result<bool> {
		self.ensure_mutable()?;
		match self.undo.redo(&mut self.buffer)? {
			Some(reverted) => {
				self.restore(reverted, ChangeCause::Redo);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Returns true if the content differs from the last saved or loaded state.
	pub fn is_document_edited(&self) -> bool {
		!self.undo.is_clean()
	}

	// Marks

	/// Sets a mark, replacing any mark of the same type at `offset`.
	pub fn set_mark(&mut self, mark_type: &str, offset: usize, content: impl Into<String>) -> Result<()> {
		self.buffer.validate_offset(offset)?;
		self.marks.set(mark_type, offset, content);
		self.marks_changed(Some(mark_type));
		Ok(())
	}

	/// Removes one mark. Returns true if it existed.
	pub fn remove_mark(&mut self, mark_type: &str, offset: usize) -> bool {
		let removed = self.marks.remove(mark_type, offset);
		if removed {
			self.marks_changed(Some(mark_type));
		}
		removed
	}

	/// Removes every mark of `mark_type`. Returns true if any existed.
	pub fn remove_all_marks(&mut self, mark_type: &str) -> bool {
		let removed = self.marks.remove_all(mark_type);
		if removed {
			self.marks_changed(Some(mark_type));
		}
		removed
	}

	/// The mark table.
	pub fn marks(&self) -> &MarkTable {
		&self.marks
	}

	/// Iterates over marks of `mark_type` in offset order.
	pub fn marks_of_type<'a>(&'a self, mark_type: &str) -> impl Iterator<Item = (usize, &'a str)> + use<'a> {
		self.marks.marks_of_type(mark_type)
	}

	/// Serializes marks of `mark_type` as `[{"pos":"L:C","content":"..."}]`.
	pub fn stringify_marks(&self, mark_type: &str) -> Result<String> {
		Ok(self.marks.stringify(mark_type, &self.buffer)?)
	}

	// Metadata

	/// Metadata resolved from the effective path and content, without overrides.
	pub fn resolved_metadata(&self) -> ResolvedMetadata {
		let path = self.effective_path();
		self.metadata.get_or_resolve(
			|| inputs_hash(path, &self.buffer.first_line()),
			|| {
				tracing::trace!(id = %self.id, "document.resolve_metadata");
				resolve(&self.services.file_types, path, self.content_prefix().as_bytes())
			},
		)
	}

	/// Number of times metadata was resolved for this document.
	pub fn metadata_resolutions(&self) -> u64 {
		self.metadata.resolutions()
	}

	/// The file type scope.
	pub fn file_type(&self) -> String {
		match &self.overrides.file_type {
			Some(file_type) => file_type.clone(),
			None => self.resolved_metadata().file_type,
		}
	}

	/// Sets or clears an explicit file type.
	pub fn set_file_type(&mut self, file_type: Option<String>) {
		self.overrides.file_type = file_type;
	}

	/// Encoding used when saving.
	///
	/// An explicit value wins, then the encoding found on disk, then the
	/// settings cascade, then detection.
	pub fn disk_encoding(&self) -> Encoding {
		self.overrides
			.encoding
			.or(self.disk_format.map(|(encoding, _)| encoding))
			.or_else(|| self.settings().encoding)
			.unwrap_or_else(|| self.resolved_metadata().encoding)
	}

	/// Sets or clears an explicit disk encoding until the next load.
	pub fn set_disk_encoding(&mut self, encoding: Option<Encoding>) {
		self.overrides.encoding = encoding;
	}

	/// Newline convention used when saving; same precedence as the encoding.
	pub fn disk_newlines(&self) -> Newlines {
		self.overrides
			.newlines
			.or(self.disk_format.map(|(_, newlines)| newlines))
			.or_else(|| self.settings().newlines)
			.unwrap_or_else(|| self.resolved_metadata().newlines)
	}

	/// Sets or clears an explicit newline convention until the next load.
	pub fn set_disk_newlines(&mut self, newlines: Option<Newlines>) {
		self.overrides.newlines = newlines;
	}

	/// Grammar candidates for this document, most relevant first.
	pub fn proposed_grammars(&self, proposer: &dyn GrammarProposer) -> Vec<String> {
		proposer.propose(self.effective_path(), &self.buffer.first_line(), &self.file_type())
	}

	// Settings

	/// Settings from the cascade, before per-document overrides.
	pub fn settings(&self) -> DocumentSettings {
		self.services
			.settings
			.settings(self.effective_path(), self.directory.as_deref(), &self.file_type())
	}

	/// Tab width in columns.
	pub fn tab_size(&self) -> usize {
		self.overrides.tab_size.unwrap_or_else(|| self.settings().tab_size)
	}

	/// Overrides the tab width.
	pub fn set_tab_size(&mut self, tab_size: Option<usize>) {
		self.overrides.tab_size = tab_size;
	}

	/// Whether tabs are inserted as spaces.
	pub fn soft_tabs(&self) -> bool {
		self.overrides.soft_tabs.unwrap_or_else(|| self.settings().soft_tabs)
	}

	/// Overrides soft tabs.
	pub fn set_soft_tabs(&mut self, soft_tabs: Option<bool>) {
		self.overrides.soft_tabs = soft_tabs;
	}

	/// Whether spell checking is enabled.
	pub fn spell_checking(&self) -> bool {
		self.overrides
			.spell_checking
			.unwrap_or_else(|| self.settings().spell_checking)
	}

	/// Overrides spell checking.
	pub fn set_spell_checking(&mut self, enabled: Option<bool>) {
		self.overrides.spell_checking = enabled;
	}

	/// Spelling language, if any.
	pub fn spelling_language(&self) -> Option<String> {
		self.overrides
			.spelling_language
			.clone()
			.or_else(|| self.settings().spelling_language)
	}

	/// Overrides the spelling language.
	pub fn set_spelling_language(&mut self, language: Option<String>) {
		self.overrides.spelling_language = language;
	}

	/// Variables exported to commands run on this document.
	///
	/// Variables from the settings cascade never replace the `FOLIO_` ones.
	pub fn variables(&self) -> BTreeMap<String, String> {
		let settings = self.settings();
		let mut vars = BTreeMap::new();
		let mut set = |key: &str, value: String| {
			vars.insert(key.to_string(), value);
		};

		set("FOLIO_DOCUMENT_UUID", self.id.to_string());
		set("FOLIO_DISPLAYNAME", self.display_name());
		if let Some(path) = &self.path {
			set("FOLIO_FILEPATH", path.display().to_string());
			if let Some(name) = path.file_name() {
				set("FOLIO_FILENAME", name.to_string_lossy().into_owned());
			}
		}
		if let Some(dir) = self.path.as_deref().and_then(Path::parent).or(self.directory.as_deref()) {
			set("FOLIO_DIRECTORY", dir.display().to_string());
		}
		set("FOLIO_FILE_TYPE", self.file_type());
		set(
			"FOLIO_TAB_SIZE",
			self.overrides.tab_size.unwrap_or(settings.tab_size).to_string(),
		);
		set(
			"FOLIO_SOFT_TABS",
			self.overrides.soft_tabs.unwrap_or(settings.soft_tabs).to_string(),
		);
		set("FOLIO_ENCODING", self.disk_encoding().name().to_string());
		set("FOLIO_NEWLINES", self.disk_newlines().name().to_string());
		set("FOLIO_DOCUMENT_EDITED", self.is_document_edited().to_string());

		for (key, value) in settings.variables {
			vars.entry(key).or_insert(value);
		}
		vars
	}

	// Flags

	/// True once the document has been read from or written to disk.
	pub fn is_on_disk(&self) -> bool {
		self.flags.on_disk
	}

	/// True after a successful load or creation from data, until close.
	pub fn is_open(&self) -> bool {
		self.flags.open
	}

	/// True once [`crate::DocumentHandle::close`] has run.
	pub fn is_closed(&self) -> bool {
		self.flags.closed
	}

	/// Whether mutation entry points are disabled.
	pub fn in_viewing_mode(&self) -> bool {
		self.flags.in_viewing_mode
	}

	/// Enables or disables viewing mode.
	pub fn set_viewing_mode(&mut self, enabled: bool) {
		self.flags.in_viewing_mode = enabled;
	}

	/// Whether the document is excluded from recent-document tracking.
	pub fn recent_tracking_disabled(&self) -> bool {
		self.flags.recent_tracking_disabled
	}

	/// Excludes the document from recent-document tracking.
	pub fn set_recent_tracking_disabled(&mut self, disabled: bool) {
		self.flags.recent_tracking_disabled = disabled;
	}

	/// Whether saves keep the previous file as `<name>~`.
	pub fn keep_backup_file(&self) -> bool {
		self.flags.keep_backup_file
	}

	/// Enables or disables backup files.
	pub fn set_keep_backup_file(&mut self, keep: bool) {
		self.flags.keep_backup_file = keep;
	}

	/// Cached elevation token.
	pub fn authorization(&self) -> Option<&Authorization> {
		self.authorization.as_ref()
	}

	/// Drops the cached elevation token.
	pub fn clear_authorization(&mut self) {
		self.authorization = None;
	}

	pub(crate) fn set_authorization(&mut self, authorization: Authorization) {
		tracing::debug!(id = %self.id, principal = authorization.principal(), "document.authorized");
		self.authorization = Some(authorization);
	}

	/// Content filter chosen by the last load.
	pub fn filter(&self) -> Option<FilterId> {
		self.filter
	}

	// Editors and observers

	/// Attaches an editor. Attaching the same editor twice has no effect.
	pub fn register_editor(&mut self, editor: Arc<dyn DocumentEditor>) {
		if self.editors.iter().any(|e| Arc::ptr_eq(e, &editor)) {
			return;
		}
		self.editors.push(editor);
		tracing::debug!(id = %self.id, editors = self.editors.len(), "document.editor_registered");
	}

	/// Detaches an editor. Returns true if it was attached.
	pub fn unregister_editor(&mut self, editor: &Arc<dyn DocumentEditor>) -> bool {
		let before = self.editors.len();
		self.editors.retain(|e| !Arc::ptr_eq(e, editor));
		before != self.editors.len()
	}

	/// Attached editors in registration order.
	pub fn editors(&self) -> &[Arc<dyn DocumentEditor>] {
		&self.editors
	}

	/// Routes command output to the first attached editor.
	///
	/// # Errors
	///
	/// [`DocumentError::NoRecipient`] when no editor is attached.
	pub fn handle_output(&self, request: &OutputRequest) -> Result<bool> {
		let editor = self.editors.first().ok_or(DocumentError::NoRecipient)?;
		Ok(editor.handle_output(request))
	}

	/// Adds a subscriber notified after all editors.
	pub fn subscribe(&mut self, observer: Arc<dyn DocumentObserver>) -> SubscriptionId {
		self.next_subscription += 1;
		let id = SubscriptionId(self.next_subscription);
		self.observers.push((id, observer));
		id
	}

	/// Removes a subscriber. Returns true if it was present.
	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.observers.len();
		self.observers.retain(|(sub, _)| *sub != id);
		before != self.observers.len()
	}

	// Lifecycle, driven by the handle and the I/O pipeline

	/// Replaces the content with freshly loaded text.
	///
	/// Not undoable: history is cleared and the clean checkpoint reset.
	pub(crate) fn apply_loaded(
		&mut self,
		text: String,
		encoding: Encoding,
		newlines: Newlines,
		filter: Option<FilterId>,
	) {
		let edit = Edit::new(0..self.buffer.len_bytes(), text);
		if let Err(error) = self.buffer.apply(&edit) {
			tracing::warn!(id = %self.id, %error, "document.load_apply_failed");
			return;
		}
		self.undo.clear();
		let had_marks = self.marks.clear();
		self.selection = Selection::point(0);
		// Detection replaces any format chosen for the previous content.
		self.overrides.encoding = None;
		self.overrides.newlines = None;
		self.disk_format = Some((encoding, newlines));
		self.filter = filter;
		self.flags.on_disk = true;
		self.flags.open = true;
		self.metadata.invalidate();

		tracing::debug!(
			id = %self.id,
			len = self.buffer.len_bytes(),
			encoding = encoding.name(),
			newlines = newlines.name(),
			"document.loaded"
		);
		self.notify(&DocumentEvent::ContentChanged {
			version: self.buffer.version(),
			edits: vec![edit],
			cause: ChangeCause::Load,
		});
		if had_marks {
			self.notify(&DocumentEvent::MarksChanged { mark_type: None });
		}
	}

	/// Runs `will_save` hooks and captures what is about to be written.
	pub(crate) fn prepare_save(&mut self) -> SaveSnapshot {
		let hooks: Vec<Arc<dyn DocumentObserver>> = self
			.editors
			.iter()
			.map(|e| Arc::clone(e) as Arc<dyn DocumentObserver>)
			.chain(self.observers.iter().map(|(_, o)| Arc::clone(o)))
			.collect();
		for hook in &hooks {
			hook.will_save(self);
		}
		self.notify(&DocumentEvent::WillSave);

		SaveSnapshot {
			text: self.content(),
			version: self.buffer.version(),
			encoding: self.disk_encoding(),
			newlines: self.disk_newlines(),
			filter: self.filter,
			keep_backup: self.flags.keep_backup_file,
		}
	}

	/// Records a completed save of `snapshot` to `path`.
	pub(crate) fn mark_saved(&mut self, path: PathBuf, snapshot: &SaveSnapshot) {
		if self.buffer.version() == snapshot.version {
			self.undo.mark_clean();
		} else {
			tracing::debug!(id = %self.id, "document.edited_during_save");
		}
		self.set_path(Some(path.clone()));
		self.disk_format = Some((snapshot.encoding, snapshot.newlines));
		self.flags.on_disk = true;
		tracing::debug!(id = %self.id, path = %path.display(), "document.saved");
		self.notify(&DocumentEvent::DidSave { path });
	}

	/// Broadcasts a failure message before a completion reports it.
	pub(crate) fn will_show_alert(&self, message: &str) {
		self.notify(&DocumentEvent::WillShowAlert {
			message: message.to_string(),
		});
	}

	/// Emits `WillClose`, detaches all editors, and disables the document.
	pub(crate) fn close(&mut self) {
		if self.flags.closed {
			return;
		}
		self.notify(&DocumentEvent::WillClose);
		self.editors.clear();
		self.flags.open = false;
		self.flags.closed = true;
		tracing::debug!(id = %self.id, "document.closed");
	}

	fn ensure_mutable(&self) -> Result<()> {
		if self.flags.closed {
			return Err(DocumentError::Closed);
		}
		if self.flags.in_viewing_mode {
			return Err(DocumentError::ViewingMode);
		}
		Ok(())
	}

	fn restore(&mut self, reverted: Reverted, cause: ChangeCause) {
		self.selection = reverted.selection.clamp(self.buffer.len_bytes());
		self.content_changed(reverted.edits, reverted.first_line_touched, cause);
	}

	fn content_changed(&mut self, edits: Vec<Edit>, first_line_touched: bool, cause: ChangeCause) {
		let mut marks_moved = false;
		for edit in &edits {
			marks_moved |= self.marks.rebase(edit);
		}
		if first_line_touched {
			self.metadata.invalidate();
		}
		self.notify(&DocumentEvent::ContentChanged {
			version: self.buffer.version(),
			edits,
			cause,
		});
		if marks_moved {
			self.notify(&DocumentEvent::MarksChanged { mark_type: None });
		}
	}

	fn marks_changed(&self, mark_type: Option<&str>) {
		self.notify(&DocumentEvent::MarksChanged {
			mark_type: mark_type.map(str::to_string),
		});
	}

	fn notify(&self, event: &DocumentEvent) {
		for editor in &self.editors {
			editor.on_event(self, event);
		}
		for (_, observer) in &self.observers {
			observer.on_event(self, event);
		}
	}

	/// Leading content used for metadata sniffing.
	fn content_prefix(&self) -> String {
		let mut prefix = String::new();
		// Offset zero is always valid.
		let _ = self.buffer.enumerate_byte_ranges(0, |_, chunk| {
			prefix.push_str(chunk);
			if prefix.len() >= SNIFF_LEN {
				ControlFlow::Break(())
			} else {
				ControlFlow::Continue(())
			}
		});
		prefix
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document")
			.field("id", &self.id)
			.field("path", &self.path)
			.field("len", &self.buffer.len_bytes())
			.field("version", &self.buffer.version())
			.field("edited", &self.is_document_edited())
			.field("editors", &self.editors.len())
			.finish_non_exhaustive()
	}
}
