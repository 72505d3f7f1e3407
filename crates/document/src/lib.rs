//! Document content and lifecycle engine.
//!
//! A [`Document`] owns a [`TextBuffer`], its [`UndoEngine`] history, and a
//! [`MarkTable`] of position-anchored annotations. Documents are shared through
//! [`DocumentHandle`]s handed out by a [`DocumentRegistry`], which also runs
//! loads and saves as cancellable tokio tasks reporting an [`IoCompletion`].
//!
//! Editors and other observers attach to a document and receive
//! [`DocumentEvent`]s in registration order, editors first.

pub mod buffer;
mod document;
pub mod editor;
pub mod error;
pub mod event;
pub mod filter;
mod handle;
pub mod io;
pub mod marks;
pub mod metadata;
mod registry;
mod services;
pub mod settings;
mod spawn;
pub mod undo;

pub use buffer::{Applied, TextBuffer};
pub use document::{Document, DocumentId, UNTITLED};
pub use editor::{CaretPlacement, DocumentEditor, OutputFormat, OutputPlacement, OutputRequest};
pub use error::{DocumentError, EncodingError, FilterError, RangeError, Result, SettingsError};
pub use event::{ChangeCause, DocumentEvent, DocumentObserver, SubscriptionId};
pub use filter::{ContentFilter, FilterId, FilterSet};
pub use handle::DocumentHandle;
pub use io::{
	Authorization, AuthorizationPrompt, DeclinePrompt, IoCompletion, IoKind, IoResult, IoState, IoTask,
	LocalStorage, Storage, WriteOptions,
};
pub use marks::MarkTable;
pub use metadata::{Encoding, FileTypeDef, FileTypeTable, GrammarProposer, Newlines, ResolvedMetadata};
pub use registry::DocumentRegistry;
pub use services::Services;
pub use settings::{DocumentSettings, PropertiesCascade, SettingsProvider};
pub use undo::{MAX_UNDO, UndoEngine};
