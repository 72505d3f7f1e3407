//! Error types for document operations.

use std::path::PathBuf;

use thiserror::Error;

/// A byte range or position that does not fit the current buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
	/// The range is reversed or extends past the end of the buffer.
	#[error("range {start}..{end} is outside buffer of {len} bytes")]
	OutOfBounds {
		/// Requested start offset.
		start: usize,
		/// Requested end offset.
		end: usize,
		/// Buffer length at the time of the request.
		len: usize,
	},

	/// The offset falls inside a multi-byte UTF-8 sequence.
	#[error("offset {offset} is not on a character boundary")]
	NotCharBoundary {
		/// The offending byte offset.
		offset: usize,
	},

	/// A line index past the last line.
	#[error("line {line} is past the last line ({lines} lines)")]
	LineOutOfBounds {
		/// Requested zero-based line.
		line: usize,
		/// Number of lines in the buffer.
		lines: usize,
	},
}

/// Errors returned synchronously by document entry points.
///
/// Failures of load and save are never reported this way; they arrive through
/// [`crate::IoCompletion`].
#[derive(Debug, Error)]
pub enum DocumentError {
	/// Invalid buffer access.
	#[error(transparent)]
	Range(#[from] RangeError),

	/// A load or save is already running for this document.
	#[error("another load or save is in progress")]
	Busy,

	/// An output request was made while no editor is attached.
	#[error("no editor is attached to receive output")]
	NoRecipient,

	/// A mutation entry point was called while in viewing mode.
	#[error("document is in viewing mode")]
	ViewingMode,

	/// The document has been closed.
	#[error("document is closed")]
	Closed,

	/// A mark string could not be produced.
	#[error("failed to serialize marks: {0}")]
	Marks(#[from] serde_json::Error),

	/// No tokio runtime was available and the fallback could not be built.
	#[error("failed to start I/O runtime: {0}")]
	Runtime(#[source] std::io::Error),
}

/// Errors raised while reading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The file could not be read.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or has the wrong shape.
	#[error("invalid settings in {path}: {error}")]
	Parse {
		/// Path to the malformed file.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},

	/// A `[files."<glob>"]` table has an invalid pattern.
	#[error("invalid glob {pattern:?} in {path}: {error}")]
	Glob {
		/// Path to the file containing the pattern.
		path: PathBuf,
		/// The rejected pattern.
		pattern: String,
		/// The underlying glob error.
		error: globset::Error,
	},
}

/// Errors converting between disk bytes and buffer text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
	/// A character has no representation in the target encoding.
	#[error("character {ch:?} at byte {offset} cannot be encoded as {encoding}")]
	Unrepresentable {
		/// The offending character.
		ch: char,
		/// Byte offset of the character in the buffer text.
		offset: usize,
		/// Name of the target encoding.
		encoding: &'static str,
	},

	/// The input bytes are not valid in the declared encoding.
	#[error("invalid {encoding} data at byte {offset}")]
	Malformed {
		/// Name of the source encoding.
		encoding: &'static str,
		/// Byte offset of the first invalid unit.
		offset: usize,
	},
}

/// Errors produced by a content filter.
#[derive(Debug, Error)]
#[error("{filter} filter failed: {message}")]
pub struct FilterError {
	/// Name of the failing filter.
	pub filter: String,
	/// Description of the failure.
	pub message: String,
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;
