//! Core types for text documents: byte ranges, edits, selections, and positions.

/// Single replace-range edits and anchor rebasing.
pub mod edit;
/// Line/column text positions.
pub mod pos;
/// Byte range types.
pub mod range;
/// Rope utilities and extensions.
pub mod rope;
/// Selection types for single and multi-cursor editing.
pub mod selection;

pub use edit::{Bias, Edit, EditId};
pub use pos::{ParsePosError, TextPos};
pub use range::{ByteIdx, ByteLen, Direction, Range};
pub use rope::{first_line_end, normalize_to_lf};
pub use ropey::{Rope, RopeSlice};
pub use selection::Selection;
