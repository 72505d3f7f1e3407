//! Rope utilities and extensions.

use ropey::RopeSlice;

use crate::range::ByteIdx;

/// Returns the byte offset where the first line ends, excluding its newline.
///
/// For single-line text this is the byte length.
pub fn first_line_end(text: RopeSlice) -> ByteIdx {
	if text.len_lines() <= 1 {
		return text.len_bytes();
	}
	let next_line = text.line_to_byte(1);
	// `next_line` sits just past the terminating '\n'.
	next_line.saturating_sub(1)
}

/// Converts CRLF and lone CR line endings to LF.
///
/// Returns the input untouched when it contains no carriage returns.
pub fn normalize_to_lf(mut s: String) -> String {
	if !s.contains('\r') {
		return s;
	}

	let mut out = String::with_capacity(s.len());
	let mut chars = s.drain(..).peekable();
	while let Some(ch) = chars.next() {
		if ch == '\r' {
			if chars.peek() == Some(&'\n') {
				chars.next();
			}
			out.push('\n');
		} else {
			out.push(ch);
		}
	}

	out
}
