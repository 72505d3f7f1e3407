//! Disk encodings and newline conventions.

use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 8 * 1024;

/// Character encoding of the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
	/// UTF-8 without a byte order mark.
	#[default]
	Utf8,
	/// UTF-8 with a leading byte order mark.
	Utf8Bom,
	/// UTF-16 little endian with a byte order mark.
	Utf16Le,
	/// UTF-16 big endian with a byte order mark.
	Utf16Be,
	/// ISO-8859-1.
	Latin1,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

impl Encoding {
	/// Canonical lowercase name.
	pub fn name(self) -> &'static str {
		match self {
			Self::Utf8 => "utf-8",
			Self::Utf8Bom => "utf-8-bom",
			Self::Utf16Le => "utf-16le",
			Self::Utf16Be => "utf-16be",
			Self::Latin1 => "iso-8859-1",
		}
	}

	/// Guesses the encoding from a content prefix.
	///
	/// A byte order mark wins; otherwise UTF-8 if the prefix is valid UTF-8
	/// (allowing a sequence cut off at the end), else ISO-8859-1.
	pub fn detect(prefix: &[u8]) -> Self {
		let prefix = &prefix[..prefix.len().min(SNIFF_LEN)];
		if prefix.starts_with(UTF8_BOM) {
			return Self::Utf8Bom;
		}
		if prefix.starts_with(UTF16LE_BOM) {
			return Self::Utf16Le;
		}
		if prefix.starts_with(UTF16BE_BOM) {
			return Self::Utf16Be;
		}
		match std::str::from_utf8(prefix) {
			Ok(_) => Self::Utf8,
			Err(e) if e.error_len().is_none() => Self::Utf8,
			Err(_) => Self::Latin1,
		}
	}

	/// Decodes file bytes into text, skipping a matching byte order mark.
	pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
		match self {
			Self::Utf8 | Self::Utf8Bom => {
				let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
				String::from_utf8(body.to_vec()).map_err(|e| EncodingError::Malformed {
					encoding: self.name(),
					offset: e.utf8_error().valid_up_to(),
				})
			}
			Self::Utf16Le | Self::Utf16Be => {
				let bom = if self == Self::Utf16Le { UTF16LE_BOM } else { UTF16BE_BOM };
				let body = bytes.strip_prefix(bom).unwrap_or(bytes);
				if body.len() % 2 != 0 {
					return Err(EncodingError::Malformed {
						encoding: self.name(),
						offset: bytes.len() - 1,
					});
				}
				let units = body.chunks_exact(2).map(|pair| {
					let pair = [pair[0], pair[1]];
					if self == Self::Utf16Le {
						u16::from_le_bytes(pair)
					} else {
						u16::from_be_bytes(pair)
					}
				});
				let mut out = String::with_capacity(body.len() / 2);
				for (i, ch) in char::decode_utf16(units).enumerate() {
					match ch {
						Ok(ch) => out.push(ch),
						Err(_) => {
							return Err(EncodingError::Malformed {
								encoding: self.name(),
								offset: i * 2,
							});
						}
					}
				}
				Ok(out)
			}
			Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
		}
	}

	/// Encodes text for disk, writing a byte order mark where the encoding has one.
	pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
		match self {
			Self::Utf8 => Ok(text.as_bytes().to_vec()),
			Self::Utf8Bom => {
				let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
				out.extend_from_slice(UTF8_BOM);
				out.extend_from_slice(text.as_bytes());
				Ok(out)
			}
			Self::Utf16Le | Self::Utf16Be => {
				let mut out = Vec::with_capacity(text.len() * 2 + 2);
				out.extend_from_slice(if self == Self::Utf16Le { UTF16LE_BOM } else { UTF16BE_BOM });
				for unit in text.encode_utf16() {
					let bytes = if self == Self::Utf16Le {
						unit.to_le_bytes()
					} else {
						unit.to_be_bytes()
					};
					out.extend_from_slice(&bytes);
				}
				Ok(out)
			}
			Self::Latin1 => text
				.char_indices()
				.map(|(offset, ch)| {
					u8::try_from(u32::from(ch)).map_err(|_| EncodingError::Unrepresentable {
						ch,
						offset,
						encoding: self.name(),
					})
				})
				.collect(),
		}
	}
}

impl fmt::Display for Encoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Encoding {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace('_', "-").as_str() {
			"utf-8" | "utf8" => Ok(Self::Utf8),
			"utf-8-bom" | "utf8-bom" => Ok(Self::Utf8Bom),
			"utf-16le" | "utf-16-le" => Ok(Self::Utf16Le),
			"utf-16be" | "utf-16-be" => Ok(Self::Utf16Be),
			"iso-8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
			other => Err(format!("unknown encoding: {other}")),
		}
	}
}

/// Line terminator convention of the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Newlines {
	/// `\n`
	#[default]
	Lf,
	/// `\r\n`
	CrLf,
	/// `\r`
	Cr,
}

impl Newlines {
	/// The terminator string.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lf => "\n",
			Self::CrLf => "\r\n",
			Self::Cr => "\r",
		}
	}

	/// Short name used in settings and variables.
	pub fn name(self) -> &'static str {
		match self {
			Self::Lf => "lf",
			Self::CrLf => "crlf",
			Self::Cr => "cr",
		}
	}

	/// Returns the first terminator found in `text`, defaulting to LF.
	pub fn detect(text: &str) -> Self {
		let bytes = text.as_bytes();
		match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
			Some(i) if bytes[i] == b'\n' => Self::Lf,
			Some(i) if bytes.get(i + 1) == Some(&b'\n') => Self::CrLf,
			Some(_) => Self::Cr,
			None => Self::Lf,
		}
	}

	/// Converts LF-normalized text to this convention.
	pub fn apply(self, text: &str) -> String {
		match self {
			Self::Lf => text.to_string(),
			other => text.replace('\n', other.as_str()),
		}
	}
}

impl fmt::Display for Newlines {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Newlines {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"lf" | "unix" => Ok(Self::Lf),
			"crlf" | "windows" => Ok(Self::CrLf),
			"cr" | "mac" => Ok(Self::Cr),
			other => Err(format!("unknown newline style: {other}")),
		}
	}
}
