use std::path::Path;

use super::*;

fn table() -> FileTypeTable {
	FileTypeTable::builtin()
}

#[test]
fn exact_filename_beats_extension() {
	let t = table();
	assert_eq!(t.resolve(Some(Path::new("/src/Makefile")), ""), "source.makefile");
	assert_eq!(t.resolve(Some(Path::new("Cargo.lock")), ""), "source.toml");
}

#[test]
fn longest_extension_wins() {
	let t = table();
	assert_eq!(t.resolve(Some(Path::new("views/index.html.erb")), ""), "text.html.erb");
	assert_eq!(t.resolve(Some(Path::new("index.HTML")), ""), "text.html.basic");
	assert_eq!(t.resolve(Some(Path::new("lib.rs")), ""), "source.rust");
}

#[test]
fn dotfile_is_not_an_extension() {
	let t = table();
	assert_eq!(t.resolve(Some(Path::new(".rs")), ""), PLAIN_TEXT);
	assert_eq!(t.resolve(Some(Path::new(".bashrc")), ""), "source.shell");
}

#[test]
fn shebang_resolves_when_path_is_unknown() {
	let t = table();
	assert_eq!(t.resolve(Some(Path::new("bin/tool")), "#!/usr/bin/env python3"), "source.python");
	assert_eq!(t.resolve(None, "#!/bin/bash -e"), "source.shell");
	assert_eq!(t.resolve(None, "#!/usr/bin/env -S perl -w"), "source.perl");
}

#[test]
fn modelines_resolve() {
	let t = table();
	assert_eq!(t.resolve(None, "# -*- mode: ruby; coding: utf-8 -*-"), "source.ruby");
	assert_eq!(t.resolve(None, "/* -*- C++ -*- */"), "source.c++");
	assert_eq!(t.resolve(None, "# vim: set ft=yaml :"), "source.yaml");
	assert_eq!(t.resolve(None, "// vim: filetype=rust"), "source.rust");
}

#[test]
fn unknown_falls_back_to_plain_text() {
	assert_eq!(table().resolve(Some(Path::new("notes")), "hello"), PLAIN_TEXT);
	assert_eq!(table().resolve(None, ""), PLAIN_TEXT);
}

#[test]
fn user_definitions_override_builtins() {
	let mut t = table();
	let mut def = FileTypeDef::new("source.rust.custom");
	def.extensions = vec!["rs".into()];
	t.register(def);
	assert_eq!(t.resolve(Some(Path::new("main.rs")), ""), "source.rust.custom");
}

#[test]
fn shebang_interpreter_parsing() {
	assert_eq!(shebang_interpreter("#!/usr/bin/python3.11"), Some("python"));
	assert_eq!(shebang_interpreter("#!/usr/bin/env node"), Some("node"));
	assert_eq!(shebang_interpreter("# not a shebang"), None);
	assert_eq!(shebang_interpreter("#!"), None);
}

#[test]
fn modeline_parsing() {
	assert_eq!(modeline_name("-*- mode: python -*-"), Some("python"));
	assert_eq!(modeline_name("-*- coding: utf-8 -*-"), None);
	assert_eq!(modeline_name("vim: ts=4 ft=c"), Some("c"));
	assert_eq!(modeline_name("plain text"), None);
}

#[test]
fn encoding_detection() {
	assert_eq!(Encoding::detect(b"\xEF\xBB\xBFhi"), Encoding::Utf8Bom);
	assert_eq!(Encoding::detect(b"\xFF\xFEh\0"), Encoding::Utf16Le);
	assert_eq!(Encoding::detect(b"\xFE\xFF\0h"), Encoding::Utf16Be);
	assert_eq!(Encoding::detect("héllo".as_bytes()), Encoding::Utf8);
	assert_eq!(Encoding::detect(b"h\xE9llo"), Encoding::Latin1);
	// a multi-byte sequence cut at the end of the prefix is still UTF-8
	assert_eq!(Encoding::detect(&"aé".as_bytes()[..2]), Encoding::Utf8);
}

#[test]
fn encodings_roundtrip_text() {
	let text = "héllo\nwörld";
	for encoding in [Encoding::Utf8, Encoding::Utf8Bom, Encoding::Utf16Le, Encoding::Utf16Be, Encoding::Latin1] {
		let bytes = encoding.encode(text).unwrap();
		assert_eq!(Encoding::detect(&bytes), encoding);
		assert_eq!(encoding.decode(&bytes).unwrap(), text);
	}
}

#[test]
fn latin1_rejects_unrepresentable() {
	let err = Encoding::Latin1.encode("ok→").unwrap_err();
	assert_eq!(
		err,
		crate::error::EncodingError::Unrepresentable {
			ch: '→',
			offset: 2,
			encoding: "iso-8859-1",
		}
	);
}

#[test]
fn newline_detection_and_apply() {
	assert_eq!(Newlines::detect("a\r\nb\n"), Newlines::CrLf);
	assert_eq!(Newlines::detect("a\rb"), Newlines::Cr);
	assert_eq!(Newlines::detect("a\nb\r\n"), Newlines::Lf);
	assert_eq!(Newlines::detect("none"), Newlines::Lf);
	assert_eq!(Newlines::CrLf.apply("a\nb\n"), "a\r\nb\r\n");
	assert_eq!("CRLF".parse::<Newlines>(), Ok(Newlines::CrLf));
	assert_eq!("latin1".parse::<Encoding>(), Ok(Encoding::Latin1));
}

#[test]
fn resolve_reads_prefix() {
	let t = table();
	let meta = resolve(&t, None, b"#!/bin/sh\r\necho\r\n");
	assert_eq!(meta.file_type, "source.shell");
	assert_eq!(meta.newlines, Newlines::CrLf);
	assert_eq!(meta.encoding, Encoding::Utf8);

	let utf16 = Encoding::Utf16Le.encode("#!/usr/bin/env ruby\n").unwrap();
	let meta = resolve(&t, None, &utf16[..utf16.len() - 1]);
	assert_eq!(meta.file_type, "source.ruby");
	assert_eq!(meta.encoding, Encoding::Utf16Le);
}

#[test]
fn cache_only_resolves_when_inputs_change() {
	let cache = MetadataCache::new();
	let value = || ResolvedMetadata {
		file_type: "source.rust".into(),
		encoding: Encoding::Utf8,
		newlines: Newlines::Lf,
	};
	cache.get_or_resolve(|| 1, value);
	cache.get_or_resolve(|| unreachable!("valid cache must not hash"), value);
	assert_eq!(cache.resolutions(), 1);

	cache.invalidate();
	assert!(!cache.is_valid());
	cache.get_or_resolve(|| 1, value);
	assert_eq!(cache.resolutions(), 1);
	assert!(cache.is_valid());

	cache.invalidate();
	cache.get_or_resolve(|| 2, value);
	assert_eq!(cache.resolutions(), 2);
}
