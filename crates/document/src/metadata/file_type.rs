//! File type definitions and lookup.
//!
//! A file type is named by a scope-like string such as `source.rust`. The
//! [`FileTypeTable`] maps exact file names, dotted extensions, shebang
//! interpreters and modeline names to these scopes.

use std::collections::HashMap;
use std::path::Path;

/// Scope used when nothing matches.
pub const PLAIN_TEXT: &str = "text.plain";

/// Definition of a single file type.
#[derive(Debug, Clone, Default)]
pub struct FileTypeDef {
	/// Scope name (e.g. `source.python`).
	pub name: String,
	/// Extensions without the leading dot; may contain dots (`html.erb`).
	pub extensions: Vec<String>,
	/// Exact file names (e.g. `Makefile`).
	pub filenames: Vec<String>,
	/// Shebang interpreters without version suffix (e.g. `python`).
	pub interpreters: Vec<String>,
	/// Names accepted in `-*- mode: X -*-` and `vim: ft=X` modelines.
	pub aliases: Vec<String>,
}

impl FileTypeDef {
	/// Creates an empty definition for `name`.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	fn with(mut self, extensions: &[&str], filenames: &[&str], interpreters: &[&str], aliases: &[&str]) -> Self {
		let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
		self.extensions = owned(extensions);
		self.filenames = owned(filenames);
		self.interpreters = owned(interpreters);
		self.aliases = owned(aliases);
		self
	}
}

/// Lookup table from paths and first lines to file type scopes.
///
/// Later registrations take precedence over earlier ones, so user
/// definitions registered after [`FileTypeTable::builtin`] override it.
#[derive(Debug, Clone, Default)]
pub struct FileTypeTable {
	types: Vec<FileTypeDef>,
	by_extension: HashMap<String, usize>,
	by_filename: HashMap<String, usize>,
	by_interpreter: HashMap<String, usize>,
	by_alias: HashMap<String, usize>,
}

impl FileTypeTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a table with the built-in definitions.
	pub fn builtin() -> Self {
		let mut table = Self::new();
		for def in builtin_defs() {
			table.register(def);
		}
		table
	}

	/// Registers a definition.
	pub fn register(&mut self, def: FileTypeDef) {
		let idx = self.types.len();
		for ext in &def.extensions {
			self.by_extension.insert(ext.to_ascii_lowercase(), idx);
		}
		for name in &def.filenames {
			self.by_filename.insert(name.clone(), idx);
		}
		for interp in &def.interpreters {
			self.by_interpreter.insert(interp.clone(), idx);
		}
		self.by_alias.insert(def.name.to_ascii_lowercase(), idx);
		for alias in &def.aliases {
			self.by_alias.insert(alias.to_ascii_lowercase(), idx);
		}
		self.types.push(def);
	}

	/// Iterates over registered definitions.
	pub fn iter(&self) -> impl Iterator<Item = &FileTypeDef> {
		self.types.iter()
	}

	/// Resolves the file type scope for a path and first line.
	///
	/// Tries the exact file name, then extensions longest first, then the
	/// first line (shebang, then modelines), falling back to [`PLAIN_TEXT`].
	pub fn resolve(&self, path: Option<&Path>, first_line: &str) -> &str {
		path.and_then(|p| self.for_path(p))
			.or_else(|| self.for_first_line(first_line))
			.map_or(PLAIN_TEXT, |idx| self.types[idx].name.as_str())
	}

	/// Finds a definition by name or alias.
	pub fn by_name(&self, name: &str) -> Option<&FileTypeDef> {
		self.by_alias
			.get(&name.to_ascii_lowercase())
			.map(|&idx| &self.types[idx])
	}

	fn for_path(&self, path: &Path) -> Option<usize> {
		let name = path.file_name()?.to_str()?;
		if let Some(&idx) = self.by_filename.get(name) {
			return Some(idx);
		}

		// "a.tar.gz" tries "tar.gz" then "gz"; a leading dot is not a separator.
		let stem_start = usize::from(name.starts_with('.'));
		let lower = name.to_ascii_lowercase();
		lower[stem_start..]
			.match_indices('.')
			.map(|(i, _)| &lower[stem_start + i + 1..])
			.filter(|ext| !ext.is_empty())
			.find_map(|ext| self.by_extension.get(ext).copied())
	}

	fn for_first_line(&self, first_line: &str) -> Option<usize> {
		if let Some(interp) = shebang_interpreter(first_line)
			&& let Some(&idx) = self.by_interpreter.get(interp)
		{
			return Some(idx);
		}
		modeline_name(first_line).and_then(|name| self.by_alias.get(&name.to_ascii_lowercase()).copied())
	}
}

/// Extracts the interpreter name from a `#!` line.
///
/// Handles `/usr/bin/env` indirection and strips version suffixes
/// (`python3` becomes `python`).
pub fn shebang_interpreter(first_line: &str) -> Option<&str> {
	let line = first_line.strip_prefix("#!")?;
	let mut parts = line.split_whitespace();
	let first = parts.next()?;
	let program = first.rsplit('/').next()?;
	let interp = if program == "env" {
		parts.find(|arg| !arg.starts_with('-'))?
	} else {
		program
	};
	let base = interp.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
	(!base.is_empty()).then_some(base)
}

/// Extracts a mode name from an Emacs or Vim modeline.
pub fn modeline_name(line: &str) -> Option<&str> {
	if let Some(start) = line.find("-*-") {
		let rest = &line[start + 3..];
		let end = rest.find("-*-")?;
		let body = rest[..end].trim();
		if !body.contains(':') {
			return (!body.is_empty()).then_some(body);
		}
		for field in body.split(';') {
			if let Some((key, value)) = field.split_once(':')
				&& key.trim().eq_ignore_ascii_case("mode")
			{
				let value = value.trim();
				return (!value.is_empty()).then_some(value);
			}
		}
		return None;
	}

	let start = line.find("vim:").or_else(|| line.find("vi:"))?;
	let rest = &line[start..];
	let rest = &rest[rest.find(':')? + 1..];
	rest.split(|c: char| c.is_whitespace() || c == ':')
		.filter_map(|opt| opt.split_once('='))
		.find(|(key, _)| matches!(*key, "ft" | "filetype" | "syntax" | "syn"))
		.map(|(_, value)| value)
		.filter(|value| !value.is_empty())
}

fn builtin_defs() -> Vec<FileTypeDef> {
	vec![
		FileTypeDef::new("source.rust").with(&["rs"], &[], &[], &["rust"]),
		FileTypeDef::new("source.python").with(&["py", "pyw", "pyi"], &[], &["python"], &["python"]),
		FileTypeDef::new("source.shell").with(
			&["sh", "bash", "zsh"],
			&[".bashrc", ".bash_profile", ".profile", ".zshrc", ".zprofile"],
			&["sh", "bash", "zsh", "dash", "ksh"],
			&["sh", "shell", "bash", "shell-script", "zsh"],
		),
		FileTypeDef::new("source.ruby").with(&["rb", "rake", "gemspec"], &["Rakefile", "Gemfile"], &["ruby"], &["ruby"]),
		FileTypeDef::new("source.perl").with(&["pl", "pm"], &[], &["perl"], &["perl"]),
		FileTypeDef::new("source.js").with(&["js", "mjs", "cjs"], &[], &["node"], &["javascript", "js"]),
		FileTypeDef::new("source.json").with(&["json"], &[], &[], &["json"]),
		FileTypeDef::new("source.toml").with(&["toml"], &["Cargo.lock"], &[], &["toml"]),
		FileTypeDef::new("source.yaml").with(&["yml", "yaml"], &[], &[], &["yaml"]),
		FileTypeDef::new("source.c").with(&["c", "h"], &[], &[], &["c"]),
		FileTypeDef::new("source.c++").with(&["cc", "cpp", "cxx", "hpp", "hh"], &[], &[], &["c++", "cpp"]),
		FileTypeDef::new("source.makefile").with(&["mk", "make"], &["Makefile", "GNUmakefile", "makefile"], &["make"], &["makefile", "make"]),
		FileTypeDef::new("text.html.basic").with(&["html", "htm"], &[], &[], &["html"]),
		FileTypeDef::new("text.html.erb").with(&["html.erb", "erb", "rhtml"], &[], &[], &["erb", "eruby"]),
		FileTypeDef::new("text.html.markdown").with(&["md", "markdown"], &[], &[], &["markdown", "md"]),
		FileTypeDef::new("text.xml").with(&["xml", "svg", "plist"], &[], &[], &["xml", "nxml"]),
	]
}
