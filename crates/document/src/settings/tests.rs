use std::fs;
use std::time::{Duration, SystemTime};

use super::*;

fn write(path: &Path, text: &str) {
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, text).unwrap();
}

#[test]
fn defaults_without_files() {
	let dir = tempfile::tempdir().unwrap();
	let settings = PropertiesCascade::new().settings(Some(&dir.path().join("a.txt")), None, "text.plain");
	assert_eq!(settings, DocumentSettings::default());
}

#[test]
fn nearer_file_overrides_farther() {
	let dir = tempfile::tempdir().unwrap();
	write(
		&dir.path().join(SETTINGS_FILE_NAME),
		"tab_size = 8\nsoft_tabs = true\n[variables]\nROOT = \"1\"\n",
	);
	write(
		&dir.path().join("sub").join(SETTINGS_FILE_NAME),
		"tab_size = 2\n[variables]\nSUB = \"2\"\n",
	);

	let doc = dir.path().join("sub").join("main.rs");
	let settings = PropertiesCascade::new().settings(Some(&doc), None, "source.rust");
	assert_eq!(settings.tab_size, 2);
	assert!(settings.soft_tabs);
	assert_eq!(settings.variables.get("ROOT").map(String::as_str), Some("1"));
	assert_eq!(settings.variables.get("SUB").map(String::as_str), Some("2"));
}

#[test]
fn file_type_and_glob_sections() {
	let dir = tempfile::tempdir().unwrap();
	write(
		&dir.path().join(SETTINGS_FILE_NAME),
		r#"
tab_size = 8
encoding = "latin1"
newlines = "crlf"

[file_type."source.python"]
tab_size = 4
soft_tabs = true

[files."*.md"]
spell_checking = true
spelling_language = "en_GB"
"#,
	);

	let cascade = PropertiesCascade::new();
	let py = cascade.settings(Some(&dir.path().join("x.py")), None, "source.python");
	assert_eq!(py.tab_size, 4);
	assert!(py.soft_tabs);
	assert!(!py.spell_checking);
	assert_eq!(py.encoding, Some(Encoding::Latin1));
	assert_eq!(py.newlines, Some(Newlines::CrLf));

	let md = cascade.settings(Some(&dir.path().join("docs").join("README.md")), None, "text.html.markdown");
	assert_eq!(md.tab_size, 8);
	assert!(md.spell_checking);
	assert_eq!(md.spelling_language.as_deref(), Some("en_GB"));
}

#[test]
fn untitled_documents_use_directory() {
	let dir = tempfile::tempdir().unwrap();
	write(&dir.path().join(SETTINGS_FILE_NAME), "tab_size = 3\n");
	let settings = PropertiesCascade::new().settings(None, Some(dir.path()), "text.plain");
	assert_eq!(settings.tab_size, 3);
}

#[test]
fn malformed_files_are_skipped() {
	let dir = tempfile::tempdir().unwrap();
	write(&dir.path().join(SETTINGS_FILE_NAME), "tab_size = 3\n");
	write(&dir.path().join("sub").join(SETTINGS_FILE_NAME), "tab_size = [\n");
	write(&dir.path().join("glob").join(SETTINGS_FILE_NAME), "[files.\"a{\"]\ntab_size = 9\n");

	let cascade = PropertiesCascade::new();
	let sub = cascade.settings(Some(&dir.path().join("sub").join("a.txt")), None, "text.plain");
	assert_eq!(sub.tab_size, 3);
	let glob = cascade.settings(Some(&dir.path().join("glob").join("a.txt")), None, "text.plain");
	assert_eq!(glob.tab_size, 3);
}

#[test]
fn invalid_values_are_ignored() {
	let dir = tempfile::tempdir().unwrap();
	write(&dir.path().join(SETTINGS_FILE_NAME), "encoding = \"ebcdic\"\ntab_size = 0\n");
	let settings = PropertiesCascade::new().settings(Some(&dir.path().join("a")), None, "text.plain");
	assert_eq!(settings.encoding, None);
	assert_eq!(settings.tab_size, 4);
}

#[test]
fn cache_reloads_on_modification() {
	let dir = tempfile::tempdir().unwrap();
	let file = dir.path().join(SETTINGS_FILE_NAME);
	write(&file, "tab_size = 3\n");
	let cascade = PropertiesCascade::new();
	let doc = dir.path().join("a.txt");
	assert_eq!(cascade.settings(Some(&doc), None, "text.plain").tab_size, 3);

	write(&file, "tab_size = 5\n");
	fs::File::options()
		.write(true)
		.open(&file)
		.unwrap()
		.set_modified(SystemTime::now() + Duration::from_secs(60))
		.unwrap();
	assert_eq!(cascade.settings(Some(&doc), None, "text.plain").tab_size, 5);
}

#[test]
fn static_settings_provider() {
	let fixed = DocumentSettings {
		tab_size: 2,
		..DocumentSettings::default()
	};
	assert_eq!(fixed.settings(None, None, "text.plain").tab_size, 2);
}
