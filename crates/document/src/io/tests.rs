use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::*;
use crate::document::Document;
use crate::error::{DocumentError, FilterError};
use crate::event::{DocumentEvent, DocumentObserver};
use crate::filter::ContentFilter;
use crate::metadata::Encoding;
use crate::registry::DocumentRegistry;
use crate::services::Services;
use crate::settings::DocumentSettings;

#[derive(Default)]
struct FakeStorage {
	files: Mutex<HashMap<PathBuf, Vec<u8>>>,
	/// Paths that need an authorization token.
	protected: Mutex<HashSet<PathBuf>>,
	foreign: AtomicBool,
	hold: AtomicBool,
	release: Notify,
	seen: Mutex<Vec<Option<Authorization>>>,
}

impl FakeStorage {
	fn with_file(path: &str, bytes: &[u8]) -> Arc<Self> {
		let storage = Self::default();
		storage.files.lock().insert(PathBuf::from(path), bytes.to_vec());
		Arc::new(storage)
	}

	fn protect(&self, path: &str, foreign: bool) {
		self.protected.lock().insert(PathBuf::from(path));
		self.foreign.store(foreign, Ordering::SeqCst);
	}

	fn file(&self, path: &str) -> Option<Vec<u8>> {
		self.files.lock().get(Path::new(path)).cloned()
	}

	fn check(&self, path: &Path, auth: Option<&Authorization>) -> io::Result<()> {
		self.seen.lock().push(auth.cloned());
		if auth.is_none() && self.protected.lock().contains(path) {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
		}
		Ok(())
	}
}

#[async_trait]
impl Storage for FakeStorage {
	async fn read(&self, path: &Path, auth: Option<&Authorization>) -> io::Result<Vec<u8>> {
		if self.hold.load(Ordering::SeqCst) {
			self.release.notified().await;
		}
		self.check(path, auth)?;
		self.file(&path.to_string_lossy())
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
	}

	async fn write(
		&self,
		path: &Path,
		bytes: Vec<u8>,
		_options: WriteOptions,
		auth: Option<&Authorization>,
	) -> io::Result<()> {
		self.check(path, auth)?;
		self.files.lock().insert(path.to_path_buf(), bytes);
		Ok(())
	}

	async fn owned_by_other(&self, _path: &Path) -> bool {
		self.foreign.load(Ordering::SeqCst)
	}
}

struct FakePrompt {
	grant: bool,
	calls: AtomicUsize,
	gate: Option<Arc<Notify>>,
}

impl FakePrompt {
	fn new(grant: bool) -> Arc<Self> {
		Arc::new(Self {
			grant,
			calls: AtomicUsize::new(0),
			gate: None,
		})
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl AuthorizationPrompt for FakePrompt {
	async fn request(&self, _path: &Path) -> Option<Authorization> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(gate) = &self.gate {
			gate.notified().await;
		}
		self.grant.then(|| Authorization::new("root"))
	}
}

/// Stores bytes reversed on disk.
struct Reverse {
	id: FilterId,
}

impl ContentFilter for Reverse {
	fn id(&self) -> FilterId {
		self.id
	}

	fn name(&self) -> &str {
		"reverse"
	}

	fn matches(&self, path: &Path, _prefix: &[u8]) -> bool {
		path.extension().is_some_and(|ext| ext == "rev")
	}

	fn decode(&self, raw: &[u8]) -> Result<Vec<u8>, FilterError> {
		Ok(raw.iter().rev().copied().collect())
	}

	fn encode(&self, data: &[u8]) -> Result<Vec<u8>, FilterError> {
		Ok(data.iter().rev().copied().collect())
	}
}

#[derive(Default)]
struct Alerts(Mutex<Vec<String>>);

impl DocumentObserver for Alerts {
	fn on_event(&self, _doc: &Document, event: &DocumentEvent) {
		if let DocumentEvent::WillShowAlert { message } = event {
			self.0.lock().push(message.clone());
		}
	}
}

/// Ensures a trailing newline before every save.
struct TrailingNewline;

impl DocumentObserver for TrailingNewline {
	fn on_event(&self, _doc: &Document, _event: &DocumentEvent) {}

	fn will_save(&self, doc: &mut Document) {
		let len = doc.buffer().len_bytes();
		if !doc.content().ends_with('\n') {
			doc.replace(len..len, "\n").unwrap();
		}
	}
}

fn registry(storage: &Arc<FakeStorage>, prompt: &Arc<FakePrompt>) -> DocumentRegistry {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	DocumentRegistry::new(Services {
		storage: Arc::clone(storage) as Arc<dyn Storage>,
		prompt: Arc::clone(prompt) as Arc<dyn AuthorizationPrompt>,
		..Services::default().with_settings(DocumentSettings::default())
	})
}

#[tokio::test]
async fn missing_path_fails_with_alert() {
	let storage = Arc::new(FakeStorage::default());
	let prompt = FakePrompt::new(true);
	let doc = registry(&storage, &prompt).open_path("/virtual/missing.txt");
	let alerts = Arc::new(Alerts::default());
	doc.with_mut(|d| d.subscribe(alerts.clone()));

	let task = doc.load().unwrap();
	assert_eq!(task.kind(), IoKind::Load);
	let completion = task.completion().await;

	assert_eq!(completion.result, IoResult::Failure);
	let message = completion.error_message.unwrap();
	assert!(message.contains("/virtual/missing.txt"), "{message}");
	assert_eq!(alerts.0.lock().as_slice(), [message]);
	assert!(!doc.with(|d| d.is_open()));
	assert!(!doc.is_busy());
	assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn foreign_owned_file_declined_cancels() {
	let storage = FakeStorage::with_file("/etc/hosts", b"127.0.0.1 localhost\n");
	storage.protect("/etc/hosts", true);
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).open_path("/etc/hosts");

	let completion = doc.load().unwrap().completion().await;
	assert_eq!(completion, IoCompletion::cancel());
	assert_eq!(prompt.calls(), 1);
	doc.with(|d| {
		assert!(!d.is_open());
		assert!(d.authorization().is_none());
		assert_eq!(d.content(), "");
	});
}

#[tokio::test]
async fn granted_token_is_cached_and_reused() {
	let storage = FakeStorage::with_file("/etc/hosts", b"127.0.0.1 localhost\n");
	storage.protect("/etc/hosts", true);
	let prompt = FakePrompt::new(true);
	let doc = registry(&storage, &prompt).open_path("/etc/hosts");

	let completion = doc.load().unwrap().completion().await;
	assert!(completion.is_success());
	let token = doc.with(|d| {
		assert!(d.is_open());
		assert_eq!(d.content(), "127.0.0.1 localhost\n");
		d.authorization().cloned().unwrap()
	});
	assert_eq!(token.principal(), "root");

	doc.with_mut(|d| d.replace(0..0, "# hosts\n")).unwrap();
	assert!(doc.save().unwrap().completion().await.is_success());
	assert!(doc.load().unwrap().completion().await.is_success());
	assert_eq!(prompt.calls(), 1);

	let seen = storage.seen.lock();
	assert_eq!(seen.first(), Some(&None));
	assert!(seen[1..].iter().all(|auth| auth.as_ref() == Some(&token)));
	assert_eq!(storage.file("/etc/hosts").unwrap(), b"# hosts\n127.0.0.1 localhost\n");
}

#[tokio::test]
async fn permission_denied_on_own_file_fails_without_prompt() {
	let storage = FakeStorage::with_file("/home/me/locked.txt", b"x");
	storage.protect("/home/me/locked.txt", false);
	let prompt = FakePrompt::new(true);
	let doc = registry(&storage, &prompt).open_path("/home/me/locked.txt");

	let completion = doc.load().unwrap().completion().await;
	assert_eq!(completion.result, IoResult::Failure);
	assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn prompt_is_awaited_in_its_own_state() {
	let storage = FakeStorage::with_file("/etc/shadow", b"secret");
	storage.protect("/etc/shadow", true);
	let gate = Arc::new(Notify::new());
	let prompt = Arc::new(FakePrompt {
		grant: true,
		calls: AtomicUsize::new(0),
		gate: Some(Arc::clone(&gate)),
	});
	let doc = registry(&storage, &prompt).open_path("/etc/shadow");

	let mut task = doc.load().unwrap();
	assert_eq!(task.state(), IoState::Idle);
	assert_eq!(task.wait_for(IoState::AwaitingAuthorization).await, IoState::AwaitingAuthorization);
	gate.notify_one();
	assert_eq!(task.wait_for(IoState::Succeeded).await, IoState::Succeeded);
	assert!(task.completion().await.is_success());
}

#[tokio::test]
async fn cancel_while_awaiting_authorization() {
	let storage = FakeStorage::with_file("/etc/shadow", b"secret");
	storage.protect("/etc/shadow", true);
	// The gate is never opened: only cancellation can end the prompt.
	let prompt = Arc::new(FakePrompt {
		grant: true,
		calls: AtomicUsize::new(0),
		gate: Some(Arc::new(Notify::new())),
	});
	let doc = registry(&storage, &prompt).open_path("/etc/shadow");

	let mut task = doc.load().unwrap();
	assert_eq!(task.wait_for(IoState::AwaitingAuthorization).await, IoState::AwaitingAuthorization);
	task.cancel();
	assert_eq!(task.wait_for(IoState::Cancelled).await, IoState::Cancelled);
	assert_eq!(task.completion().await, IoCompletion::cancel());

	assert_eq!(prompt.calls(), 1);
	assert!(!doc.is_busy());
	doc.with(|d| {
		assert!(!d.is_open());
		assert!(d.authorization().is_none());
		assert_eq!(d.content(), "");
	});
}

#[tokio::test]
async fn save_escalation_declined_cancels() {
	let storage = FakeStorage::with_file("/etc/motd", b"welcome\n");
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).open_path("/etc/motd");
	assert!(doc.load().unwrap().completion().await.is_success());
	assert_eq!(prompt.calls(), 0);

	storage.protect("/etc/motd", true);
	doc.with_mut(|d| d.replace(0..0, "hello, ")).unwrap();
	let completion = doc.save().unwrap().completion().await;

	assert_eq!(completion, IoCompletion::cancel());
	assert_eq!(prompt.calls(), 1);
	assert_eq!(storage.file("/etc/motd").unwrap(), b"welcome\n");
	doc.with(|d| {
		assert!(d.is_document_edited());
		assert!(d.authorization().is_none());
		assert_eq!(d.content(), "hello, welcome\n");
	});
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn terminal_state_means_document_is_free() {
	let storage = FakeStorage::with_file("/tmp/a.txt", b"one\n");
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).open_path("/tmp/a.txt");

	for round in 0..500 {
		let mut task = doc.load().unwrap();
		assert_eq!(task.wait_for(IoState::Succeeded).await, IoState::Succeeded);
		match doc.load() {
			Ok(next) => assert!(next.completion().await.is_success()),
			Err(error) => panic!("round {round}: {error}"),
		}
		assert!(task.completion().await.is_success());
	}
}

#[tokio::test]
async fn second_request_is_busy() {
	let storage = FakeStorage::with_file("/tmp/a.txt", b"one");
	storage.hold.store(true, Ordering::SeqCst);
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).open_path("/tmp/a.txt");

	let task = doc.load().unwrap();
	assert!(doc.is_busy());
	assert!(matches!(doc.load(), Err(DocumentError::Busy)));
	assert!(matches!(doc.save(), Err(DocumentError::Busy)));

	storage.release.notify_one();
	assert!(task.completion().await.is_success());
	assert!(!doc.is_busy());

	storage.hold.store(false, Ordering::SeqCst);
	assert!(doc.load().unwrap().completion().await.is_success());
}

#[tokio::test]
async fn cancelled_load_leaves_buffer_alone() {
	let storage = FakeStorage::with_file("/tmp/a.txt", b"from disk");
	storage.hold.store(true, Ordering::SeqCst);
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).open_path("/tmp/a.txt");
	doc.with_mut(|d| d.replace(0..0, "typed")).unwrap();

	let task = doc.load().unwrap();
	task.cancel();
	let completion = task.completion().await;

	assert_eq!(completion.result, IoResult::Cancel);
	assert!(!doc.is_busy());
	doc.with(|d| {
		assert_eq!(d.content(), "typed");
		assert!(!d.is_open());
	});
}

#[tokio::test]
async fn filter_round_trips_through_load_and_save() {
	let storage = FakeStorage::with_file("/data/notes.rev", b"\nolleh");
	let id = FilterId::new();
	let registry = DocumentRegistry::new(
		Services {
			storage: Arc::clone(&storage) as Arc<dyn Storage>,
			..Services::default()
		}
		.with_settings(DocumentSettings::default())
		.with_filter(Reverse { id }),
	);
	let doc = registry.open_path("/data/notes.rev");

	let completion = doc.load().unwrap().completion().await;
	assert_eq!(completion.filter, Some(id));
	assert_eq!(doc.with(|d| d.content()), "hello\n");
	assert_eq!(doc.with(|d| d.filter()), Some(id));

	doc.with_mut(|d| d.replace(5..5, "!")).unwrap();
	let completion = doc.save().unwrap().completion().await;
	assert_eq!(completion, IoCompletion::success(Some(id)));
	assert_eq!(storage.file("/data/notes.rev").unwrap(), b"\n!olleh");
}

#[tokio::test]
async fn unencodable_content_fails_and_leaves_file() {
	let storage = FakeStorage::with_file("/tmp/latin.txt", b"caf\xe9\n");
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).open_path("/tmp/latin.txt");
	assert!(doc.load().unwrap().completion().await.is_success());
	assert_eq!(doc.with(|d| d.disk_encoding()), Encoding::Latin1);
	assert_eq!(doc.with(|d| d.content()), "café\n");

	doc.with_mut(|d| d.replace(0..0, "☃ ")).unwrap();
	let completion = doc.save().unwrap().completion().await;
	assert_eq!(completion.result, IoResult::Failure);
	assert!(completion.error_message.unwrap().contains("iso-8859-1"));
	assert_eq!(storage.file("/tmp/latin.txt").unwrap(), b"caf\xe9\n");
	assert!(doc.with(|d| d.is_document_edited()));
}

#[tokio::test]
async fn will_save_hooks_can_edit_before_serialization() {
	let storage = Arc::new(FakeStorage::default());
	let prompt = FakePrompt::new(false);
	let registry = registry(&storage, &prompt);
	let doc = registry.from_data(b"no newline", "text.plain", "draft");
	doc.with_mut(|d| d.subscribe(Arc::new(TrailingNewline)));

	let completion = doc.save_as("/tmp/draft.txt").unwrap().completion().await;
	assert!(completion.is_success());
	assert_eq!(storage.file("/tmp/draft.txt").unwrap(), b"no newline\n");
	doc.with(|d| {
		assert!(!d.is_document_edited());
		assert!(d.is_on_disk());
		assert_eq!(d.path(), Some(Path::new("/tmp/draft.txt")));
	});
}

#[tokio::test]
async fn save_without_path_fails() {
	let storage = Arc::new(FakeStorage::default());
	let prompt = FakePrompt::new(false);
	let doc = registry(&storage, &prompt).from_data(b"text", "text.plain", "scratch");

	let completion = doc.save().unwrap().completion().await;
	assert_eq!(completion.result, IoResult::Failure);
	assert!(storage.files.lock().is_empty());
}

#[tokio::test]
async fn closed_document_rejects_io() {
	let storage = Arc::new(FakeStorage::default());
	let prompt = FakePrompt::new(false);
	let registry = registry(&storage, &prompt);
	let doc = registry.open_path("/tmp/a.txt");
	doc.close();

	assert!(registry.find(doc.id()).is_none());
	assert!(matches!(doc.load(), Err(DocumentError::Closed)));
	assert!(matches!(doc.save(), Err(DocumentError::Closed)));
}
