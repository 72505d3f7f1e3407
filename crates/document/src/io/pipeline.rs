use std::io;
use std::path::{Path, PathBuf};

use folio_primitives::normalize_to_lf;

use super::{Authorization, IoCompletion, IoKind, IoOperation, IoState, IoTask, WriteOptions};
use crate::document::SaveSnapshot;
use crate::error::{DocumentError, Result};
use crate::handle::{DocumentHandle, InFlight};
use crate::metadata::{Encoding, Newlines, SNIFF_LEN};
use crate::services::Services;
use crate::spawn::spawn_io;

/// Starts a load of the document's path.
pub(crate) fn start_load(handle: &DocumentHandle) -> Result<IoTask> {
	let (path, services) = handle.with(|doc| {
		if doc.is_closed() {
			return Err(DocumentError::Closed);
		}
		Ok((doc.path().map(Path::to_path_buf), doc.services().clone()))
	})?;
	let guard = handle.begin_io()?;
	let (op, state) = IoOperation::new(IoKind::Load);
	let cancel = op.cancel.clone();
	let task_handle = handle.clone();

	let join = spawn_io(IoKind::Load, async move {
		op.set_state(IoState::Running);
		let completion = match path {
			Some(path) => run_load(&task_handle, &services, &op, &path).await,
			None => IoCompletion::failure("document has no file to load"),
		};
		finish(&task_handle, &op, guard, completion)
	})?;

	Ok(IoTask {
		kind: IoKind::Load,
		cancel,
		state,
		join,
	})
}

/// Starts a save to `target`, or to the document's path when `None`.
pub(crate) fn start_save(handle: &DocumentHandle, target: Option<PathBuf>) -> Result<IoTask> {
	let (path, services) = handle.with(|doc| {
		if doc.is_closed() {
			return Err(DocumentError::Closed);
		}
		let path = target
			.map(|p| std::path::absolute(&p).unwrap_or(p))
			.or_else(|| doc.path().map(Path::to_path_buf));
		Ok((path, doc.services().clone()))
	})?;
	let guard = handle.begin_io()?;
	let (op, state) = IoOperation::new(IoKind::Save);
	let cancel = op.cancel.clone();
	let task_handle = handle.clone();

	let join = spawn_io(IoKind::Save, async move {
		op.set_state(IoState::Running);
		let completion = match path {
			Some(path) => run_save(&task_handle, &services, &op, path).await,
			None => IoCompletion::failure("document has no file to save to"),
		};
		finish(&task_handle, &op, guard, completion)
	})?;

	Ok(IoTask {
		kind: IoKind::Save,
		cancel,
		state,
		join,
	})
}

/// Reports `completion` and releases the document for the next operation.
///
/// The in-flight guard is released before the terminal state is published.
fn finish(handle: &DocumentHandle, op: &IoOperation, guard: InFlight, completion: IoCompletion) -> IoCompletion {
	if let Some(message) = &completion.error_message {
		handle.with(|doc| doc.will_show_alert(message));
	}
	tracing::debug!(
		id = %handle.id(),
		kind = ?op.kind,
		result = ?completion.result,
		error = completion.error_message.as_deref().unwrap_or_default(),
		"io.complete"
	);
	drop(guard);
	op.set_state(completion.terminal_state());
	completion
}

async fn run_load(handle: &DocumentHandle, services: &Services, op: &IoOperation, path: &Path) -> IoCompletion {
	tracing::debug!(id = %handle.id(), path = %path.display(), "io.load");
	let raw = match access(handle, services, op, path, Access::Read).await {
		Accessed::Done(bytes) => bytes,
		Accessed::Cancelled => return IoCompletion::cancel(),
		Accessed::Failed(error) => {
			return IoCompletion::failure(format!("could not read {}: {error}", path.display()));
		}
	};

	let filter = services.filters.select(path, &raw[..raw.len().min(SNIFF_LEN)]);
	let data = match &filter {
		Some(filter) => match filter.decode(&raw) {
			Ok(data) => data,
			Err(error) => return IoCompletion::failure(error.to_string()),
		},
		None => raw,
	};

	let (text, encoding) = match decode(&data) {
		Ok(decoded) => decoded,
		Err(message) => return IoCompletion::failure(format!("could not decode {}: {message}", path.display())),
	};
	let newlines = Newlines::detect(&text);
	let text = normalize_to_lf(text);

	if op.is_cancelled() {
		return IoCompletion::cancel();
	}
	let filter_id = filter.map(|f| f.id());
	let applied = handle.with_mut(|doc| {
		if doc.is_closed() {
			return false;
		}
		doc.apply_loaded(text, encoding, newlines, filter_id);
		true
	});
	if !applied {
		return IoCompletion::cancel();
	}
	IoCompletion::success(filter_id)
}

/// Decodes with the detected encoding, falling back to ISO-8859-1 when
/// UTF-8 detection was fooled by a valid prefix.
fn decode(data: &[u8]) -> std::result::Result<(String, Encoding), String> {
	let encoding = Encoding::detect(data);
	match encoding.decode(data) {
		Ok(text) => Ok((text, encoding)),
		Err(error) if encoding == Encoding::Utf8 => {
			tracing::debug!(%error, "io.decode_fallback");
			Encoding::Latin1
				.decode(data)
				.map(|text| (text, Encoding::Latin1))
				.map_err(|e| e.to_string())
		}
		Err(error) => Err(error.to_string()),
	}
}

async fn run_save(handle: &DocumentHandle, services: &Services, op: &IoOperation, path: PathBuf) -> IoCompletion {
	tracing::debug!(id = %handle.id(), path = %path.display(), "io.save");
	let snapshot = handle.with_mut(|doc| doc.prepare_save());
	let bytes = match serialize(services, &snapshot) {
		Ok(bytes) => bytes,
		Err(message) => return IoCompletion::failure(format!("could not save {}: {message}", path.display())),
	};

	if op.is_cancelled() {
		return IoCompletion::cancel();
	}
	let options = WriteOptions {
		backup: snapshot.keep_backup,
	};
	match access(handle, services, op, &path, Access::Write { bytes: &bytes, options }).await {
		Accessed::Done(_) => {}
		Accessed::Cancelled => return IoCompletion::cancel(),
		Accessed::Failed(error) => {
			return IoCompletion::failure(format!("could not write {}: {error}", path.display()));
		}
	}

	handle.with_mut(|doc| doc.mark_saved(path, &snapshot));
	IoCompletion::success(snapshot.filter)
}

fn serialize(services: &Services, snapshot: &SaveSnapshot) -> std::result::Result<Vec<u8>, String> {
	let text = snapshot.newlines.apply(&snapshot.text);
	let bytes = snapshot.encoding.encode(&text).map_err(|e| e.to_string())?;
	let Some(id) = snapshot.filter else {
		return Ok(bytes);
	};
	match services.filters.get(id) {
		Some(filter) => filter.encode(&bytes).map_err(|e| e.to_string()),
		None => {
			tracing::warn!(filter = %id, "io.filter_missing");
			Ok(bytes)
		}
	}
}

enum Access<'a> {
	Read,
	Write { bytes: &'a [u8], options: WriteOptions },
}

enum Accessed {
	Done(Vec<u8>),
	Cancelled,
	Failed(io::Error),
}

/// Performs a read or write, escalating once on a permission failure.
///
/// A cached token is used from the start and never prompts again. Without
/// one, a permission failure on a foreign-owned path asks the prompt; a
/// granted token is cached on the document and the access retried, a
/// declined prompt cancels.
///
/// Reads race against cancellation. Writes are not interrupted once started.
async fn access(
	handle: &DocumentHandle,
	services: &Services,
	op: &IoOperation,
	path: &Path,
	request: Access<'_>,
) -> Accessed {
	let mut auth: Option<Authorization> = handle.with(|doc| doc.authorization().cloned());
	loop {
		let result = match &request {
			Access::Read => {
				tokio::select! {
					biased;
					_ = op.cancel.cancelled() => return Accessed::Cancelled,
					result = services.storage.read(path, auth.as_ref()) => result,
				}
			}
			Access::Write { bytes, options } => services
				.storage
				.write(path, bytes.to_vec(), *options, auth.as_ref())
				.await
				.map(|()| Vec::new()),
		};

		let error = match result {
			Ok(bytes) => return Accessed::Done(bytes),
			Err(error) => error,
		};
		if error.kind() != io::ErrorKind::PermissionDenied
			|| auth.is_some()
			|| !services.storage.owned_by_other(path).await
		{
			return Accessed::Failed(error);
		}

		op.set_state(IoState::AwaitingAuthorization);
		tracing::debug!(id = %handle.id(), path = %path.display(), "io.authorization_requested");
		let granted = tokio::select! {
			biased;
			_ = op.cancel.cancelled() => return Accessed::Cancelled,
			granted = services.prompt.request(path) => granted,
		};
		let Some(token) = granted else {
			return Accessed::Cancelled;
		};
		handle.with_mut(|doc| doc.set_authorization(token.clone()));
		auth = Some(token);
		op.set_state(IoState::Running);
	}
}
