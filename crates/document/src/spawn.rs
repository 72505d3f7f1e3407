use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::{DocumentError, Result};
use crate::io::IoKind;

static GLOBAL_RT: OnceLock<Runtime> = OnceLock::new();

fn runtime_handle() -> std::io::Result<Handle> {
	if let Ok(handle) = Handle::try_current() {
		return Ok(handle);
	}
	if let Some(runtime) = GLOBAL_RT.get() {
		return Ok(runtime.handle().clone());
	}

	let runtime = Builder::new_multi_thread()
		.enable_all()
		.worker_threads(2)
		.thread_name("folio-io")
		.build()?;
	Ok(GLOBAL_RT.get_or_init(|| runtime).handle().clone())
}

/// Spawns a load or save on the current runtime, or on a shared fallback
/// runtime when called outside of one.
pub(crate) fn spawn_io<F>(kind: IoKind, fut: F) -> Result<JoinHandle<F::Output>>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(kind = ?kind, "io.spawn");
	let handle = runtime_handle().map_err(DocumentError::Runtime)?;
	Ok(handle.spawn(fut))
}
