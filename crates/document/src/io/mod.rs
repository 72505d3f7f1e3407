//! Asynchronous, cancellable load and save.
//!
//! Each operation runs as a tokio task and moves through
//! `Idle -> Running -> (AwaitingAuthorization -> Running)? -> {Succeeded,
//! Cancelled, Failed}`. The terminal state is reported once through an
//! [`IoCompletion`]; failures are never dropped.
//!
//! At most one operation runs per document. The in-flight flag lives beside
//! the document lock, not under it, so a second request fails fast with
//! [`crate::DocumentError::Busy`] even while the first one holds no lock.

mod pipeline;
mod storage;

#[cfg(test)]
mod tests;

use std::path::Path;

use async_trait::async_trait;
pub(crate) use pipeline::{start_load, start_save};
pub use storage::{LocalStorage, Storage, WriteOptions, backup_path};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::filter::FilterId;

/// Elevation token obtained from an [`AuthorizationPrompt`].
///
/// Cached on the document and reused for later operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
	id: Uuid,
	principal: String,
}

impl Authorization {
	/// Creates a token granting access as `principal`.
	pub fn new(principal: impl Into<String>) -> Self {
		Self {
			id: Uuid::new_v4(),
			principal: principal.into(),
		}
	}

	/// Unique token id.
	pub fn id(&self) -> Uuid {
		self.id
	}

	/// The principal the token acts as.
	pub fn principal(&self) -> &str {
		&self.principal
	}
}

/// Presentation-layer service asking the user for elevated access.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
	/// Returns a token, or `None` if the user declined.
	async fn request(&self, path: &Path) -> Option<Authorization>;
}

/// Prompt that always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclinePrompt;

#[async_trait]
impl AuthorizationPrompt for DeclinePrompt {
	async fn request(&self, path: &Path) -> Option<Authorization> {
		tracing::debug!(path = %path.display(), "io.authorization_declined");
		None
	}
}

/// Which operation a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
	/// Reading the file into the buffer.
	Load,
	/// Writing the buffer to the file.
	Save,
}

/// Progress of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoState {
	/// Created, not yet started.
	Idle,
	/// Reading or writing.
	Running,
	/// Waiting for the authorization prompt.
	AwaitingAuthorization,
	/// Completed with [`IoResult::Success`].
	Succeeded,
	/// Completed with [`IoResult::Cancel`].
	Cancelled,
	/// Completed with [`IoResult::Failure`].
	Failed,
}

impl IoState {
	/// Returns true for the three terminal states.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Succeeded | Self::Cancelled | Self::Failed)
	}
}

/// Terminal outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoResult {
	/// The operation completed.
	Success,
	/// The user declined escalation or the caller cancelled.
	Cancel,
	/// The operation failed; see [`IoCompletion::error_message`].
	Failure,
}

/// Completion of a load or save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoCompletion {
	/// Terminal outcome.
	pub result: IoResult,
	/// Human readable message for failures.
	pub error_message: Option<String>,
	/// Content filter that was applied, if any.
	pub filter: Option<FilterId>,
}

impl IoCompletion {
	/// A successful completion.
	pub fn success(filter: Option<FilterId>) -> Self {
		Self {
			result: IoResult::Success,
			error_message: None,
			filter,
		}
	}

	/// A cancelled completion.
	pub fn cancel() -> Self {
		Self {
			result: IoResult::Cancel,
			error_message: None,
			filter: None,
		}
	}

	/// A failed completion carrying `message`.
	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			result: IoResult::Failure,
			error_message: Some(message.into()),
			filter: None,
		}
	}

	/// Returns true on [`IoResult::Success`].
	pub fn is_success(&self) -> bool {
		self.result == IoResult::Success
	}

	fn terminal_state(&self) -> IoState {
		match self.result {
			IoResult::Success => IoState::Succeeded,
			IoResult::Cancel => IoState::Cancelled,
			IoResult::Failure => IoState::Failed,
		}
	}
}

/// Handle to a running load or save.
///
/// Dropping the task does not cancel it; call [`IoTask::cancel`].
#[derive(Debug)]
pub struct IoTask {
	kind: IoKind,
	cancel: CancellationToken,
	state: watch::Receiver<IoState>,
	join: JoinHandle<IoCompletion>,
}

impl IoTask {
	/// The operation this task performs.
	pub fn kind(&self) -> IoKind {
		self.kind
	}

	/// Requests cancellation. The task completes with [`IoResult::Cancel`]
	/// unless it already passed its commit point.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Returns the current state.
	pub fn state(&self) -> IoState {
		*self.state.borrow()
	}

	/// Waits until the task reaches `target` or a terminal state.
	pub async fn wait_for(&mut self, target: IoState) -> IoState {
		let reached = self
			.state
			.wait_for(|state| *state == target || state.is_terminal())
			.await
			.map(|state| *state);
		reached.unwrap_or_else(|_| self.state())
	}

	/// Waits for the completion.
	pub async fn completion(self) -> IoCompletion {
		match self.join.await {
			Ok(completion) => completion,
			Err(e) => IoCompletion::failure(format!("I/O task did not finish: {e}")),
		}
	}
}

/// Per-operation state shared with the running task.
#[derive(Debug)]
struct IoOperation {
	kind: IoKind,
	cancel: CancellationToken,
	state: watch::Sender<IoState>,
}

impl IoOperation {
	fn new(kind: IoKind) -> (Self, watch::Receiver<IoState>) {
		let (state, rx) = watch::channel(IoState::Idle);
		let op = Self {
			kind,
			cancel: CancellationToken::new(),
			state,
		};
		(op, rx)
	}

	fn set_state(&self, next: IoState) {
		let prev = self.state.send_replace(next);
		tracing::trace!(kind = ?self.kind, from = ?prev, to = ?next, "io.state");
	}

	fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}
}
