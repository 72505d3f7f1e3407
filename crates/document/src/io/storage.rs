//! Filesystem seam for the load/save pipeline.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::Authorization;

/// Options for [`Storage::write`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
	/// Preserve the previous content as `<name>~` before replacing it.
	pub backup: bool,
}

/// Byte-level access to files.
///
/// Implementations must replace files atomically: a failed or abandoned
/// write leaves the previous content in place.
#[async_trait]
pub trait Storage: Send + Sync {
	/// Reads the whole file.
	async fn read(&self, path: &Path, auth: Option<&Authorization>) -> io::Result<Vec<u8>>;

	/// Replaces the file's content.
	async fn write(
		&self,
		path: &Path,
		bytes: Vec<u8>,
		options: WriteOptions,
		auth: Option<&Authorization>,
	) -> io::Result<()>;

	/// Returns true if the path (or for a missing file, its directory)
	/// exists and belongs to a different user.
	async fn owned_by_other(&self, path: &Path) -> bool;
}

/// Returns the backup path for `path` (`<name>~`).
pub fn backup_path(path: &Path) -> PathBuf {
	let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push("~");
	path.with_file_name(name)
}

/// [`Storage`] backed by the local filesystem.
///
/// The local backend cannot act on an [`Authorization`]; requests carrying
/// one are attempted with the process's own privileges.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[async_trait]
impl Storage for LocalStorage {
	async fn read(&self, path: &Path, auth: Option<&Authorization>) -> io::Result<Vec<u8>> {
		tracing::trace!(path = %path.display(), authorized = auth.is_some(), "storage.read");
		tokio::fs::read(path).await
	}

	async fn write(
		&self,
		path: &Path,
		bytes: Vec<u8>,
		options: WriteOptions,
		auth: Option<&Authorization>,
	) -> io::Result<()> {
		tracing::trace!(
			path = %path.display(),
			len = bytes.len(),
			backup = options.backup,
			authorized = auth.is_some(),
			"storage.write"
		);
		let path = path.to_path_buf();
		tokio::task::spawn_blocking(move || write_atomic(&path, &bytes, options))
			.await
			.map_err(io::Error::other)?
	}

	async fn owned_by_other(&self, path: &Path) -> bool {
		let meta = match tokio::fs::metadata(path).await {
			Ok(meta) => meta,
			Err(_) => match path.parent().filter(|p| !p.as_os_str().is_empty()) {
				Some(parent) => match tokio::fs::metadata(parent).await {
					Ok(meta) => meta,
					Err(_) => return false,
				},
				None => return false,
			},
		};
		foreign_owner(&meta)
	}
}

#[cfg(unix)]
fn foreign_owner(meta: &std::fs::Metadata) -> bool {
	use std::os::unix::fs::MetadataExt;
	meta.uid() != rustix::process::geteuid().as_raw()
}

#[cfg(not(unix))]
fn foreign_owner(_meta: &std::fs::Metadata) -> bool {
	false
}

/// Writes `bytes` to a temporary file next to `path` and renames it over `path`.
fn write_atomic(path: &Path, bytes: &[u8], options: WriteOptions) -> io::Result<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let existing = std::fs::metadata(path).ok();
	if existing.as_ref().is_some_and(|m| m.permissions().readonly()) {
		return Err(io::Error::new(
			io::ErrorKind::PermissionDenied,
			format!("{} is read-only", path.display()),
		));
	}

	let mut tmp = tempfile::Builder::new()
		.prefix(".folio-")
		.suffix(".tmp")
		.tempfile_in(dir)?;
	tmp.write_all(bytes)?;
	tmp.as_file().sync_all()?;

	if let Some(meta) = &existing {
		std::fs::set_permissions(tmp.path(), meta.permissions())?;
		if options.backup {
			std::fs::copy(path, backup_path(path))?;
		}
	}

	tmp.persist(path).map_err(|e| e.error)?;
	Ok(())
}
