//! Bounded-time filesystem operations.
//!
//! Every call runs on tokio's blocking pool, admitted through a semaphore so
//! at most `blocking_workers` syscalls are in flight, and is bounded by a
//! timeout. A job that times out keeps its permit until the syscall returns,
//! so a wedged disk cannot oversubscribe the pool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use walkdir::WalkDir;

use crate::Result;
use crate::archive::errors::ArchiveError;
use crate::constants::{BLOCKING_WORKERS, DELETE_ALL, FILE_TIMEOUT};

/// Log label for a file name: the upper-cased text after the last `.`, or `UNKNOWN`.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}

fn io_failed(operation: &'static str, path: &Path, source: io::Error) -> ArchiveError {
    if source.kind() == io::ErrorKind::NotFound {
        ArchiveError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        ArchiveError::IoFailed {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Remove `root` and everything under it, children before parents.
///
/// `remove` is called once per entry with whether the entry is a directory.
/// Failures are collected and the walk continues.
pub(crate) fn remove_tree_with<F>(
    root: &Path,
    mut remove: F,
) -> std::result::Result<usize, ArchiveError>
where
    F: FnMut(&Path, bool) -> io::Result<()>,
{
    let mut attempted = 0;
    let mut failed = Vec::new();
    let mut first_error: Option<io::Error> = None;

    for entry in WalkDir::new(root).contents_first(true) {
        attempted += 1;
        let outcome = match entry {
            Ok(entry) => {
                let is_dir = entry.file_type().is_dir();
                remove(entry.path(), is_dir).map_err(|e| (entry.path().to_path_buf(), e))
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                Err((path, io::Error::other(e.to_string())))
            }
        };
        if let Err((path, err)) = outcome {
            tracing::error!(path = %path.display(), error = %err, "Failed to delete archive entry");
            failed.push(path);
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        None => Ok(attempted),
        Some(source) => Err(ArchiveError::DeleteIncomplete {
            path: root.to_path_buf(),
            failed,
            attempted,
            source,
        }),
    }
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

/// Durable per-user file storage.
#[derive(Debug, Clone)]
pub struct FileArchiveStore {
    workers: Arc<Semaphore>,
    timeout: Duration,
}

impl Default for FileArchiveStore {
    fn default() -> Self {
        Self::new(BLOCKING_WORKERS, FILE_TIMEOUT)
    }
}

impl FileArchiveStore {
    /// A store allowing `blocking_workers` concurrent syscalls, each bounded by `timeout`.
    pub fn new(blocking_workers: usize, timeout: Duration) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(blocking_workers.max(1))),
            timeout,
        }
    }

    /// Run `job` on the blocking pool under the store's bound.
    async fn run<T, F>(&self, operation: &'static str, path: &Path, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> std::result::Result<T, ArchiveError> + Send + 'static,
    {
        let workers = Arc::clone(&self.workers);
        let dispatched = async move {
            let permit = workers
                .acquire_owned()
                .await
                .map_err(|e| ArchiveError::WorkerFailed {
                    operation,
                    reason: e.to_string(),
                })?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job()
            })
            .await
            .map_err(|e| ArchiveError::WorkerFailed {
                operation,
                reason: e.to_string(),
            })?
        };

        let outcome = match tokio::time::timeout(self.timeout, dispatched).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ArchiveError::TimedOut {
                operation,
                path: path.to_path_buf(),
                after: self.timeout,
            }),
        };

        if let Err(err) = &outcome {
            if !err.is_not_found() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                tracing::error!(
                    operation,
                    path = %path.display(),
                    extension = %file_extension(&name),
                    error = %err,
                    "Archive operation failed"
                );
            }
        }
        outcome.map_err(Into::into)
    }

    /// Create `dir` and its parents if absent.
    pub async fn ensure_directory(&self, dir: &Path) -> Result<()> {
        let target = dir.to_path_buf();
        self.run("ensure_directory", dir, move || {
            fs::create_dir_all(&target).map_err(|e| io_failed("ensure_directory", &target, e))
        })
        .await
    }

    /// Create or truncate `dir/name` with `content`. Returns the full path.
    pub async fn write_text(&self, dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
        self.write_bytes_as("write_text", dir, name, content.as_bytes().to_vec())
            .await
    }

    /// Create or truncate `dir/name` with `content`. Returns the full path.
    pub async fn write_bytes(&self, dir: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
        self.write_bytes_as("write_bytes", dir, name, content.to_vec())
            .await
    }

    async fn write_bytes_as(
        &self,
        operation: &'static str,
        dir: &Path,
        name: &str,
        content: Vec<u8>,
    ) -> Result<PathBuf> {
        let dir = dir.to_path_buf();
        let full = dir.join(name);
        let target = full.clone();
        self.run(operation, &full, move || {
            fs::create_dir_all(&dir).map_err(|e| io_failed(operation, &dir, e))?;
            fs::write(&target, &content).map_err(|e| io_failed(operation, &target, e))
        })
        .await?;
        tracing::info!(operation, path = %full.display(), "Archive file written");
        Ok(full)
    }

    /// Full UTF-8 content of `dir/name`.
    pub async fn read_text(&self, dir: &Path, name: &str) -> Result<String> {
        let full = dir.join(name);
        let target = full.clone();
        self.run("read_text", &full, move || {
            fs::read_to_string(&target).map_err(|e| io_failed("read_text", &target, e))
        })
        .await
    }

    /// Full content of `dir/name`.
    pub async fn read_bytes(&self, dir: &Path, name: &str) -> Result<Vec<u8>> {
        let full = dir.join(name);
        let target = full.clone();
        self.run("read_bytes", &full, move || {
            fs::read(&target).map_err(|e| io_failed("read_bytes", &target, e))
        })
        .await
    }

    /// Delete `dir/name`, or with `name == "*"` everything under `dir` including `dir`.
    ///
    /// Returns the number of entries removed.
    pub async fn delete(&self, dir: &Path, name: &str) -> Result<usize> {
        if name == DELETE_ALL {
            let root = dir.to_path_buf();
            let removed = self
                .run("delete_all", dir, move || {
                    if !root.exists() {
                        return Err(ArchiveError::NotFound { path: root });
                    }
                    remove_tree_with(&root, remove_entry)
                })
                .await?;
            tracing::info!(path = %dir.display(), entries = removed, "Archive tree deleted");
            return Ok(removed);
        }

        let full = dir.join(name);
        let target = full.clone();
        self.run("delete", &full, move || {
            fs::remove_file(&target).map_err(|e| io_failed("delete", &target, e))
        })
        .await?;
        tracing::info!(path = %full.display(), "Archive file deleted");
        Ok(1)
    }

    /// Atomically move `from` to `to`, creating `to`'s parent.
    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let source = from.to_path_buf();
        let dest = to.to_path_buf();
        self.run("rename", from, move || {
            if !source.exists() {
                return Err(ArchiveError::InvalidArgument {
                    reason: format!("{} does not exist", source.display()),
                });
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| io_failed("rename", parent, e))?;
            }
            fs::rename(&source, &dest).map_err(|e| ArchiveError::IoFailed {
                operation: "rename",
                path: source.clone(),
                source: e,
            })
        })
        .await?;
        tracing::info!(from = %from.display(), to = %to.display(), "Archive renamed");
        Ok(())
    }
}
