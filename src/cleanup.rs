//! Exit-time cleanup
//!
//! Temporary files and anything else marked "remove on exit" are recorded in
//! a [`CleanupRegistry`] owned by the application entry point. The registry
//! is drained synchronously on shutdown, usually through the
//! [`CleanupGuard`] returned by [`CleanupRegistry::guard`].

use crate::error::{FileError, Result};
use dashmap::DashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Remove `path` and everything below it, blocking the calling thread
///
/// Same depth-first order as the async remover: children first, then the
/// directory. Symbolic links are unlinked, not followed. Returns `false` if
/// nothing exists at `path`.
///
/// Only meant for shutdown, where the runtime can no longer drive futures.
///
/// # Errors
///
/// Returns the first IO error encountered. Siblings of a failing entry are
/// still attempted.
pub fn remove_blocking(path: &Path) -> Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FileError::io(path, e)),
    };

    if !metadata.is_dir() {
        std::fs::remove_file(path).map_err(|e| FileError::io(path, e))?;
        return Ok(true);
    }

    let mut first_error = None;
    for entry in std::fs::read_dir(path).map_err(|e| FileError::io(path, e))? {
        let outcome = entry
            .map_err(|e| FileError::io(path, e))
            .and_then(|entry| remove_blocking(&entry.path()));
        if let Err(error) = outcome {
            first_error.get_or_insert(error);
        }
    }
    if let Some(error) = first_error {
        return Err(error);
    }

    std::fs::remove_dir(path).map_err(|e| FileError::io(path, e))?;
    Ok(true)
}

/// Paths to remove when the process shuts down
///
/// Cloning is cheap; clones share the same set. Registration is idempotent:
/// a path is held at most once however often it is registered.
#[derive(Debug, Clone, Default)]
pub struct CleanupRegistry {
    pending: Arc<DashSet<PathBuf>>,
}

impl CleanupRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `path` for removal; returns `false` if it was already scheduled
    pub fn register(&self, path: impl Into<PathBuf>) -> bool {
        self.pending.insert(path.into())
    }

    /// Cancel a scheduled removal; returns `false` if `path` was not scheduled
    pub fn unregister(&self, path: &Path) -> bool {
        self.pending.remove(path).is_some()
    }

    /// Whether `path` is scheduled for removal
    #[must_use]
    pub fn is_registered(&self, path: &Path) -> bool {
        self.pending.contains(path)
    }

    /// Number of scheduled removals
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is scheduled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove every scheduled path now
    ///
    /// Failures are logged and swallowed. Returns the number of paths that
    /// were actually removed.
    pub fn drain(&self) -> usize {
        let paths: Vec<PathBuf> = self.pending.iter().map(|p| p.key().clone()).collect();
        let mut removed = 0;
        for path in paths {
            self.pending.remove(&path);
            match remove_blocking(&path) {
                Ok(true) => {
                    debug!("Removed on exit: {}", path.display());
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to remove {} on exit: {}", path.display(), e),
            }
        }
        removed
    }

    /// Guard that drains the registry when dropped
    #[must_use]
    pub fn guard(&self) -> CleanupGuard {
        CleanupGuard {
            registry: self.clone(),
        }
    }
}

/// Drains a [`CleanupRegistry`] when dropped
#[derive(Debug)]
pub struct CleanupGuard {
    registry: CleanupRegistry,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.registry.drain();
    }
}
