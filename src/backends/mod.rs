//! Filesystem backends
//!
//! The tree operations never touch the OS directly. They go through the
//! [`FileSystem`] trait, which models the platform file-IO layer: stat,
//! readdir, mkdir, rmdir, unlink, rename, chmod, and byte streaming. The
//! local backend implements it with compio; tests wrap it to count calls or
//! inject failures.

pub mod local;

pub use local::LocalFileSystem;

use crate::error::Result;
use std::ffi::OsString;
use std::path::Path;
use std::time::SystemTime;

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (only reported by `symlink_metadata`)
    Symlink,
    /// Socket, fifo, device, or anything else
    Other,
}

/// The subset of entry metadata the tree operations need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Entry kind
    pub kind: EntryKind,
    /// Length in bytes
    pub len: u64,
    /// Permission bits (`0o7777` mask)
    pub mode: u32,
    /// Last modification time
    pub modified: SystemTime,
}

impl EntryMetadata {
    /// Whether the entry is a directory
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether the entry is a regular file
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Platform file-IO layer consumed by the tree operations
///
/// All paths are already resolved. Implementations map platform errors with
/// [`FileError::io`](crate::error::FileError::io) so that missing paths
/// surface as `NotFound`.
#[allow(async_fn_in_trait)]
pub trait FileSystem {
    /// Stat a path, following symbolic links
    async fn metadata(&self, path: &Path) -> Result<EntryMetadata>;

    /// Stat a path without following symbolic links
    async fn symlink_metadata(&self, path: &Path) -> Result<EntryMetadata>;

    /// Names of the entries of a directory, excluding `.` and `..`
    async fn read_dir(&self, path: &Path) -> Result<Vec<OsString>>;

    /// Create a single directory; the parent must exist
    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// Create an empty file, failing if anything already exists at `path`
    async fn create_new_file(&self, path: &Path) -> Result<()>;

    /// Unlink a file or symbolic link
    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove an empty directory
    async fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Rename `from` to `to`, replacing `to` if the platform allows it
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Apply permission bits
    async fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;

    /// Stream the bytes of `src` into a newly created (or truncated) `dst`
    ///
    /// Returns the number of bytes copied.
    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64>;

    /// Stream the bytes of `path` into `sink`, chunk by chunk
    ///
    /// Returns the number of bytes read.
    async fn read_chunks(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64>;

    /// Whether anything exists at `path` (following symbolic links)
    async fn exists(&self, path: &Path) -> bool {
        self.metadata(path).await.is_ok()
    }
}
