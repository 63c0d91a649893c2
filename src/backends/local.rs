//! Local filesystem backend implementation
//!
//! This module provides the local filesystem backend on top of compio.
//! Metadata, directory creation/removal, and file streaming use compio's
//! completion-based operations; `read_dir`, `rename`, and `chmod` run on
//! compio's blocking pool because there is no completion-based op for them.

use super::{EntryKind, EntryMetadata, FileSystem};
use crate::error::{FileError, Result};
use compio::fs::{File, OpenOptions};
use compio::io::{AsyncReadAt, AsyncWriteAtExt};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

/// Default I/O buffer size (in bytes) used for chunked read/write operations
const BUFFER_SIZE: usize = 64 * 1024;

/// Local filesystem backend using compio
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    buffer_size: usize,
}

impl LocalFileSystem {
    /// Create a new `LocalFileSystem` with the default buffer size
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
        }
    }

    /// Create a new `LocalFileSystem` streaming with `buffer_size` byte chunks
    ///
    /// A zero size falls back to the default.
    #[must_use]
    pub const fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: if buffer_size == 0 {
                BUFFER_SIZE
            } else {
                buffer_size
            },
        }
    }

    /// Chunk size used for streaming
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_metadata(metadata: &compio::fs::Metadata) -> EntryMetadata {
    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_symlink() {
        EntryKind::Symlink
    } else {
        EntryKind::Other
    };

    EntryMetadata {
        kind,
        len: metadata.len(),
        mode: mode_bits(metadata),
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    }
}

#[cfg(unix)]
fn mode_bits(metadata: &compio::fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(metadata: &compio::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

/// Run a blocking filesystem call on compio's blocking pool
async fn blocking<T, F>(path: &Path, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> std::io::Result<T> + Send + 'static,
{
    let owned = path.to_path_buf();
    compio::runtime::spawn_blocking(move || call(owned))
        .await
        .map_err(|e| FileError::Task(format!("spawn_blocking failed: {e:?}")))?
        .map_err(|e| FileError::io(path, e))
}

impl FileSystem for LocalFileSystem {
    async fn metadata(&self, path: &Path) -> Result<EntryMetadata> {
        let metadata = compio::fs::metadata(path)
            .await
            .map_err(|e| FileError::io(path, e))?;
        Ok(entry_metadata(&metadata))
    }

    async fn symlink_metadata(&self, path: &Path) -> Result<EntryMetadata> {
        let metadata = compio::fs::symlink_metadata(path)
            .await
            .map_err(|e| FileError::io(path, e))?;
        Ok(entry_metadata(&metadata))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        // No io_uring GETDENTS64, so listing stays on the blocking pool
        blocking(path, |dir| {
            std::fs::read_dir(dir)?
                .map(|entry| entry.map(|e| e.file_name()))
                .collect()
        })
        .await
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        compio::fs::create_dir(path)
            .await
            .map_err(|e| FileError::io(path, e))
    }

    async fn create_new_file(&self, path: &Path) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| FileError::io(path, e))?;
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        compio::fs::remove_file(path)
            .await
            .map_err(|e| FileError::io(path, e))
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        compio::fs::remove_dir(path)
            .await
            .map_err(|e| FileError::io(path, e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let to = to.to_path_buf();
        blocking(from, move |from| std::fs::rename(from, to)).await
    }

    #[cfg(unix)]
    async fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        blocking(path, move |p| {
            std::fs::set_permissions(p, std::fs::Permissions::from_mode(mode))
        })
        .await
    }

    #[cfg(not(unix))]
    async fn set_mode(&self, _path: &Path, _mode: u32) -> Result<()> {
        Err(FileError::PlatformUnsupported("setting permission bits"))
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64> {
        let src_file = File::open(src).await.map_err(|e| FileError::io(src, e))?;
        let mut dst_file = File::create(dst).await.map_err(|e| FileError::io(dst, e))?;

        // read_at/write_all_at take ownership of the buffer and hand it back,
        // so one allocation serves the whole copy
        let mut buffer = vec![0u8; self.buffer_size];
        let mut offset = 0u64;

        loop {
            let read_result = src_file.read_at(buffer, offset).await;
            let bytes_read = read_result.0.map_err(|e| FileError::io(src, e))?;
            buffer = read_result.1;

            if bytes_read == 0 {
                break;
            }

            buffer.truncate(bytes_read);
            let write_result = dst_file.write_all_at(buffer, offset).await;
            write_result.0.map_err(|e| FileError::io(dst, e))?;

            buffer = write_result.1;
            buffer.resize(self.buffer_size, 0);
            offset += bytes_read as u64;
            trace!("Copied chunk of {} bytes, total: {}", bytes_read, offset);
        }

        debug!(
            "Copied {} bytes from {} to {}",
            offset,
            src.display(),
            dst.display()
        );
        Ok(offset)
    }

    async fn read_chunks(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64> {
        let file = File::open(path).await.map_err(|e| FileError::io(path, e))?;
        let mut buffer = vec![0u8; self.buffer_size];
        let mut offset = 0u64;

        loop {
            let read_result = file.read_at(buffer, offset).await;
            let bytes_read = read_result.0.map_err(|e| FileError::io(path, e))?;
            buffer = read_result.1;

            if bytes_read == 0 {
                break;
            }

            sink(&buffer[..bytes_read]);
            buffer.resize(self.buffer_size, 0);
            offset += bytes_read as u64;
        }

        Ok(offset)
    }
}
