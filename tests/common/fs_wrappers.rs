//! `FileSystem` wrappers for observing and disturbing tree operations

#![allow(dead_code)]

use super::CallLog;
use abfile::backends::{EntryMetadata, FileSystem, LocalFileSystem};
use abfile::{FileError, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::Path;

/// Backend operations that get recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Metadata,
    SymlinkMetadata,
    ReadDir,
    CreateDir,
    CreateNewFile,
    RemoveFile,
    RemoveDir,
    Rename,
    SetMode,
    CopyFile,
    ReadChunks,
}

/// Records every call, then delegates to the local backend
#[derive(Debug, Default)]
pub struct RecordingFileSystem {
    inner: LocalFileSystem,
    pub log: CallLog,
}

impl RecordingFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, op: Op) -> usize {
        self.log.count(op)
    }

    /// Unlink plus rmdir calls
    pub fn delete_calls(&self) -> usize {
        self.count(Op::RemoveFile) + self.count(Op::RemoveDir)
    }
}

impl FileSystem for RecordingFileSystem {
    async fn metadata(&self, path: &Path) -> Result<EntryMetadata> {
        self.log.record(Op::Metadata, path);
        self.inner.metadata(path).await
    }

    async fn symlink_metadata(&self, path: &Path) -> Result<EntryMetadata> {
        self.log.record(Op::SymlinkMetadata, path);
        self.inner.symlink_metadata(path).await
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        self.log.record(Op::ReadDir, path);
        self.inner.read_dir(path).await
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        self.log.record(Op::CreateDir, path);
        self.inner.create_dir(path).await
    }

    async fn create_new_file(&self, path: &Path) -> Result<()> {
        self.log.record(Op::CreateNewFile, path);
        self.inner.create_new_file(path).await
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        self.log.record(Op::RemoveFile, path);
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        self.log.record(Op::RemoveDir, path);
        self.inner.remove_dir(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.log.record(Op::Rename, from);
        self.inner.rename(from, to).await
    }

    async fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        self.log.record(Op::SetMode, path);
        self.inner.set_mode(path, mode).await
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64> {
        self.log.record(Op::CopyFile, src);
        self.inner.copy_file(src, dst).await
    }

    async fn read_chunks(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64> {
        self.log.record(Op::ReadChunks, path);
        self.inner.read_chunks(path, sink).await
    }
}

/// Local backend that misbehaves for chosen entry names
///
/// - Names in `vanish_on_copy` are deleted from disk right before their
///   bytes are copied, as if removed by another process mid-operation.
/// - Names in `deny_remove` fail to unlink with a permission error.
#[derive(Debug, Default)]
pub struct FaultyFileSystem {
    inner: LocalFileSystem,
    vanish_on_copy: HashSet<OsString>,
    deny_remove: HashSet<OsString>,
    pub log: CallLog,
}

impl FaultyFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vanish_on_copy(mut self, name: &str) -> Self {
        self.vanish_on_copy.insert(OsString::from(name));
        self
    }

    pub fn deny_remove(mut self, name: &str) -> Self {
        self.deny_remove.insert(OsString::from(name));
        self
    }

    fn named_in(set: &HashSet<OsString>, path: &Path) -> bool {
        path.file_name().is_some_and(|name| set.contains(name))
    }
}

impl FileSystem for FaultyFileSystem {
    async fn metadata(&self, path: &Path) -> Result<EntryMetadata> {
        self.inner.metadata(path).await
    }

    async fn symlink_metadata(&self, path: &Path) -> Result<EntryMetadata> {
        self.inner.symlink_metadata(path).await
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        self.inner.read_dir(path).await
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        self.inner.create_dir(path).await
    }

    async fn create_new_file(&self, path: &Path) -> Result<()> {
        self.inner.create_new_file(path).await
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        self.log.record(Op::RemoveFile, path);
        if Self::named_in(&self.deny_remove, path) {
            return Err(FileError::io(
                path,
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        self.log.record(Op::RemoveDir, path);
        self.inner.remove_dir(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.rename(from, to).await
    }

    async fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        self.inner.set_mode(path, mode).await
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64> {
        self.log.record(Op::CopyFile, src);
        if Self::named_in(&self.vanish_on_copy, src) {
            std::fs::remove_file(src).map_err(|e| FileError::io(src, e))?;
        }
        self.inner.copy_file(src, dst).await
    }

    async fn read_chunks(&self, path: &Path, sink: &mut dyn FnMut(&[u8])) -> Result<u64> {
        self.inner.read_chunks(path, sink).await
    }
}
