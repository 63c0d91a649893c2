//! The abstract file handle
//!
//! [`AbstractFile`] wraps a [`PathAddress`] and the filesystem backend that
//! performs its IO. Single-entry queries (existence, type, permissions,
//! checksum) go straight to the backend; tree operations (list, search,
//! copy, remove, size) run the concurrent recursive algorithms of the
//! [`tree`](crate::tree), [`copy`](crate::copy), [`remove`](crate::remove)
//! and [`size`](crate::size) modules.
//!
//! # Results
//!
//! Operations distinguish "nothing to do" from failure. A null address, or a
//! destination that already exists without `overwrite`, yields `Ok(false)`
//! (or `Ok(None)`). Errors are reserved for things that actually went wrong.
//!
//! # Usage
//!
//! ```rust,ignore
//! use abfile::{AbstractFile, CleanupRegistry, TempFileOptions};
//!
//! #[compio::main]
//! async fn main() -> abfile::Result<()> {
//!     let registry = CleanupRegistry::new();
//!     let _cleanup = registry.guard();
//!
//!     let dir = AbstractFile::new("out/nested/dir");
//!     dir.create_directory().await?;
//!     AbstractFile::new("data").copy_to("out/data", true).await?;
//!
//!     let temp = AbstractFile::create_temp_file(&TempFileOptions::new().prefix("job"), &registry).await?;
//!     println!("{} bytes under out/", AbstractFile::new("out").size().await?);
//!     Ok(())
//! }
//! ```

use crate::address::{entry_dir, PathAddress};
use crate::backends::{FileSystem, LocalFileSystem};
use crate::checksum::{ChecksumAlgorithm, DigestEncoding};
use crate::cleanup::CleanupRegistry;
use crate::copy::{copy_tree, same_entry};
use crate::error::{FileError, Result};
use crate::permissions::{format_octal, has_owner_access, parse_octal, with_owner_access, Access};
use crate::remove::remove_tree;
use crate::size::total_size;
use crate::tree::{self, DirectoryTree, TreeEntry};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Mode applied by [`AbstractFile::set_read_only`]
const READ_ONLY_MODE: u32 = 0o444;

/// Exclusive upper bound of the random part of temporary file names
const TEMP_NAME_RANGE: u64 = 1_000_000_000_000;

/// Naming and placement of temporary files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TempFileOptions {
    /// Text before the random number
    pub prefix: String,
    /// Text after the random number
    pub suffix: String,
    /// Directory to create the file in; `.` when unset
    pub directory: Option<PathBuf>,
}

impl TempFileOptions {
    /// Options with an empty prefix and suffix in the current directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefix
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the suffix
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the directory
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// A fresh candidate path: `<directory>/<prefix><12 digits><suffix>`
    fn candidate(&self) -> PathBuf {
        let number = rand::rng().random_range(0..TEMP_NAME_RANGE);
        let name = format!("{}{:012}{}", self.prefix, number, self.suffix);
        self.directory
            .as_deref()
            .unwrap_or(Path::new("."))
            .join(name)
    }
}

/// A directory listing made of file handles
#[derive(Debug, Clone)]
pub enum FileTree<F: FileSystem = LocalFileSystem> {
    /// Anything that is not a directory
    File(AbstractFile<F>),
    /// A directory and its children keyed by name
    Directory {
        /// The directory itself
        file: AbstractFile<F>,
        /// Its children
        children: BTreeMap<String, FileTree<F>>,
    },
}

impl<F: FileSystem> FileTree<F> {
    /// Handle of this node
    #[must_use]
    pub const fn file(&self) -> &AbstractFile<F> {
        match self {
            Self::File(file) | Self::Directory { file, .. } => file,
        }
    }

    /// Children of a directory node
    #[must_use]
    pub const fn children(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Directory { children, .. } => Some(children),
            Self::File(_) => None,
        }
    }
}

/// A file or directory addressed by path
///
/// Handles are cheap to clone; clones share the filesystem backend. The
/// address never changes: [`rename_to`](Self::rename_to) returns a new
/// handle for the new location.
#[derive(Debug)]
pub struct AbstractFile<F: FileSystem = LocalFileSystem> {
    address: PathAddress,
    fs: Arc<F>,
}

impl<F: FileSystem> Clone for AbstractFile<F> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            fs: Arc::clone(&self.fs),
        }
    }
}

impl AbstractFile<LocalFileSystem> {
    /// Handle for `path` on the local filesystem
    ///
    /// Relative paths resolve against the directory of the running
    /// executable. An empty path gives a null handle.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_filesystem(PathAddress::new(path), Arc::new(LocalFileSystem::new()))
    }

    /// Handle with no underlying path
    #[must_use]
    pub fn null() -> Self {
        Self::with_filesystem(PathAddress::null(), Arc::new(LocalFileSystem::new()))
    }

    /// Create an empty temporary file on the local filesystem
    ///
    /// See [`create_temp_file_in`](Self::create_temp_file_in).
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created.
    pub async fn create_temp_file(
        options: &TempFileOptions,
        registry: &CleanupRegistry,
    ) -> Result<Self> {
        Self::create_temp_file_in(
            Arc::new(LocalFileSystem::new()),
            entry_dir(),
            options,
            registry,
        )
        .await
    }
}

impl<F: FileSystem> AbstractFile<F> {
    /// Handle for `address` backed by `fs`
    #[must_use]
    pub const fn with_filesystem(address: PathAddress, fs: Arc<F>) -> Self {
        Self { address, fs }
    }

    /// Create an empty temporary file and schedule it for removal on exit
    ///
    /// Random names are drawn until one is free; that name is created
    /// immediately and registered with `registry`. `base` resolves a relative
    /// `options.directory`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created.
    pub async fn create_temp_file_in(
        fs: Arc<F>,
        base: impl AsRef<Path>,
        options: &TempFileOptions,
        registry: &CleanupRegistry,
    ) -> Result<Self> {
        let base = base.as_ref();
        loop {
            let address = PathAddress::with_base(options.candidate(), base);
            let file = Self::with_filesystem(address, Arc::clone(&fs));
            let path = file.resolved()?;
            if fs.exists(path).await {
                debug!("Temporary name taken, retrying: {}", path.display());
                continue;
            }

            fs.create_new_file(path).await?;
            file.remove_on_exit(registry, true);
            info!("Created temporary file: {}", path.display());
            return Ok(file);
        }
    }

    /// The address of this handle
    #[must_use]
    pub const fn address(&self) -> &PathAddress {
        &self.address
    }

    /// The filesystem backend
    #[must_use]
    pub const fn filesystem(&self) -> &Arc<F> {
        &self.fs
    }

    /// Handle for another address sharing this backend
    fn at(&self, address: PathAddress) -> Self {
        Self::with_filesystem(address, Arc::clone(&self.fs))
    }

    fn resolved(&self) -> Result<&Path> {
        self.address.resolved().ok_or(FileError::NullPath)
    }

    /// Whether the handle has no underlying path
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.address.is_null()
    }

    /// Last segment of the path
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.address.file_name()
    }

    /// The parent path as the caller wrote it
    #[must_use]
    pub fn parent(&self) -> Option<String> {
        self.address
            .parent()
            .and_then(|parent| parent.raw().map(|raw| raw.display().to_string()))
    }

    /// Handle for the parent
    #[must_use]
    pub fn parent_file(&self) -> Option<Self> {
        self.address.parent().map(|parent| self.at(parent))
    }

    /// The resolved path IO is performed on
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.address.resolved()
    }

    /// The path as the caller wrote it
    #[must_use]
    pub fn raw_path(&self) -> Option<&Path> {
        self.address.raw()
    }

    /// Fully absolute form of the path
    #[must_use]
    pub fn absolute_path(&self) -> Option<PathBuf> {
        self.address.absolute()
    }

    /// Handle for the absolute form of the path
    #[must_use]
    pub fn absolute_file(&self) -> Option<Self> {
        self.absolute_path()
            .map(|path| self.at(self.address.sibling(path)))
    }

    /// Whether anything exists at the path
    pub async fn exists(&self) -> bool {
        match self.address.resolved() {
            Some(path) => self.fs.exists(path).await,
            None => false,
        }
    }

    /// Whether the path is a regular file
    pub async fn is_file(&self) -> bool {
        match self.address.resolved() {
            Some(path) => self.fs.metadata(path).await.is_ok_and(|m| m.is_file()),
            None => false,
        }
    }

    /// Whether the path is a directory
    pub async fn is_directory(&self) -> bool {
        match self.address.resolved() {
            Some(path) => self.fs.metadata(path).await.is_ok_and(|m| m.is_dir()),
            None => false,
        }
    }

    /// Whether the path is hidden
    ///
    /// # Errors
    ///
    /// Always fails with `NotImplemented`.
    pub fn is_hidden(&self) -> Result<bool> {
        Err(FileError::NotImplemented("is_hidden"))
    }

    /// Last modification time
    ///
    /// # Errors
    ///
    /// Fails with `NullPath` for a null handle, or if the path cannot be
    /// probed.
    pub async fn last_modified(&self) -> Result<SystemTime> {
        let path = self.resolved()?;
        Ok(self.fs.metadata(path).await?.modified)
    }

    /// Permission bits as a three-digit octal string, e.g. `"644"`
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be probed.
    pub async fn permissions(&self) -> Result<Option<String>> {
        let Some(path) = self.address.resolved() else {
            return Ok(None);
        };
        let mode = self.fs.metadata(path).await?.mode;
        Ok(Some(format_octal(mode)))
    }

    /// Apply a full octal permission string such as `"755"`
    ///
    /// Returns `false` for a null handle.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidPermissions` for a malformed string, or if the
    /// mode cannot be applied.
    pub async fn set_permissions(&self, permissions: &str) -> Result<bool> {
        let mode = parse_octal(permissions)?;
        let Some(path) = self.address.resolved() else {
            return Ok(false);
        };
        self.fs.set_mode(path, mode).await?;
        info!("Set permissions of {} to {}", path.display(), permissions);
        Ok(true)
    }

    /// Make the path read-only for everyone (`444`)
    ///
    /// # Errors
    ///
    /// Fails if the mode cannot be applied.
    pub async fn set_read_only(&self) -> Result<bool> {
        let Some(path) = self.address.resolved() else {
            return Ok(false);
        };
        self.fs.set_mode(path, READ_ONLY_MODE).await?;
        Ok(true)
    }

    async fn has_access(&self, access: Access) -> Result<bool> {
        access.check_supported()?;
        let Some(path) = self.address.resolved() else {
            return Ok(false);
        };
        let mode = self.fs.metadata(path).await?.mode;
        Ok(has_owner_access(mode, access))
    }

    async fn set_access(&self, access: Access, enabled: bool) -> Result<bool> {
        access.check_supported()?;
        let Some(path) = self.address.resolved() else {
            return Ok(false);
        };
        let mode = self.fs.metadata(path).await?.mode;
        if let Some(updated) = with_owner_access(mode, access, enabled) {
            self.fs.set_mode(path, updated).await?;
            debug!("Changed mode of {} to {:o}", path.display(), updated);
        }
        Ok(true)
    }

    /// Whether the owner may read
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be probed.
    pub async fn can_read(&self) -> Result<bool> {
        self.has_access(Access::Read).await
    }

    /// Whether the owner may write
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be probed.
    pub async fn can_write(&self) -> Result<bool> {
        self.has_access(Access::Write).await
    }

    /// Whether the owner may execute
    ///
    /// # Errors
    ///
    /// Fails with `PlatformUnsupported` outside unix, or if the path cannot
    /// be probed.
    pub async fn can_execute(&self) -> Result<bool> {
        self.has_access(Access::Execute).await
    }

    /// Grant or revoke owner read permission
    ///
    /// # Errors
    ///
    /// Fails if the mode cannot be read or applied.
    pub async fn set_readable(&self, readable: bool) -> Result<bool> {
        self.set_access(Access::Read, readable).await
    }

    /// Grant or revoke owner write permission
    ///
    /// # Errors
    ///
    /// Fails if the mode cannot be read or applied.
    pub async fn set_writable(&self, writable: bool) -> Result<bool> {
        self.set_access(Access::Write, writable).await
    }

    /// Grant or revoke owner execute permission
    ///
    /// # Errors
    ///
    /// Fails with `PlatformUnsupported` outside unix, or if the mode cannot
    /// be read or applied.
    pub async fn set_executable(&self, executable: bool) -> Result<bool> {
        self.set_access(Access::Execute, executable).await
    }

    /// Digest of the file contents
    ///
    /// Returns `None` for a null handle.
    ///
    /// # Errors
    ///
    /// Fails with `NotAFile` for a directory, or if the file cannot be read.
    pub async fn checksum(
        &self,
        algorithm: ChecksumAlgorithm,
        encoding: DigestEncoding,
    ) -> Result<Option<String>> {
        let Some(path) = self.address.resolved() else {
            return Ok(None);
        };
        if self.fs.metadata(path).await?.is_dir() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }

        let mut hasher = algorithm.hasher();
        let bytes = self
            .fs
            .read_chunks(path, &mut |chunk: &[u8]| hasher.update(chunk))
            .await?;
        debug!("Hashed {} bytes of {} with {}", bytes, path.display(), algorithm);
        Ok(Some(encoding.encode(&hasher.finish())))
    }

    /// Whether an entry named `name` exists anywhere below this directory
    ///
    /// # Errors
    ///
    /// Fails exactly when [`search`](Self::search) fails.
    pub async fn contains(&self, name: &str) -> Result<bool> {
        Ok(!self.search(name).await?.is_empty())
    }

    /// Paths of every entry named `name` below this directory
    ///
    /// A matched directory is not searched further. Paths are built from the
    /// path as the caller wrote it. A null handle finds nothing.
    ///
    /// # Errors
    ///
    /// Fails with `NotADirectory` if this is a file, or with the first error
    /// the walk hit.
    pub async fn search(&self, name: &str) -> Result<Vec<PathBuf>> {
        let (Some(path), Some(raw)) = (self.address.resolved(), self.address.raw()) else {
            return Ok(Vec::new());
        };
        info!("Searching {} for {}", path.display(), name);
        tree::search(self.fs.as_ref(), path, raw, name).await
    }

    /// Recursive listing of this directory
    ///
    /// `filter` receives each entry's name and path; entries it rejects are
    /// left out together with everything below them.
    ///
    /// # Errors
    ///
    /// Fails with `NullPath` for a null handle, `NotADirectory` for a file,
    /// or with the first error the walk hit.
    pub async fn list(
        &self,
        filter: Option<&tree::EntryFilter<'_>>,
    ) -> Result<DirectoryTree> {
        let path = self.resolved()?;
        let raw = self.address.raw().ok_or(FileError::NullPath)?;
        info!("Listing {}", path.display());
        tree::walk(self.fs.as_ref(), path, raw, filter).await
    }

    /// Recursive listing as file handles sharing this handle's backend
    ///
    /// # Errors
    ///
    /// Fails exactly when [`list`](Self::list) fails.
    pub async fn list_files(
        &self,
        filter: Option<&tree::EntryFilter<'_>>,
    ) -> Result<BTreeMap<String, FileTree<F>>> {
        let listing = self.list(filter).await?;
        Ok(self.to_file_tree(listing))
    }

    fn to_file_tree(&self, listing: DirectoryTree) -> BTreeMap<String, FileTree<F>> {
        listing
            .into_iter()
            .map(|(name, entry)| {
                let node = match entry {
                    TreeEntry::File { path, .. } => {
                        FileTree::File(self.at(self.address.sibling(path)))
                    }
                    TreeEntry::Directory { path, children, .. } => FileTree::Directory {
                        file: self.at(self.address.sibling(path)),
                        children: self.to_file_tree(children),
                    },
                };
                (name, node)
            })
            .collect()
    }

    /// Copy this file or directory to `destination`
    ///
    /// A relative destination resolves against the same base as this handle.
    /// Returns `false` for a null handle or destination, and when the
    /// destination exists and `overwrite` is not set. With `overwrite` an
    /// existing destination is removed first.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if this path does not exist, with
    /// `OverlappingPaths` if the destination is nested inside this path or
    /// contains it, or with the first error raised while copying. Entries
    /// copied before a failure remain. Copying onto this same path is a
    /// no-op returning `false`.
    pub async fn copy_to(&self, destination: impl AsRef<Path>, overwrite: bool) -> Result<bool> {
        let target = self.address.sibling(destination);
        let (Some(src), Some(dst)) = (self.address.resolved(), target.resolved()) else {
            return Ok(false);
        };

        info!("Copying {} -> {}", src.display(), dst.display());
        let copied = copy_tree(
            self.fs.as_ref(),
            src.to_path_buf(),
            dst.to_path_buf(),
            overwrite,
        )
        .await?;
        if copied {
            info!("Copy completed: {}", dst.display());
        }
        Ok(copied)
    }

    /// Create this directory and any missing ancestors
    ///
    /// Returns `false` for a null handle or when the path already exists.
    ///
    /// # Errors
    ///
    /// Fails if any level cannot be created.
    pub async fn create_directory(&self) -> Result<bool> {
        if self.is_null() || self.exists().await {
            return Ok(false);
        }
        create_with_ancestors(self.fs.as_ref(), self.address.clone()).await?;
        info!("Created directory: {}", self.address);
        Ok(true)
    }

    /// Create an empty file
    ///
    /// Returns `false` for a null handle or when the path already exists.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created.
    pub async fn create_new_file(&self) -> Result<bool> {
        let Some(path) = self.address.resolved() else {
            return Ok(false);
        };
        if self.fs.exists(path).await {
            return Ok(false);
        }
        self.fs.create_new_file(path).await?;
        debug!("Created file: {}", path.display());
        Ok(true)
    }

    /// Move this entry to `destination`
    ///
    /// A relative destination resolves against the same base as this handle.
    /// Returns a handle for the new location, or `None` for a null handle or
    /// destination, or when the destination exists and `overwrite` is not
    /// set. Renaming onto the same location returns a copy of this handle.
    /// Otherwise this handle keeps pointing at the old location.
    ///
    /// # Errors
    ///
    /// Fails with `OverlappingPaths` when one path lies inside the other, or
    /// if the rename, or the removal of an existing destination, fails.
    pub async fn rename_to(
        &self,
        destination: impl AsRef<Path>,
        overwrite: bool,
    ) -> Result<Option<Self>> {
        let target = self.address.sibling(destination);
        let (Some(from), Some(to)) = (self.address.resolved(), target.resolved()) else {
            return Ok(None);
        };

        if same_entry(from, to)? {
            self.fs.metadata(from).await?;
            return Ok(Some(self.clone()));
        }

        if self.fs.exists(to).await {
            if !overwrite {
                return Ok(None);
            }
            remove_tree(self.fs.as_ref(), to.to_path_buf()).await?;
        }

        self.fs.rename(from, to).await?;
        info!("Renamed {} -> {}", from.display(), to.display());
        Ok(Some(self.at(target)))
    }

    /// Remove this file or directory, recursively
    ///
    /// Returns `false` for a null handle.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` if nothing exists at the path, or with the first
    /// error raised while removing. Siblings of a failing entry are still
    /// removed.
    pub async fn remove(&self) -> Result<bool> {
        let Some(path) = self.address.resolved() else {
            return Ok(false);
        };
        info!("Removing {}", path.display());
        remove_tree(self.fs.as_ref(), path.to_path_buf()).await?;
        Ok(true)
    }

    /// Schedule (or cancel) removal of this path when `registry` is drained
    ///
    /// Returns `false` for a null handle or when nothing changed.
    pub fn remove_on_exit(&self, registry: &CleanupRegistry, enabled: bool) -> bool {
        let Some(path) = self.absolute_path().or_else(|| self.path().map(Path::to_path_buf)) else {
            return false;
        };
        if enabled {
            registry.register(path)
        } else {
            registry.unregister(&path)
        }
    }

    /// Total size in bytes of this file or everything below this directory
    ///
    /// A null handle is 0.
    ///
    /// # Errors
    ///
    /// Fails with the first error raised anywhere in the tree.
    pub async fn size(&self) -> Result<u64> {
        match self.address.resolved() {
            Some(path) => total_size(self.fs.as_ref(), path.to_path_buf()).await,
            None => Ok(0),
        }
    }
}

/// Create `address` after creating any missing ancestor, nearest-root first
fn create_with_ancestors<F: FileSystem>(
    fs: &F,
    address: PathAddress,
) -> LocalBoxFuture<'_, Result<()>> {
    async move {
        let path = address.resolved().ok_or(FileError::NullPath)?;
        if let Some(parent) = address.parent() {
            let parent_exists = match parent.resolved() {
                Some(parent_path) => fs.exists(parent_path).await,
                None => true,
            };
            if !parent_exists {
                create_with_ancestors(fs, parent).await?;
            }
        }
        fs.create_dir(path).await?;
        debug!("Created directory level: {}", path.display());
        Ok(())
    }
    .boxed_local()
}

impl<F: FileSystem> std::fmt::Display for AbstractFile<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.address, f)
    }
}

impl<F: FileSystem> PartialEq for AbstractFile<F> {
    fn eq(&self, other: &Self) -> bool {
        self.absolute_path() == other.absolute_path()
    }
}

impl<F: FileSystem> Eq for AbstractFile<F> {}
