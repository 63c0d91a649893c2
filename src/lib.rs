//! abfile - abstract file handles with concurrent recursive tree operations
//!
//! An [`AbstractFile`] is a path-addressed handle exposing queries
//! (existence, type, permissions, checksum) and recursive tree operations
//! (list, search, copy, remove, size). Tree operations fan out one child
//! operation per directory entry on a single-threaded compio runtime and
//! join them through [`fan_out`](fan_out::fan_out), which waits for every
//! child and reports the first error.
//!
//! # Module Organization
//!
//! - `address`: path normalization and resolution
//! - `backends`: the `FileSystem` trait and the local compio backend
//! - `fan_out`: fan-out/fan-in completion tracking
//! - `tree`: recursive listing and search
//! - `copy`, `remove`, `size`: the other recursive operations
//! - `cleanup`: exit-time removal registry and blocking remover
//! - `permissions`, `checksum`: single-entry helpers
//! - `file`: the `AbstractFile` facade
//! - `cli`: command-line arguments for the `abfile` binary

pub mod address;
pub mod backends;
pub mod checksum;
pub mod cleanup;
pub mod cli;
pub mod copy;
pub mod error;
pub mod fan_out;
pub mod file;
pub mod permissions;
pub mod remove;
pub mod size;
pub mod tree;

pub use address::PathAddress;
pub use backends::{FileSystem, LocalFileSystem};
pub use checksum::{ChecksumAlgorithm, DigestEncoding};
pub use cleanup::{CleanupGuard, CleanupRegistry};
pub use error::{FileError, Result};
pub use file::{AbstractFile, FileTree, TempFileOptions};
pub use tree::{DirectoryTree, TreeEntry};
