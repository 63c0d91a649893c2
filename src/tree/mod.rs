//! Recursive directory listing and search
//!
//! This module provides the tree walker behind `list`, `list_files`,
//! `search`, and `contains`.
//!
//! # Module Organization
//!
//! - `types`: `TreeEntry`, `DirectoryTree`, and the entry filter signature
//! - `walker`: the concurrent walk and the name search built on it

mod types;
mod walker;

pub use types::{count_entries, flatten, DirectoryTree, EntryFilter, TreeEntry};
pub use walker::{search, walk};
