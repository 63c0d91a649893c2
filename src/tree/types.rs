//! Core types for directory listings
//!
//! - `TreeEntry`: a file leaf or a directory with its children
//! - `DirectoryTree`: the children of one directory, keyed by name

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Children of one directory keyed by entry name
///
/// Names are unique within a directory. The map is ordered only so output is
/// deterministic; traversal itself gives no ordering guarantee.
pub type DirectoryTree = BTreeMap<String, TreeEntry>;

/// Entry filter: receives the entry name and its logical path
///
/// Returning `false` excludes the entry from both the listing and any
/// further descent.
pub type EntryFilter<'a> = dyn Fn(&str, &Path) -> bool + 'a;

/// One node of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    /// A leaf: anything that is not a directory
    File {
        /// Entry name
        name: String,
        /// Logical path (the walk root as the caller wrote it, joined with names)
        path: PathBuf,
    },
    /// A directory and everything below it
    Directory {
        /// Entry name
        name: String,
        /// Logical path
        path: PathBuf,
        /// Children keyed by name
        children: DirectoryTree,
    },
}

impl TreeEntry {
    /// Entry name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name, .. } => name,
        }
    }

    /// Logical path of the entry
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File { path, .. } | Self::Directory { path, .. } => path,
        }
    }

    /// Whether the entry is a directory
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Children of a directory entry
    #[must_use]
    pub const fn children(&self) -> Option<&DirectoryTree> {
        match self {
            Self::Directory { children, .. } => Some(children),
            Self::File { .. } => None,
        }
    }
}

/// Every path in a tree, depth-first, directories before their children
#[must_use]
pub fn flatten(tree: &DirectoryTree) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    flatten_into(tree, &mut paths);
    paths
}

fn flatten_into(tree: &DirectoryTree, paths: &mut Vec<PathBuf>) {
    for entry in tree.values() {
        paths.push(entry.path().to_path_buf());
        if let Some(children) = entry.children() {
            flatten_into(children, paths);
        }
    }
}

/// Number of entries in a tree, counting every level
#[must_use]
pub fn count_entries(tree: &DirectoryTree) -> usize {
    tree.values()
        .map(|entry| 1 + entry.children().map_or(0, count_entries))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DirectoryTree {
        let mut inner = DirectoryTree::new();
        inner.insert(
            "leaf.txt".to_string(),
            TreeEntry::File {
                name: "leaf.txt".to_string(),
                path: PathBuf::from("root/dir/leaf.txt"),
            },
        );

        let mut tree = DirectoryTree::new();
        tree.insert(
            "dir".to_string(),
            TreeEntry::Directory {
                name: "dir".to_string(),
                path: PathBuf::from("root/dir"),
                children: inner,
            },
        );
        tree.insert(
            "a.txt".to_string(),
            TreeEntry::File {
                name: "a.txt".to_string(),
                path: PathBuf::from("root/a.txt"),
            },
        );
        tree
    }

    #[test]
    fn test_flatten_is_depth_first() {
        assert_eq!(
            flatten(&sample()),
            vec![
                PathBuf::from("root/a.txt"),
                PathBuf::from("root/dir"),
                PathBuf::from("root/dir/leaf.txt"),
            ]
        );
    }

    #[test]
    fn test_count_entries_counts_all_levels() {
        assert_eq!(count_entries(&sample()), 3);
        assert_eq!(count_entries(&DirectoryTree::new()), 0);
    }

    #[test]
    fn test_entry_accessors() {
        let tree = sample();
        let dir = &tree["dir"];
        assert!(dir.is_dir());
        assert_eq!(dir.name(), "dir");
        assert_eq!(dir.children().map(BTreeMap::len), Some(1));
        assert!(tree["a.txt"].children().is_none());
    }
}
