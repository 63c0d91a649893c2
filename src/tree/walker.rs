//! Concurrent recursive directory walking
//!
//! Every directory level is read once, filtered, and then all surviving
//! entries are probed and (for directories) descended into concurrently.
//! A level completes when all of its entries have; the first error at any
//! depth fails the whole walk.

use super::types::{DirectoryTree, EntryFilter, TreeEntry};
use crate::backends::FileSystem;
use crate::error::{FileError, Result};
use crate::fan_out::fan_out;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walk the directory at `root`
///
/// IO happens on `root`; entry paths in the result are built from
/// `logical_root`, the same directory as the caller addressed it.
///
/// # Errors
///
/// Returns an error if:
/// - `root` does not exist (`NotFound`)
/// - `root` is not a directory (`NotADirectory`)
/// - Any directory read or entry probe fails at any depth
pub async fn walk<F: FileSystem>(
    fs: &F,
    root: &Path,
    logical_root: &Path,
    filter: Option<&EntryFilter<'_>>,
) -> Result<DirectoryTree> {
    let metadata = fs.metadata(root).await?;
    if !metadata.is_dir() {
        return Err(FileError::NotADirectory(root.to_path_buf()));
    }

    debug!("Walking directory: {}", root.display());
    walk_level(fs, root.to_path_buf(), logical_root.to_path_buf(), filter).await
}

/// Read one directory level and descend into it concurrently
fn walk_level<'a, F: FileSystem>(
    fs: &'a F,
    dir: PathBuf,
    logical_dir: PathBuf,
    filter: Option<&'a EntryFilter<'a>>,
) -> LocalBoxFuture<'a, Result<DirectoryTree>> {
    async move {
        let names = fs.read_dir(&dir).await?;

        // Filtered entries are neither probed nor counted
        let entries: Vec<(String, PathBuf, PathBuf)> = names
            .into_iter()
            .filter_map(|raw| {
                // Paths keep the raw name; only the key and filter see the lossy form
                let name = raw.to_string_lossy().into_owned();
                let logical = logical_dir.join(&raw);
                if filter.is_some_and(|keep| !keep(&name, &logical)) {
                    return None;
                }
                let physical = dir.join(&raw);
                Some((name, physical, logical))
            })
            .collect();

        let children = fan_out(
            entries
                .into_iter()
                .map(|(name, physical, logical)| walk_entry(fs, name, physical, logical, filter)),
        )
        .await?;

        Ok(children.into_iter().collect())
    }
    .boxed_local()
}

/// Classify one entry: leaves return immediately, directories recurse
async fn walk_entry<'a, F: FileSystem>(
    fs: &'a F,
    name: String,
    physical: PathBuf,
    logical: PathBuf,
    filter: Option<&'a EntryFilter<'a>>,
) -> Result<(String, TreeEntry)> {
    let metadata = fs.metadata(&physical).await?;
    let entry = if metadata.is_dir() {
        let children = walk_level(fs, physical, logical.clone(), filter).await?;
        TreeEntry::Directory {
            name: name.clone(),
            path: logical,
            children,
        }
    } else {
        TreeEntry::File {
            name: name.clone(),
            path: logical,
        }
    };
    Ok((name, entry))
}

/// Find every entry named `target` below `root`
///
/// Both files and directories match. A matched directory is not searched
/// further. Results are logical paths; their order reflects traversal and
/// carries no meaning.
///
/// # Errors
///
/// Fails exactly when [`walk`] fails.
pub async fn search<F: FileSystem>(
    fs: &F,
    root: &Path,
    logical_root: &Path,
    target: &str,
) -> Result<Vec<PathBuf>> {
    let matches = RefCell::new(Vec::new());
    let filter = |name: &str, path: &Path| {
        if name == target {
            matches.borrow_mut().push(path.to_path_buf());
            false
        } else {
            true
        }
    };

    walk(fs, root, logical_root, Some(&filter)).await?;
    Ok(matches.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::LocalFileSystem;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    #[compio::test]
    async fn test_walk_empty_directory() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;

        let tree = walk(&LocalFileSystem::new(), temp_dir.path(), temp_dir.path(), None).await?;
        assert!(tree.is_empty());

        Ok(())
    }

    #[compio::test]
    async fn test_walk_nested_directories() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("dir1/subdir"))?;
        fs::write(temp_dir.path().join("dir1/file1.txt"), b"1")?;
        fs::write(temp_dir.path().join("dir1/subdir/file2.txt"), b"2")?;
        fs::create_dir(temp_dir.path().join("empty"))?;

        let tree = walk(&LocalFileSystem::new(), temp_dir.path(), Path::new("root"), None).await?;

        let dir1 = tree.get("dir1").and_then(TreeEntry::children);
        let dir1 = dir1.ok_or_else(|| anyhow::anyhow!("dir1 missing"))?;
        assert_eq!(dir1["file1.txt"].path(), Path::new("root/dir1/file1.txt"));
        assert!(dir1["subdir"].is_dir());
        assert_eq!(
            dir1["subdir"].children().map(|c| c.contains_key("file2.txt")),
            Some(true)
        );
        assert_eq!(tree["empty"].children().map(DirectoryTree::len), Some(0));

        Ok(())
    }

    #[compio::test]
    async fn test_walk_rejects_file_root() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, b"x")?;

        let result = walk(&LocalFileSystem::new(), &file, &file, None).await;
        assert!(matches!(result, Err(FileError::NotADirectory(_))));

        Ok(())
    }

    #[compio::test]
    async fn test_walk_missing_root_is_not_found() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("missing");

        let result = walk(&LocalFileSystem::new(), &missing, &missing, None).await;
        assert!(matches!(result, Err(FileError::NotFound(_))));

        Ok(())
    }

    #[compio::test]
    async fn test_filter_excludes_entries_and_descent() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir(temp_dir.path().join("skip"))?;
        fs::write(temp_dir.path().join("skip/inner.txt"), b"x")?;
        fs::write(temp_dir.path().join("keep.txt"), b"x")?;

        let filter = |name: &str, _: &Path| name != "skip";
        let tree = walk(
            &LocalFileSystem::new(),
            temp_dir.path(),
            temp_dir.path(),
            Some(&filter),
        )
        .await?;

        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["keep.txt"]);

        Ok(())
    }

    #[compio::test]
    async fn test_search_matches_files_at_every_depth() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("a"))?;
        fs::create_dir_all(temp_dir.path().join("b/c"))?;
        fs::write(temp_dir.path().join("a/target.txt"), b"1")?;
        fs::write(temp_dir.path().join("b/c/target.txt"), b"2")?;
        fs::write(temp_dir.path().join("target.txt"), b"3")?;
        fs::write(temp_dir.path().join("b/other.txt"), b"4")?;

        let found = search(
            &LocalFileSystem::new(),
            temp_dir.path(),
            Path::new("root"),
            "target.txt",
        )
        .await?;

        let found: HashSet<PathBuf> = found.into_iter().collect();
        let expected: HashSet<PathBuf> = [
            "root/a/target.txt",
            "root/b/c/target.txt",
            "root/target.txt",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(found, expected);

        Ok(())
    }

    #[compio::test]
    async fn test_search_does_not_descend_into_matched_directory() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("needle/deeper"))?;
        fs::create_dir_all(temp_dir.path().join("needle/needle"))?;

        let found = search(
            &LocalFileSystem::new(),
            temp_dir.path(),
            Path::new("r"),
            "needle",
        )
        .await?;

        assert_eq!(found, vec![PathBuf::from("r/needle")]);

        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[compio::test]
    async fn test_walk_keeps_non_utf8_names_addressable() -> anyhow::Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new()?;
        let raw = OsStr::from_bytes(b"bad\xffname");
        fs::create_dir(temp_dir.path().join(raw))?;
        fs::write(temp_dir.path().join(raw).join("inner.txt"), b"x")?;
        fs::write(temp_dir.path().join("ok.txt"), b"x")?;

        let fs = LocalFileSystem::new();
        let tree = walk(&fs, temp_dir.path(), Path::new("r"), None).await?;

        assert_eq!(tree.len(), 2);
        let key = raw.to_string_lossy().into_owned();
        assert_eq!(tree[&key].path(), Path::new("r").join(raw));
        assert_eq!(tree[&key].children().map(DirectoryTree::len), Some(1));

        let found = search(&fs, temp_dir.path(), Path::new("r"), "ok.txt").await?;
        assert_eq!(found, vec![PathBuf::from("r/ok.txt")]);

        Ok(())
    }
}
