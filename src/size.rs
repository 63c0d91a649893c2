//! Recursive size calculation

use crate::backends::FileSystem;
use crate::error::Result;
use crate::fan_out::fan_out;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::path::PathBuf;

/// Total size in bytes of `path` and everything below it
///
/// A file contributes its length. A directory is the sum of its children,
/// computed concurrently; an empty directory is 0 without any child probe.
///
/// # Errors
///
/// Returns the first error raised anywhere in the tree. No partial sum is
/// reported.
pub fn total_size<F: FileSystem>(fs: &F, path: PathBuf) -> LocalBoxFuture<'_, Result<u64>> {
    async move {
        let metadata = fs.metadata(&path).await?;
        if !metadata.is_dir() {
            return Ok(metadata.len);
        }

        let names = fs.read_dir(&path).await?;
        let sizes = fan_out(names.into_iter().map(|name| total_size(fs, path.join(name)))).await?;
        Ok(sizes.into_iter().sum())
    }
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::LocalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    #[compio::test]
    async fn test_size_of_file_is_its_length() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("f.bin");
        fs::write(&file, vec![0u8; 1234])?;

        assert_eq!(total_size(&LocalFileSystem::new(), file).await?, 1234);

        Ok(())
    }

    #[compio::test]
    async fn test_size_sums_nested_tree() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("a/b"))?;
        fs::create_dir(temp_dir.path().join("empty"))?;
        fs::write(temp_dir.path().join("one.txt"), b"12345")?;
        fs::write(temp_dir.path().join("a/two.txt"), b"1234567890")?;
        fs::write(temp_dir.path().join("a/b/three.txt"), b"123")?;

        let total = total_size(&LocalFileSystem::new(), temp_dir.path().to_path_buf()).await?;
        assert_eq!(total, 18);

        Ok(())
    }

    #[compio::test]
    async fn test_size_of_empty_directory_is_zero() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;

        let total = total_size(&LocalFileSystem::new(), temp_dir.path().to_path_buf()).await?;
        assert_eq!(total, 0);

        Ok(())
    }
}
