//! Recursive removal
//!
//! Children are removed concurrently, and a directory is removed only after
//! every child has finished. A failing child fails the whole removal, but its
//! siblings still run.

use crate::backends::FileSystem;
use crate::error::Result;
use crate::fan_out::fan_out;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use tracing::debug;

/// Remove `path` and everything below it
///
/// Entries are probed without following symbolic links, so a link is
/// unlinked and its target left alone.
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist, or the first error any
/// entry below it produced.
pub fn remove_tree<F: FileSystem>(fs: &F, path: PathBuf) -> LocalBoxFuture<'_, Result<()>> {
    async move {
        let metadata = fs.symlink_metadata(&path).await?;
        if !metadata.is_dir() {
            fs.remove_file(&path).await?;
            debug!("Removed file: {}", path.display());
            return Ok(());
        }

        let names = fs.read_dir(&path).await?;
        fan_out(names.into_iter().map(|name| remove_tree(fs, path.join(name)))).await?;

        fs.remove_dir(&path).await?;
        debug!("Removed directory: {}", path.display());
        Ok(())
    }
    .boxed_local()
}
