//! Recursive copying
//!
//! A file is streamed into a freshly created (or truncated) destination. A
//! directory is recreated at the destination and its children are copied
//! concurrently with the same overwrite policy.
//!
//! # Overwrite policy
//!
//! - Destination missing: copy.
//! - Destination present, `overwrite == false`: nothing happens and the copy
//!   reports `Ok(false)`. This is not an error.
//! - Destination present, `overwrite == true`: the destination is removed
//!   recursively first, so a directory copy replaces rather than merges.
//!
//! A failing child fails the parent copy after its siblings have finished;
//! whatever they copied stays in place.
//!
//! Copying an entry onto itself is a no-op reporting `Ok(false)`, even with
//! `overwrite`. A destination nested inside the source, or containing it, is
//! rejected up front.

use crate::address::normalize;
use crate::backends::FileSystem;
use crate::error::{FileError, Result};
use crate::fan_out::fan_out;
use crate::remove::remove_tree;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy `src` to `dst`
///
/// Returns `Ok(true)` when something was copied and `Ok(false)` when the
/// destination already existed and `overwrite` was not requested.
///
/// # Errors
///
/// Returns `NotFound` if `src` does not exist, `OverlappingPaths` if one of
/// `src` and `dst` lies below the other, or the first error raised anywhere
/// below it.
pub async fn copy_tree<F: FileSystem>(
    fs: &F,
    src: PathBuf,
    dst: PathBuf,
    overwrite: bool,
) -> Result<bool> {
    if same_entry(&src, &dst)? {
        fs.metadata(&src).await?;
        debug!("Source and destination are the same entry: {}", src.display());
        return Ok(false);
    }
    copy_entry(fs, src, dst, overwrite).await
}

/// Whether `src` and `dst` name the same location
///
/// # Errors
///
/// Fails with `OverlappingPaths` when one lies strictly inside the other.
pub(crate) fn same_entry(src: &Path, dst: &Path) -> Result<bool> {
    let (src_abs, dst_abs) = (absolute(src)?, absolute(dst)?);
    if src_abs == dst_abs {
        return Ok(true);
    }
    if dst_abs.starts_with(&src_abs) || src_abs.starts_with(&dst_abs) {
        return Err(FileError::OverlappingPaths {
            source_path: src.to_path_buf(),
            destination: dst.to_path_buf(),
        });
    }
    Ok(false)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(|e| FileError::io(path, e))
}

fn copy_entry<F: FileSystem>(
    fs: &F,
    src: PathBuf,
    dst: PathBuf,
    overwrite: bool,
) -> LocalBoxFuture<'_, Result<bool>> {
    async move {
        let metadata = fs.metadata(&src).await?;

        if fs.exists(&dst).await {
            if !overwrite {
                debug!("Destination exists, skipping: {}", dst.display());
                return Ok(false);
            }
            remove_tree(fs, dst.clone()).await?;
        }

        if !metadata.is_dir() {
            let bytes = fs.copy_file(&src, &dst).await?;
            debug!(
                "Copied file {} -> {} ({} bytes)",
                src.display(),
                dst.display(),
                bytes
            );
            return Ok(true);
        }

        fs.create_dir(&dst).await?;
        let names = fs.read_dir(&src).await?;
        debug!(
            "Copying directory {} -> {} ({} entries)",
            src.display(),
            dst.display(),
            names.len()
        );

        fan_out(
            names
                .into_iter()
                .map(|name| copy_entry(fs, src.join(&name), dst.join(&name), overwrite)),
        )
        .await?;

        Ok(true)
    }
    .boxed_local()
}
