use abfile::backends::{FileSystem, LocalFileSystem};
use abfile::{AbstractFile, PathAddress};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod fs_wrappers;

#[allow(unused_imports)]
pub use fs_wrappers::{FaultyFileSystem, Op, RecordingFileSystem};

/// Create files and directories below `root`
///
/// Entries ending in `/` are directories; anything else is a file whose
/// contents are its own relative path. Parents are created as needed.
#[allow(dead_code)]
pub fn build_tree(root: &Path, entries: &[&str]) -> std::io::Result<()> {
    for entry in entries {
        let path = root.join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            std::fs::create_dir_all(&path)?;
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, entry.as_bytes())?;
        }
    }
    Ok(())
}

/// Handle for `path` resolved against `base`, backed by `fs`
#[allow(dead_code)]
pub fn file_at<F: FileSystem>(fs: &Arc<F>, base: &Path, path: &str) -> AbstractFile<F> {
    AbstractFile::with_filesystem(PathAddress::with_base(path, base), Arc::clone(fs))
}

/// Handle for `path` on the plain local backend
#[allow(dead_code)]
pub fn local_file(base: &Path, path: &str) -> AbstractFile {
    file_at(&Arc::new(LocalFileSystem::new()), base, path)
}

#[allow(dead_code)]
pub struct TestTimeoutGuard {
    cancelled: Arc<AtomicBool>,
}

impl Drop for TestTimeoutGuard {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Abort the test process if a tree operation wedges instead of completing
#[allow(dead_code)]
pub fn test_timeout_guard(duration: Duration) -> TestTimeoutGuard {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = Arc::clone(&cancelled);
    std::thread::spawn(move || {
        std::thread::sleep(duration);
        if !cancelled_clone.load(Ordering::SeqCst) {
            eprintln!("Test timeout exceeded ({}s). Aborting.", duration.as_secs());
            std::process::abort();
        }
    });
    TestTimeoutGuard { cancelled }
}

/// Shared call log used by the wrappers
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<(Op, PathBuf)>>,
}

impl CallLog {
    pub fn record(&self, op: Op, path: &Path) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((op, path.to_path_buf()));
        }
    }

    #[allow(dead_code)]
    pub fn count(&self, op: Op) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|(o, _)| *o == op).count())
            .unwrap_or(0)
    }

    #[allow(dead_code)]
    pub fn paths(&self, op: Op) -> Vec<PathBuf> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(o, _)| *o == op)
                    .map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}
