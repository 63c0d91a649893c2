//! Path addresses: a user-given path plus its resolved form
//!
//! A [`PathAddress`] keeps the path exactly as the caller wrote it
//! (lexically normalized) next to the path that IO is actually performed on.
//! Relative paths are resolved against a base directory, which defaults to
//! the directory containing the running executable rather than the current
//! working directory.
//!
//! An address may also be *null*: constructed without a path. Null addresses
//! let operations report "nothing to do" without an error.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Directory containing the program's entry point, relative to the current
/// directory when it lives below it.
static ENTRY_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let Some(exe_dir) = exe_dir else {
        return PathBuf::new();
    };

    match std::env::current_dir() {
        Ok(cwd) => exe_dir
            .strip_prefix(&cwd)
            .map_or_else(|_| exe_dir.clone(), Path::to_path_buf),
        Err(_) => exe_dir,
    }
});

/// Default base directory for relative paths
///
/// This is the directory containing the running executable, expressed
/// relative to the current directory when possible.
#[must_use]
pub fn entry_dir() -> &'static Path {
    &ENTRY_DIR
}

/// Lexically normalize a path
///
/// Collapses `.` segments, resolves `..` against preceding normal segments
/// and drops trailing separators. Leading `..` segments of a relative path
/// are kept. An empty result becomes `.`.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut normal_segments = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if normal_segments > 0 {
                    out.pop();
                    normal_segments -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(segment) => {
                out.push(segment);
                normal_segments += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Whether a user-given path counts as absolute
///
/// True for a leading separator or a drive marker anywhere in the path.
fn looks_absolute(path: &Path) -> bool {
    path.has_root() || path.to_string_lossy().contains(':')
}

/// Immutable address of a filesystem path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathAddress {
    /// Path as supplied by the caller, normalized; `None` for a null address
    raw: Option<PathBuf>,
    /// Path IO is performed on; `None` exactly when `raw` is `None`
    resolved: Option<PathBuf>,
    /// Directory relative paths are resolved against
    base: PathBuf,
    absolute: bool,
}

impl PathAddress {
    /// Address `path`, resolving it against [`entry_dir`] when relative
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_base(path, entry_dir())
    }

    /// Address `path`, resolving it against `base` when relative
    ///
    /// An empty path yields a null address.
    #[must_use]
    pub fn with_base(path: impl AsRef<Path>, base: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let base = base.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Self::null_with_base(base);
        }

        let raw = normalize(path);
        let absolute = looks_absolute(&raw);
        let resolved = if absolute || base.as_os_str().is_empty() {
            raw.clone()
        } else {
            normalize(&base.join(&raw))
        };

        Self {
            raw: Some(raw),
            resolved: Some(resolved),
            base,
            absolute,
        }
    }

    /// The null address
    #[must_use]
    pub fn null() -> Self {
        Self::null_with_base(entry_dir().to_path_buf())
    }

    fn null_with_base(base: PathBuf) -> Self {
        Self {
            raw: None,
            resolved: None,
            base,
            absolute: false,
        }
    }

    /// Whether the address has no underlying path
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// The path as the caller wrote it (normalized)
    #[must_use]
    pub fn raw(&self) -> Option<&Path> {
        self.raw.as_deref()
    }

    /// The path IO is performed on
    #[must_use]
    pub fn resolved(&self) -> Option<&Path> {
        self.resolved.as_deref()
    }

    /// Base directory used for relative paths
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether the caller's path was absolute
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Last segment of the caller's path
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.raw
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
    }

    /// Address of the parent of the caller's path
    ///
    /// `None` for a null address, a root, or a single-segment relative path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let parent = self.raw.as_deref()?.parent()?;
        if parent.as_os_str().is_empty() {
            return None;
        }
        Some(Self::with_base(parent, &self.base))
    }

    /// Address of `name` inside this address, sharing its base
    #[must_use]
    pub fn join(&self, name: impl AsRef<Path>) -> Self {
        match &self.raw {
            Some(raw) => Self::with_base(raw.join(name), &self.base),
            None => self.clone(),
        }
    }

    /// Address another path against the same base directory
    #[must_use]
    pub fn sibling(&self, path: impl AsRef<Path>) -> Self {
        Self::with_base(path, &self.base)
    }

    /// Fully absolute form of the resolved path
    ///
    /// Returns `None` for a null address or if the current directory cannot be
    /// determined.
    #[must_use]
    pub fn absolute(&self) -> Option<PathBuf> {
        let resolved = self.resolved.as_deref()?;
        if resolved.has_root() {
            return Some(resolved.to_path_buf());
        }
        std::path::absolute(resolved).ok().map(|p| normalize(&p))
    }
}

impl std::fmt::Display for PathAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.resolved {
            Some(path) => write!(f, "{}", path.display()),
            None => Ok(()),
        }
    }
}
