//! Command-line interface definitions
//!
//! This module organizes CLI arguments by **functional usage** - each group
//! contains the options needed by a specific component or subsystem.

use crate::address::PathAddress;
use crate::checksum::{ChecksumAlgorithm, DigestEncoding};
use anyhow::Result;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Abstract file handles with concurrent recursive tree operations
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Path resolution
    #[command(flatten)]
    pub paths: PathConfig,

    /// Backend I/O settings
    #[command(flatten)]
    pub io: IoConfig,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,
}

// ============================================================================
// FUNCTIONAL GROUPS: Organized by what component consumes them
// ============================================================================

/// Path resolution configuration
///
/// Used by: `main()` to build every `PathAddress`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PathConfig {
    /// Directory relative paths are resolved against (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Base directory for relative paths; empty means the current directory
    #[must_use]
    pub fn base(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or(Path::new(""))
    }

    /// Address `path` against the configured base
    #[must_use]
    pub fn address(&self, path: impl AsRef<Path>) -> PathAddress {
        PathAddress::with_base(path, self.base())
    }
}

/// Largest accepted `--buffer-size-kb` (1 GiB)
const MAX_BUFFER_SIZE_KB: u64 = 1024 * 1024;

/// Backend I/O configuration
///
/// Used by: `LocalFileSystem::with_buffer_size()`
#[derive(clap::Args, Debug, Clone, Default)]
#[command(next_help_heading = "I/O Options")]
pub struct IoConfig {
    /// Buffer size in KB for streaming copies and checksums (0 = default, 64KB)
    #[arg(
        long,
        global = true,
        default_value = "0",
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_BUFFER_SIZE_KB)
    )]
    pub buffer_size_kb: usize,
}

impl IoConfig {
    /// Buffer size in bytes; 0 selects the backend default
    #[must_use]
    pub const fn buffer_size_bytes(&self) -> usize {
        self.buffer_size_kb.saturating_mul(1024)
    }
}

/// Output and logging configuration
///
/// Used by: logging setup in `main()`
#[derive(clap::Args, Debug, Clone, Default)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Operations exposed on the command line
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every entry below a directory, depth-first
    List {
        /// Directory to list
        path: PathBuf,
    },

    /// Find entries with a given name below a directory
    Search {
        /// Directory to search
        path: PathBuf,
        /// Entry name to look for
        name: String,
    },

    /// Total size in bytes of a file or directory tree
    Size {
        /// File or directory
        path: PathBuf,
    },

    /// Copy a file or directory tree
    Copy {
        /// Source file or directory
        source: PathBuf,
        /// Destination path
        destination: PathBuf,
        /// Replace an existing destination instead of skipping
        #[arg(long)]
        overwrite: bool,
    },

    /// Remove a file or directory tree
    Remove {
        /// File or directory
        path: PathBuf,
    },

    /// Create a directory and any missing parents
    Mkdir {
        /// Directory to create
        path: PathBuf,
    },

    /// Create an empty file if nothing exists at the path
    Touch {
        /// File to create
        path: PathBuf,
    },

    /// Print the checksum of a file
    Checksum {
        /// File to hash
        path: PathBuf,
        /// Hash algorithm
        #[arg(long, short, value_enum, default_value = "md5")]
        algorithm: ChecksumAlgorithm,
        /// Digest encoding
        #[arg(long, short, value_enum, default_value = "hex")]
        encoding: DigestEncoding,
    },

    /// Show or set permission bits
    Perms {
        /// File or directory
        path: PathBuf,
        /// Octal mode to apply, e.g. 755
        #[arg(conflicts_with = "read_only")]
        mode: Option<String>,
        /// Make the path read-only (444)
        #[arg(long)]
        read_only: bool,
    },

    /// Rename a file or directory
    Rename {
        /// Current path
        from: PathBuf,
        /// New path
        to: PathBuf,
        /// Replace an existing destination instead of skipping
        #[arg(long)]
        overwrite: bool,
    },

    /// Create an empty temporary file
    Temp {
        /// Text before the random number
        #[arg(long, default_value = "")]
        prefix: String,
        /// Text after the random number
        #[arg(long, default_value = "")]
        suffix: String,
        /// Directory to create the file in
        #[arg(long, default_value = ".")]
        directory: PathBuf,
        /// Keep the file instead of removing it on exit
        #[arg(long)]
        keep: bool,
    },
}

impl Args {
    /// Validate arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The base directory does not exist or is not a directory
    pub fn validate(&self) -> Result<()> {
        if self.output.quiet && self.output.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        if let Some(base) = &self.paths.base_dir {
            if !base.is_dir() {
                anyhow::bail!("Base directory is not a directory: {}", base.display());
            }
        }

        Ok(())
    }

    /// Verbosity level
    #[must_use]
    pub const fn verbose(&self) -> u8 {
        self.output.verbose
    }

    /// Whether quiet mode is enabled
    #[must_use]
    pub const fn quiet(&self) -> bool {
        self.output.quiet
    }
}
