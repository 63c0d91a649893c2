//! abfile - command-line front end for abstract file operations

use abfile::cli::{Args, Command, PathConfig};
use abfile::tree::flatten;
use abfile::{AbstractFile, CleanupRegistry, LocalFileSystem, TempFileOptions};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, Level};

#[compio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);
    args.validate()?;

    // Owned here so pending temp files are removed however main returns
    let registry = CleanupRegistry::new();
    let _cleanup = registry.guard();

    let fs = Arc::new(LocalFileSystem::with_buffer_size(args.io.buffer_size_bytes()));
    run(&args, &fs, &registry).await
}

fn init_logging(args: &Args) {
    let level = if args.quiet() {
        Level::ERROR
    } else {
        match args.verbose() {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open(paths: &PathConfig, fs: &Arc<LocalFileSystem>, path: &std::path::Path) -> AbstractFile {
    AbstractFile::with_filesystem(paths.address(path), Arc::clone(fs))
}

async fn run(args: &Args, fs: &Arc<LocalFileSystem>, registry: &CleanupRegistry) -> Result<()> {
    let paths = &args.paths;
    debug!("Running {:?}", args.command);

    match &args.command {
        Command::List { path } => {
            let listing = open(paths, fs, path).list(None).await?;
            for entry in flatten(&listing) {
                println!("{}", entry.display());
            }
        }
        Command::Search { path, name } => {
            for found in open(paths, fs, path).search(name).await? {
                println!("{}", found.display());
            }
        }
        Command::Size { path } => {
            println!("{}", open(paths, fs, path).size().await?);
        }
        Command::Copy {
            source,
            destination,
            overwrite,
        } => {
            let copied = open(paths, fs, source)
                .copy_to(destination, *overwrite)
                .await?;
            if !copied {
                println!(
                    "Destination exists, nothing copied: {}",
                    destination.display()
                );
            }
        }
        Command::Remove { path } => {
            open(paths, fs, path).remove().await?;
        }
        Command::Mkdir { path } => {
            if !open(paths, fs, path).create_directory().await? {
                println!("Already exists: {}", path.display());
            }
        }
        Command::Touch { path } => {
            if !open(paths, fs, path).create_new_file().await? {
                println!("Already exists: {}", path.display());
            }
        }
        Command::Checksum {
            path,
            algorithm,
            encoding,
        } => {
            let digest = open(paths, fs, path)
                .checksum(*algorithm, *encoding)
                .await?
                .context("No path given")?;
            println!("{digest}");
        }
        Command::Perms {
            path,
            mode,
            read_only,
        } => {
            let file = open(paths, fs, path);
            if *read_only {
                file.set_read_only().await?;
            } else if let Some(mode) = mode {
                file.set_permissions(mode).await?;
            }
            let permissions = file.permissions().await?.context("No path given")?;
            println!("{permissions}");
        }
        Command::Rename {
            from,
            to,
            overwrite,
        } => match open(paths, fs, from).rename_to(to, *overwrite).await? {
            Some(renamed) => println!("{renamed}"),
            None => println!("Destination exists, nothing renamed: {}", to.display()),
        },
        Command::Temp {
            prefix,
            suffix,
            directory,
            keep,
        } => {
            let options = TempFileOptions::new()
                .prefix(prefix)
                .suffix(suffix)
                .directory(directory);
            let file =
                AbstractFile::create_temp_file_in(Arc::clone(fs), paths.base(), &options, registry)
                    .await?;
            if *keep {
                file.remove_on_exit(registry, false);
            }
            println!("{file}");
        }
    }

    Ok(())
}
