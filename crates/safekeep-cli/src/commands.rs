use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "safekeep")]
#[command(about = "Content-addressed incremental backup", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a folder and report the files a backup would consider
    Scan {
        root: PathBuf,
        /// Skip content hashing (faster, metadata only)
        #[arg(long)]
        no_hash: bool,
    },
    /// Index a destination's content so backups can skip duplicates
    Index {
        dest: PathBuf,
        /// Rebuild the index even when a recent scan is cached
        #[arg(long)]
        force_rescan: bool,
        /// Index the whole volume containing the destination folder
        #[arg(long)]
        entire_volume: bool,
    },
    /// Back up new and changed files from source to destination
    Backup {
        source: PathBuf,
        dest: PathBuf,
        /// Classify and count without copying or recording anything
        #[arg(long)]
        dry_run: bool,
        /// Skip the destination duplicate check
        #[arg(long)]
        no_dedup: bool,
    },
    /// List recent backup sessions
    History {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Drop the stored history for one source path
    Forget { path: PathBuf },
    /// Print configuration values
    PrintConfig,
}
