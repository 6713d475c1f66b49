mod commands;
mod logging;
mod progress;

use std::path::Path;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use safekeep_core::storage::Database;
use safekeep_core::{AppConfig, BackupEngine, BackupOptions, DestinationIndexer};
use tracing::error;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match safekeep_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Scan { root, no_hash }) => run_scan(&config, &root, !no_hash),
        Some(Commands::Index {
            dest,
            force_rescan,
            entire_volume,
        }) => run_index(&config, &dest, force_rescan, entire_volume),
        Some(Commands::Backup {
            source,
            dest,
            dry_run,
            no_dedup,
        }) => run_backup(&config, &source, &dest, dry_run, !no_dedup),
        Some(Commands::History { limit }) => run_history(&config, limit),
        Some(Commands::Forget { path }) => run_forget(&config, &path),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {}", err);
        process::exit(1);
    }
}

fn open_store(config: &AppConfig) -> Result<Database, safekeep_core::Error> {
    // Store unavailability is fatal before any scanning starts.
    Ok(Database::open(Path::new(&config.db_path))?)
}

fn run_scan(config: &AppConfig, root: &Path, compute_hash: bool) -> Result<(), safekeep_core::Error> {
    let scanner = safekeep_core::scanner::FileScanner::new(config);
    let reporter = CliReporter::new("Scanning");
    let records = scanner.scan_folder(root, compute_hash, &reporter)?;

    let total_bytes: u64 = records.iter().map(|r| r.size).sum();
    println!(
        "{} files, {} bytes under {}",
        records.len().to_string().green(),
        total_bytes.to_string().green(),
        root.display()
    );
    Ok(())
}

fn run_index(
    config: &AppConfig,
    dest: &Path,
    force_rescan: bool,
    entire_volume: bool,
) -> Result<(), safekeep_core::Error> {
    let db = open_store(config)?;
    let indexer = DestinationIndexer::new(&db, config);
    let reporter = CliReporter::new("Indexing");
    let result = indexer.index(dest, force_rescan, entire_volume, &reporter)?;

    println!(
        "{} files, {} unique hashes in {:.2}s{}",
        result.files_found.to_string().green(),
        result.hashes_indexed.to_string().green(),
        result.duration_seconds,
        if result.cached { " (cached)".dimmed().to_string() } else { String::new() }
    );
    Ok(())
}

fn run_backup(
    config: &AppConfig,
    source: &Path,
    dest: &Path,
    dry_run: bool,
    check_duplicates: bool,
) -> Result<(), safekeep_core::Error> {
    let db = open_store(config)?;
    let engine = BackupEngine::new(db, config.clone());

    let reporter = CliReporter::new(if dry_run { "Planning" } else { "Copying" });
    let options = BackupOptions {
        dry_run,
        check_duplicates,
    };
    let report = engine.run(source, dest, options, &reporter)?;

    println!();
    println!(
        "{} copied, {} unchanged, {} duplicates, {} bytes{}",
        report.files_copied.to_string().green(),
        report.files_skipped.to_string().cyan(),
        report.files_duplicated.to_string().cyan(),
        report.total_bytes,
        if dry_run { " (dry run)".dimmed().to_string() } else { String::new() }
    );
    if report.cancelled {
        println!("{}", "Run cancelled before completion".yellow());
    }
    for message in &report.errors {
        println!("{} {}", "error:".red(), message);
    }
    Ok(())
}

fn run_history(config: &AppConfig, limit: i64) -> Result<(), safekeep_core::Error> {
    let db = open_store(config)?;
    let sessions = db.list_sessions(limit)?;

    if sessions.is_empty() {
        println!("No backup sessions recorded");
        return Ok(());
    }
    for session in sessions {
        println!(
            "#{} {} -> {} | {} copied, {} skipped, {} duplicated, {} bytes | {}",
            session.id,
            session.source_path,
            session.dest_path,
            session.files_copied,
            session.files_skipped,
            session.files_duplicated,
            session.total_bytes,
            match session.status.as_str() {
                "completed" => session.status.green(),
                "in_progress" => session.status.yellow(),
                _ => session.status.red(),
            }
        );
    }
    Ok(())
}

fn run_forget(config: &AppConfig, path: &Path) -> Result<(), safekeep_core::Error> {
    let db = open_store(config)?;
    let removed = db.delete_source_entry(&path.display().to_string())?;
    if removed > 0 {
        println!("Forgot {}", path.display());
    } else {
        println!("No stored entry for {}", path.display());
    }
    Ok(())
}
