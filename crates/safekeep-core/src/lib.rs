pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod indexer;
pub mod platform;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use config::AppConfig;
pub use engine::{BackupEngine, BackupOptions, BackupReport};
pub use error::Error;
pub use indexer::{DestinationIndexer, IndexResult};
pub use progress::{ProgressReporter, SilentReporter};
