use crate::platform;
use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024 * 1024; // 10 GiB
pub const DEFAULT_MTIME_TOLERANCE_SECS: f64 = 1.0;

/// Runtime configuration for the store and scanner.
///
/// The pattern lists and size bounds are explicit values handed to the
/// scanner at construction; nothing reads them from global state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite metadata store location.
    pub db_path: String,
    /// Glob patterns matched against file names and full paths; a match
    /// always excludes the file.
    pub exclude_patterns: Vec<String>,
    /// When non-empty, a file must match one of these to be scanned.
    pub include_patterns: Vec<String>,
    pub min_file_size: u64,
    pub max_file_size: u64,
    /// Modification-time drift beyond which a file counts as changed even
    /// when its hash was not recomputed. Filesystem timestamp resolution
    /// varies by platform, so this is tunable rather than fixed.
    pub mtime_tolerance_secs: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "safekeep.db".to_string(),
            exclude_patterns: platform::default_exclude_patterns(),
            include_patterns: Vec::new(),
            min_file_size: 0,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            mtime_tolerance_secs: DEFAULT_MTIME_TOLERANCE_SECS,
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.min_file_size, 0);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!((config.mtime_tolerance_secs - 1.0).abs() < f64::EPSILON);
        assert!(config.include_patterns.is_empty());
        assert!(!config.exclude_patterns.is_empty());
    }
}
