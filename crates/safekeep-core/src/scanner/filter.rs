use crate::config::AppConfig;
use glob::Pattern;
use std::path::Path;
use tracing::error;

/// Compiled inclusion/exclusion rules for one scan.
///
/// Exclude matches always win. When include patterns are configured a file
/// must also match one of them. Patterns are tried against the bare file
/// name and the full path, matching the original tool's behavior.
pub struct ScanFilter {
    exclude: Vec<Pattern>,
    include: Vec<Pattern>,
    min_size: u64,
    max_size: u64,
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

impl ScanFilter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            exclude: compile_patterns(&config.exclude_patterns),
            include: compile_patterns(&config.include_patterns),
            min_size: config.min_file_size,
            max_size: config.max_file_size,
        }
    }

    pub fn accepts_name(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let matches = |pattern: &Pattern| pattern.matches(&file_name) || pattern.matches_path(path);

        if self.exclude.iter().any(matches) {
            return false;
        }

        if !self.include.is_empty() {
            return self.include.iter().any(matches);
        }

        true
    }

    pub fn accepts_size(&self, size: u64) -> bool {
        size >= self.min_size && size <= self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(exclude: &[&str], include: &[&str]) -> ScanFilter {
        let config = AppConfig {
            exclude_patterns: exclude.iter().map(|s| s.to_string()).collect(),
            include_patterns: include.iter().map(|s| s.to_string()).collect(),
            ..AppConfig::default()
        };
        ScanFilter::from_config(&config)
    }

    #[test]
    fn test_exclude_by_name() {
        let filter = filter_with(&[".DS_Store", "*.tmp"], &[]);
        assert!(!filter.accepts_name(Path::new("/a/.DS_Store")));
        assert!(!filter.accepts_name(Path::new("/a/scratch.tmp")));
        assert!(filter.accepts_name(Path::new("/a/file.txt")));
    }

    #[test]
    fn test_include_list_restricts() {
        let filter = filter_with(&[], &["*.txt"]);
        assert!(filter.accepts_name(Path::new("/a/notes.txt")));
        assert!(!filter.accepts_name(Path::new("/a/photo.jpg")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = filter_with(&["secret*"], &["*.txt"]);
        assert!(!filter.accepts_name(Path::new("/a/secret.txt")));
    }

    #[test]
    fn test_size_bounds() {
        let config = AppConfig {
            min_file_size: 10,
            max_file_size: 100,
            ..AppConfig::default()
        };
        let filter = ScanFilter::from_config(&config);
        assert!(!filter.accepts_size(9));
        assert!(filter.accepts_size(10));
        assert!(filter.accepts_size(100));
        assert!(!filter.accepts_size(101));
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let filter = filter_with(&["[invalid"], &[]);
        assert!(filter.accepts_name(Path::new("/a/file.txt")));
    }
}
