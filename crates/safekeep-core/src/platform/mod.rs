use std::path::{Path, PathBuf};

/// Hidden-entry convention: a leading dot on the file name.
pub fn is_hidden_entry(name: &str) -> bool {
    name.starts_with('.')
}

/// Directory names the scanner never descends into, beyond hidden ones.
#[cfg(target_os = "windows")]
pub fn system_excluded_dir_names() -> &'static [&'static str] {
    &["System Volume Information", "$RECYCLE.BIN", "RECYCLER"]
}

#[cfg(target_os = "macos")]
pub fn system_excluded_dir_names() -> &'static [&'static str] {
    &[".fseventsd", ".Spotlight-V100", ".TemporaryItems", ".Trashes"]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn system_excluded_dir_names() -> &'static [&'static str] {
    &[]
}

/// Default file-name exclude patterns for this platform.
///
/// Metadata droppings from the other platforms are excluded everywhere:
/// backup trees get carried between machines and the junk travels with them.
pub fn default_exclude_patterns() -> Vec<String> {
    let mut patterns: Vec<String> = [
        ".DS_Store",
        "Thumbs.db",
        "desktop.ini",
        "*.tmp",
        "*.swp",
        "*.bak",
        "*.cache",
        "~$*",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect();

    if cfg!(target_os = "macos") {
        patterns.extend(
            [".AppleDouble", ".LSOverride", ".VolumeIcon.icns"]
                .iter()
                .map(|p| p.to_string()),
        );
    } else if cfg!(target_os = "linux") {
        patterns.extend([".directory", ".thumbnails"].iter().map(|p| p.to_string()));
    }

    patterns
}

/// Root of the volume/mount containing `path`.
///
/// On Windows this is the drive prefix; elsewhere parents are walked until
/// the device id changes. Falls back to the path itself when the boundary
/// cannot be determined.
pub fn volume_root_of(path: &Path) -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        use std::path::Component;
        if let Some(Component::Prefix(prefix)) = path.components().next() {
            let mut root = PathBuf::from(prefix.as_os_str());
            root.push("\\");
            return root;
        }
        path.to_path_buf()
    }

    #[cfg(not(target_os = "windows"))]
    {
        use std::os::unix::fs::MetadataExt;

        let device_of = |p: &Path| std::fs::metadata(p).map(|m| m.dev()).ok();

        let mut current = path.to_path_buf();
        let Some(device) = device_of(&current) else {
            return current;
        };

        while let Some(parent) = current.parent().map(Path::to_path_buf) {
            match device_of(&parent) {
                Some(parent_device) if parent_device == device => current = parent,
                // Device changed or parent unreadable: current is the mount root.
                _ => break,
            }
        }
        current
    }
}
