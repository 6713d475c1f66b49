use crate::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Stream a file through BLAKE3 and return the lowercase hex digest.
///
/// Reads in bounded chunks so memory use is independent of file size. The
/// whole change-detection and dedup scheme rests on this digest being
/// deterministic for unchanged content.
pub fn hash_file(path: &Path) -> Result<String, Error> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(Error::NotAFile(path.to_path_buf()));
    }

    let mut file = File::open(path).map_err(|source| Error::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; READ_CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(|source| Error::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash an in-memory byte slice with the same algorithm as `hash_file`.
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Hash a string's UTF-8 encoding. Used by tests and diagnostics.
pub fn hash_str(data: &str) -> String {
    hash_bytes(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_str("test content"), hash_str("test content"));
    }

    #[test]
    fn test_hash_is_content_sensitive() {
        assert_ne!(hash_str("test content"), hash_str("different content"));
    }

    #[test]
    fn test_hash_length_is_256_bits_hex() {
        assert_eq!(hash_str("test content").len(), 64);
    }

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sample.txt");
        std::fs::write(&path, "test content").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_str("test content"));
    }

    #[test]
    fn test_hash_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.txt");
        match hash_file(&missing) {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_hash_directory_is_not_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        match hash_file(tmp.path()) {
            Err(Error::NotAFile(_)) => {}
            other => panic!("expected NotAFile, got {:?}", other.map(|_| ())),
        }
    }
}
