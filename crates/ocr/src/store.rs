use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// Compute SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Derive the content-addressed storage path for an uploaded document.
/// Layout: `<base>/<first_2_hex_chars>/<full_hex>.<ext>`
pub fn document_path(documents_dir: &Path, hash_hex: &str, ext: &str) -> PathBuf {
    documents_dir
        .join(&hash_hex[..2])
        .join(format!("{hash_hex}.{ext}"))
}

/// Write `data` to `dest` atomically: write a sibling temp file first and
/// rename it into place. Readers never observe a half-written document.
pub async fn write_atomic(dest: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = dest.with_extension("tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, dest).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_known_vector() {
        // SHA-256 of empty bytes is a known constant.
        let hex = to_hex(&sha256_bytes(b""));
        assert_eq!(
            hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_bytes_deterministic() {
        assert_eq!(sha256_bytes(b"hello"), sha256_bytes(b"hello"));
        assert_ne!(sha256_bytes(b"hello"), sha256_bytes(b"world"));
    }

    #[test]
    fn document_path_layout() {
        let base = PathBuf::from("/data/documents");
        let hash = "abcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890";
        let path = document_path(&base, hash, "jpg");
        assert_eq!(
            path,
            PathBuf::from(
                "/data/documents/ab/abcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890.jpg"
            )
        );
    }

    #[tokio::test]
    async fn write_atomic_creates_parents_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ab").join("file.txt");
        write_atomic(&dest, b"payload").await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"payload");
        assert!(!dest.with_extension("tmp").exists());
    }
}
