//! Proof-photo file helpers.
//!
//! The queue stores a file path, never image bytes; the photo is only read
//! (and base64-encoded) at send time. A missing or unreadable file must
//! degrade to an empty proof field, since one bad file may not abort a
//! whole bulk payload.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Read and base64-encode a proof file. Returns the empty string when the
/// path is absent, blank, or unreadable.
pub async fn encode_proof(path: Option<&str>) -> String {
    let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
        return String::new();
    };
    match fs::read(path).await {
        Ok(bytes) => BASE64.encode(bytes),
        Err(e) => {
            debug!(path, error = %e, "proof file unreadable, sending empty proof");
            String::new()
        }
    }
}

/// Best-effort removal of a proof file after the server acknowledged the
/// record. Failure is logged, never propagated.
pub async fn delete_proof(path: Option<&str>) {
    let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
        return;
    };
    match fs::remove_file(path).await {
        Ok(()) => debug!(path, "deleted proof file"),
        Err(e) => warn!(path, error = %e, "could not delete proof file"),
    }
}

/// Persist captured proof bytes under a fresh uuid-named file and return
/// the path to store in the queue row.
pub async fn save_proof(dir: &Path, bytes: &[u8]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.jpg", Uuid::new_v4()));
    fs::write(&path, bytes).await?;
    debug!(path = %path.display(), size = bytes.len(), "saved proof file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_or_blank_path_encodes_empty() {
        assert_eq!(encode_proof(None).await, "");
        assert_eq!(encode_proof(Some("")).await, "");
        assert_eq!(encode_proof(Some("/nonexistent/proof.jpg")).await, "");
    }

    #[tokio::test]
    async fn encode_round_trips_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_proof(dir.path(), b"jpeg-bytes").await.unwrap();

        let encoded = encode_proof(path.to_str()).await;
        assert_eq!(BASE64.decode(encoded).unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn delete_is_silent_on_missing_file() {
        delete_proof(Some("/nonexistent/proof.jpg")).await;
        delete_proof(None).await;
    }

    #[tokio::test]
    async fn delete_removes_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_proof(dir.path(), b"x").await.unwrap();
        assert!(path.exists());

        delete_proof(path.to_str()).await;
        assert!(!path.exists());
    }
}
