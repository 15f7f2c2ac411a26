//! Crash-safe file relocation: copy, verify, then delete.
//!
//! A rename is atomic on one filesystem but destructive across two. This
//! protocol never has a moment where the only copy of the file is partial:
//! the source is deleted only after the destination is verified, and every
//! failure path removes the partial destination and leaves the source.

use std::fs;
use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::FilingError;

/// Above this size the copy is verified by content hash, not just length.
const HASH_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// What a completed move verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReceipt {
    pub bytes: u64,
    /// Base64 SHA-256 of the content, when the file was large enough to hash.
    pub sha256: Option<String>,
}

pub fn safe_move(src: &Path, dst: &Path) -> Result<MoveReceipt, FilingError> {
    let src_meta = match fs::metadata(src) {
        Ok(meta) if meta.is_file() => meta,
        _ => return Err(FilingError::SourceMissing(src.to_path_buf())),
    };
    if dst.exists() {
        return Err(FilingError::DestinationExists(dst.to_path_buf()));
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    let expected = src_meta.len();
    fs::copy(src, dst).map_err(|e| {
        remove_partial(dst);
        FilingError::Io(e)
    })?;

    let actual = match fs::metadata(dst) {
        Ok(meta) => meta.len(),
        Err(e) => {
            remove_partial(dst);
            return Err(FilingError::Io(e));
        }
    };
    if actual != expected {
        remove_partial(dst);
        return Err(FilingError::SizeMismatch { expected, actual });
    }

    let sha256 = if expected > HASH_THRESHOLD_BYTES {
        let src_hash = hash_file(src).map_err(|e| {
            remove_partial(dst);
            FilingError::Io(e)
        })?;
        let dst_hash = hash_file(dst).map_err(|e| {
            remove_partial(dst);
            FilingError::Io(e)
        })?;
        if src_hash != dst_hash {
            remove_partial(dst);
            return Err(FilingError::ChecksumMismatch);
        }
        Some(dst_hash)
    } else {
        None
    };

    // Verified. The source goes last; if even this fails, back out the copy
    // so exactly one complete file remains.
    if let Err(e) = fs::remove_file(src) {
        remove_partial(dst);
        return Err(FilingError::Io(e));
    }

    tracing::debug!(src = %src.display(), dst = %dst.display(), bytes = expected, "File moved");
    Ok(MoveReceipt {
        bytes: expected,
        sha256,
    })
}

fn remove_partial(dst: &Path) {
    if let Err(e) = fs::remove_file(dst) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dst = %dst.display(), error = %e, "Could not remove partial destination");
        }
    }
}

fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(BASE64.encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_small_file_without_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        let dst = dir.path().join("archive/2023/01/out.txt");
        fs::write(&src, b"hello").unwrap();

        let receipt = safe_move(&src, &dst).unwrap();
        assert_eq!(receipt.bytes, 5);
        assert!(receipt.sha256.is_none());
        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn large_file_is_hash_verified() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("big.bin");
        let dst = dir.path().join("out.bin");
        fs::write(&src, vec![7u8; (HASH_THRESHOLD_BYTES + 1) as usize]).unwrap();

        let receipt = safe_move(&src, &dst).unwrap();
        assert_eq!(receipt.bytes, HASH_THRESHOLD_BYTES + 1);
        assert!(receipt.sha256.is_some());
        assert!(!src.exists());
        assert!(dst.exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = safe_move(&dir.path().join("ghost.txt"), &dir.path().join("out.txt"));
        assert!(matches!(err, Err(FilingError::SourceMissing(_))));
    }

    #[test]
    fn directory_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("subdir");
        fs::create_dir(&src).unwrap();
        let err = safe_move(&src, &dir.path().join("out.txt"));
        assert!(matches!(err, Err(FilingError::SourceMissing(_))));
    }

    #[test]
    fn existing_destination_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        let dst = dir.path().join("out.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"precious").unwrap();

        let err = safe_move(&src, &dst);
        assert!(matches!(err, Err(FilingError::DestinationExists(_))));
        assert_eq!(fs::read(&src).unwrap(), b"new");
        assert_eq!(fs::read(&dst).unwrap(), b"precious");
    }

    #[test]
    fn failed_copy_leaves_source_and_no_partial_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        fs::write(&src, b"content").unwrap();

        // Destination parent is a file, so create_dir_all fails.
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();
        let dst = blocker.join("out.txt");

        let err = safe_move(&src, &dst);
        assert!(matches!(err, Err(FilingError::Io(_))));
        assert_eq!(fs::read(&src).unwrap(), b"content");
        assert!(!dst.exists());
    }
}
