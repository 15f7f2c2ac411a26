//! Archive filing: deterministic destination paths and crash-safe moves.

pub mod path;
pub mod safe_move;

pub use path::{build_filing_path, owner_folder_name, primary_filing_date, FilingPath};
pub use safe_move::{safe_move, MoveReceipt};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilingError {
    #[error("Source file missing or not a regular file: {0}")]
    SourceMissing(PathBuf),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Copied size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Copied content hash does not match source")]
    ChecksumMismatch,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
