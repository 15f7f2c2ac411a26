//! Paperfile: document tagging and archival filing.
//!
//! Takes documents whose text has already been extracted and classified
//! upstream, pulls structured metadata out of that text (dates, issuer,
//! recipient, tags), and files the underlying file into a deterministic
//! archive tree with a crash-safe copy-verify-delete move. State and the
//! audit trail live in SQLite.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod store;

pub use config::EngineConfig;
pub use pipeline::{BatchOutcome, TaggerOrchestrator};
pub use store::{DocumentStore, SqliteStore};
