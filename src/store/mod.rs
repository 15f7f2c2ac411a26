//! Document-store abstraction consumed by the tagging engine.
//!
//! The engine never talks to persistence directly; it goes through
//! [`DocumentStore`] so the batch orchestrator stays testable against mock
//! implementations. [`SqliteStore`] is the shipped implementation.

pub mod sqlite;

pub use sqlite::SqliteStore;

use serde_json::Value;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::enums::ProcessingStatus;
use crate::models::{AuditEntry, Document};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Minimal contract the tagging engine needs from persistence.
pub trait DocumentStore: Send + Sync {
    /// Every document currently in the given processing status.
    fn fetch_by_status(&self, status: &ProcessingStatus) -> Result<Vec<Document>, StoreError>;

    /// Patch a subset of a document's fields. JSON objects/arrays are
    /// persisted as serialized JSON text. Returns whether a row was touched.
    fn update_fields(
        &self,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Display name for an owner, if known.
    fn lookup_owner_name(&self, owner_id: &str) -> Result<Option<String>, StoreError>;

    /// Append one audit-trail entry.
    fn append_audit_log(&self, entry: &AuditEntry) -> Result<(), StoreError>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    fn fetch_by_status(&self, status: &ProcessingStatus) -> Result<Vec<Document>, StoreError> {
        (**self).fetch_by_status(status)
    }

    fn update_fields(
        &self,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<bool, StoreError> {
        (**self).update_fields(id, fields)
    }

    fn lookup_owner_name(&self, owner_id: &str) -> Result<Option<String>, StoreError> {
        (**self).lookup_owner_name(owner_id)
    }

    fn append_audit_log(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        (**self).append_audit_log(entry)
    }
}
