use std::path::Path;

use rusqlite::Connection;
use serde_json::Value;

use super::{DocumentStore, StoreError};
use crate::db::repository::{audit, document, owner};
use crate::db::{open_database, open_memory_database};
use crate::models::enums::ProcessingStatus;
use crate::models::{AuditEntry, Document};

/// SQLite-backed document store.
///
/// rusqlite's `Connection` is not `Sync`, so the store is wrapped in a
/// mutex; the engine is a sequential batch and never contends on it.
pub struct SqliteStore {
    conn: std::sync::Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: std::sync::Mutex::new(open_database(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: std::sync::Mutex::new(open_memory_database()?),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a document row (ingestion normally does this; exposed for the
    /// batch runner and tests).
    pub fn insert_document(&self, doc: &Document) -> Result<(), StoreError> {
        document::insert_document(&self.conn(), doc)?;
        Ok(())
    }

    pub fn insert_owner(&self, owner_id: &str, owner_name: Option<&str>) -> Result<(), StoreError> {
        owner::insert_owner(&self.conn(), owner_id, owner_name)?;
        Ok(())
    }

    pub fn get_document(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(document::get_document(&self.conn(), id)?)
    }

    /// Audit entries for one resource, newest first.
    pub fn audit_entries_for(
        &self,
        resource_id: &str,
    ) -> Result<Vec<(String, String, String)>, StoreError> {
        Ok(audit::query_audit_by_resource(&self.conn(), resource_id)?)
    }
}

impl DocumentStore for SqliteStore {
    fn fetch_by_status(&self, status: &ProcessingStatus) -> Result<Vec<Document>, StoreError> {
        Ok(document::fetch_by_status(&self.conn(), status)?)
    }

    fn update_fields(
        &self,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<bool, StoreError> {
        Ok(document::update_document_fields(&self.conn(), id, fields)?)
    }

    fn lookup_owner_name(&self, owner_id: &str) -> Result<Option<String>, StoreError> {
        Ok(owner::get_owner_name(&self.conn(), owner_id)?)
    }

    fn append_audit_log(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        audit::insert_audit_entry(&self.conn(), entry)?;
        Ok(())
    }
}
