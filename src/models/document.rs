use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ProcessingStatus;

/// A document record as held by the document store.
///
/// The tagging engine reads `full_text`, `document_type`, `owner_id`,
/// `file_name`, `source_path` and `upload_timestamp`, and patches
/// `dates`, `issuer`, `recipient`, `tags`, `filed_path` and
/// `processing_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: Option<String>,
    pub file_name: String,
    pub source_path: Option<PathBuf>,
    pub upload_timestamp: Option<NaiveDateTime>,
    pub full_text: Option<String>,
    pub document_type: String,
    /// Context label → normalized YYYY-MM-DD. Overwritten on reprocessing.
    pub dates: BTreeMap<String, String>,
    pub issuer: Option<String>,
    pub recipient: Option<String>,
    pub tags: Vec<String>,
    /// Set iff `processing_status` is `Filed`.
    pub filed_path: Option<PathBuf>,
    pub processing_status: ProcessingStatus,
}

impl Document {
    /// A fresh record for a file entering the pipeline.
    pub fn new(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: None,
            file_name: file_name.into(),
            source_path: None,
            upload_timestamp: None,
            full_text: None,
            document_type: "Unclassified".into(),
            dates: BTreeMap::new(),
            issuer: None,
            recipient: None,
            tags: Vec::new(),
            filed_path: None,
            processing_status: ProcessingStatus::New,
        }
    }
}
