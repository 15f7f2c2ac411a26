//! Batch orchestration: fetch, tag, file, persist, audit.
//!
//! One instance processes its batch strictly sequentially. Failures are
//! confined to the document that caused them; the batch always runs to the
//! end. Audit writes are best-effort and never block a state transition.

use std::path::PathBuf;

use chrono::Utc;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::models::enums::{AuditStatus, ProcessingStatus};
use crate::models::{AuditEntry, Document};
use crate::pipeline::filing::{self, build_filing_path, owner_folder_name, primary_filing_date};
use crate::pipeline::tagging::{DateExtractor, EntityExtractor, TagExtractor, ValidationFilter};
use crate::store::{DocumentStore, StoreError};

const AUDIT_EVENT_TYPE: &str = "AGENT_ACTIVITY";
const AUDIT_RESOURCE_TYPE: &str = "document";

#[derive(Error, Debug)]
pub enum TaggerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Tally of one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub processed: usize,
    pub filed: usize,
    pub skipped: usize,
    pub failed: usize,
}

struct ExtractedMetadata {
    dates: std::collections::BTreeMap<String, String>,
    issuer: Option<String>,
    recipient: Option<String>,
    tags: Vec<String>,
}

pub struct TaggerOrchestrator {
    store: Box<dyn DocumentStore>,
    config: EngineConfig,
    dates: DateExtractor,
    entities: EntityExtractor,
    tags: TagExtractor,
    filter: ValidationFilter,
}

impl TaggerOrchestrator {
    pub fn new(store: Box<dyn DocumentStore>, config: EngineConfig) -> Self {
        let entities = EntityExtractor::new(&config.known_issuers);
        let tags = TagExtractor::new(&config.tag_definitions);
        Self {
            store,
            config,
            dates: DateExtractor::new(),
            entities,
            tags,
            filter: ValidationFilter::new(),
        }
    }

    /// Process every document currently in the configured entry status.
    ///
    /// Assumes it is the only instance running against this store: there
    /// is no status-guarded conditional update, so two concurrent batches
    /// could both pick up the same document.
    pub fn run_batch(&self) -> Result<BatchOutcome, TaggerError> {
        let batch = self.store.fetch_by_status(&self.config.status_to_process)?;
        tracing::info!(count = batch.len(), status = %self.config.status_to_process.as_str(), "Starting batch");

        let mut outcome = BatchOutcome::default();
        for doc in batch {
            outcome.processed += 1;
            match self.process_document(&doc) {
                Ok(ProcessingStatus::Filed) => outcome.filed += 1,
                Ok(ProcessingStatus::TaggingSkippedNoText) => outcome.skipped += 1,
                Ok(_) | Err(_) => outcome.failed += 1,
            }
        }

        tracing::info!(
            processed = outcome.processed,
            filed = outcome.filed,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Batch complete"
        );
        Ok(outcome)
    }

    /// One document, one terminal status. Store failures while persisting
    /// the outcome are the only error this returns.
    fn process_document(&self, doc: &Document) -> Result<ProcessingStatus, StoreError> {
        let text = match doc.full_text.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                tracing::info!(doc_id = %doc.id, "No text to process, skipping");
                self.persist_skip(doc)?;
                return Ok(ProcessingStatus::TaggingSkippedNoText);
            }
        };

        let metadata = self.extract_metadata(text, &doc.document_type);
        match self.file_document(doc, &metadata) {
            Ok(filed_path) => {
                self.persist_success(doc, &metadata, &filed_path)?;
                Ok(ProcessingStatus::Filed)
            }
            Err(e) => {
                tracing::warn!(doc_id = %doc.id, error = %e, "Filing failed");
                self.persist_failure(doc, &metadata, &e)?;
                Ok(ProcessingStatus::FilingError)
            }
        }
    }

    fn extract_metadata(&self, text: &str, document_type: &str) -> ExtractedMetadata {
        let dates = self.filter.filter_dates(self.dates.extract(text));
        let issuer = self.filter.filter_entity(self.entities.extract_issuer(text));
        let recipient = self
            .filter
            .filter_entity(self.entities.extract_recipient(text));
        let tags = self.filter.filter_tags(self.tags.extract(text, document_type));
        ExtractedMetadata {
            dates,
            issuer,
            recipient,
            tags,
        }
    }

    fn file_document(
        &self,
        doc: &Document,
        metadata: &ExtractedMetadata,
    ) -> Result<PathBuf, filing::FilingError> {
        let source = doc
            .source_path
            .clone()
            .ok_or_else(|| filing::FilingError::SourceMissing(PathBuf::from(&doc.file_name)))?;

        let owner_folder = doc.owner_id.as_deref().map(|owner_id| {
            let display = match self.store.lookup_owner_name(owner_id) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, error = %e, "Owner lookup failed, using raw id");
                    None
                }
            };
            owner_folder_name(owner_id, display.as_deref())
        });

        let primary = primary_filing_date(
            &metadata.dates,
            doc.upload_timestamp,
            Utc::now().date_naive(),
        );
        let filing_path = build_filing_path(
            doc,
            metadata.issuer.as_deref(),
            owner_folder.as_deref(),
            primary,
        );
        let destination = filing_path.join_under(&self.config.archive_root);

        filing::safe_move(&source, &destination)?;
        Ok(destination)
    }

    fn metadata_fields(&self, metadata: &ExtractedMetadata) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            "document_dates".into(),
            json!(metadata.dates.clone()),
        );
        if let Some(issuer) = &metadata.issuer {
            fields.insert("issuer_source".into(), json!(issuer));
        }
        if let Some(recipient) = &metadata.recipient {
            fields.insert("recipient".into(), json!(recipient));
        }
        fields.insert("tags_extracted".into(), json!(metadata.tags.clone()));
        fields
    }

    fn persist_skip(&self, doc: &Document) -> Result<(), StoreError> {
        let mut fields = Map::new();
        fields.insert(
            "processing_status".into(),
            json!(ProcessingStatus::TaggingSkippedNoText.as_str()),
        );
        self.store.update_fields(&doc.id, &fields)?;
        self.audit(
            doc,
            "DOCUMENT_TAGGING_SKIPPED",
            AuditStatus::Skipped,
            "Document has no extracted text".to_string(),
        );
        Ok(())
    }

    fn persist_success(
        &self,
        doc: &Document,
        metadata: &ExtractedMetadata,
        filed_path: &std::path::Path,
    ) -> Result<(), StoreError> {
        let mut fields = self.metadata_fields(metadata);
        fields.insert(
            "filed_path".into(),
            json!(filed_path.to_string_lossy()),
        );
        fields.insert(
            "processing_status".into(),
            json!(self.config.status_after_filing.as_str()),
        );
        self.store.update_fields(&doc.id, &fields)?;

        tracing::info!(doc_id = %doc.id, filed_path = %filed_path.display(), "Document filed");
        self.audit(
            doc,
            "DOCUMENT_TAGGED_AND_FILED",
            AuditStatus::Success,
            format!(
                "dates={}, tags={}, issuer={}, filed_path={}",
                metadata.dates.len(),
                metadata.tags.len(),
                metadata.issuer.as_deref().unwrap_or("-"),
                filed_path.display()
            ),
        );
        Ok(())
    }

    fn persist_failure(
        &self,
        doc: &Document,
        metadata: &ExtractedMetadata,
        error: &filing::FilingError,
    ) -> Result<(), StoreError> {
        // Partial metadata still has diagnostic value; filed_path stays unset.
        let mut fields = self.metadata_fields(metadata);
        fields.insert(
            "processing_status".into(),
            json!(ProcessingStatus::FilingError.as_str()),
        );
        self.store.update_fields(&doc.id, &fields)?;
        self.audit(
            doc,
            "DOCUMENT_TAGGED_AND_FILED",
            AuditStatus::Failure,
            format!("Filing failed: {error}"),
        );
        Ok(())
    }

    fn audit(&self, doc: &Document, event_name: &str, status: AuditStatus, details: String) {
        let entry = AuditEntry {
            user_id: self.config.audit_user_id.clone(),
            event_type: AUDIT_EVENT_TYPE.to_string(),
            event_name: event_name.to_string(),
            status,
            resource_type: AUDIT_RESOURCE_TYPE.to_string(),
            resource_id: doc.id.clone(),
            details,
        };
        if let Err(e) = self.store.append_audit_log(&entry) {
            tracing::warn!(doc_id = %doc.id, error = %e, "Audit write failed");
        }
    }
}
