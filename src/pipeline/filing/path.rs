//! Deterministic archive path construction.
//!
//! Pure functions only. The orchestrator resolves owner display names and
//! supplies the current time, so two calls with equal inputs always produce
//! the same directory and filename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::models::Document;

/// Priority order of date contexts when picking the filing date.
const PRIMARY_DATE_KEYS: [&str; 4] = ["invoice_date", "letter_date", "visit_date", "report_date"];

const MAX_COMPONENT_LEN: usize = 50;

/// Destination of a document, relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingPath {
    pub relative_dir: PathBuf,
    pub file_name: String,
}

impl FilingPath {
    pub fn join_under(&self, archive_root: &Path) -> PathBuf {
        archive_root.join(&self.relative_dir).join(&self.file_name)
    }
}

/// Make a string safe as a single path component: spaces become
/// underscores, anything outside `[A-Za-z0-9_-]` is dropped, the result is
/// capped at 50 characters and never empty.
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == ' ' {
            out.push('_');
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        }
    }
    out.truncate(MAX_COMPONENT_LEN);
    if out.is_empty() {
        "Unknown".to_string()
    } else {
        out
    }
}

fn doc_type_abbrev(document_type: &str) -> &'static str {
    match document_type {
        "Invoice" => "INV",
        "Medical Record" => "MEDREC",
        "Letter" => "LTR",
        "Report" => "RPT",
        "Insurance Document" => "INS",
        "Legal Document" => "LEGAL",
        "Receipt" => "RCPT",
        _ => "UNC",
    }
}

/// Folder name for an owned document: `<SanitizedName>_<first 6 of id>`,
/// or the sanitized raw id when no display name is known.
pub fn owner_folder_name(owner_id: &str, display_name: Option<&str>) -> String {
    match display_name {
        Some(name) => {
            let id_prefix: String = owner_id.chars().take(6).collect();
            format!("{}_{}", sanitize_component(name), id_prefix)
        }
        None => sanitize_component(owner_id),
    }
}

/// Pick the date the archive tree is organized around.
///
/// Context keys are tried in priority order, then the earliest parseable
/// date of any key, then the upload timestamp, then `now`.
pub fn primary_filing_date(
    dates: &BTreeMap<String, String>,
    upload_timestamp: Option<NaiveDateTime>,
    now: NaiveDate,
) -> NaiveDate {
    for key in PRIMARY_DATE_KEYS {
        if let Some(date) = dates.get(key).and_then(|v| parse_iso(v)) {
            return date;
        }
    }
    if let Some(earliest) = dates.values().filter_map(|v| parse_iso(v)).min() {
        return earliest;
    }
    if let Some(ts) = upload_timestamp {
        return ts.date();
    }
    now
}

fn parse_iso(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Compute where a document belongs in the archive.
pub fn build_filing_path(
    doc: &Document,
    issuer: Option<&str>,
    owner_folder: Option<&str>,
    primary_date: NaiveDate,
) -> FilingPath {
    let year = format!("{:04}", primary_date.year());
    let month = format!("{:02}", primary_date.month());

    let relative_dir = match owner_folder {
        Some(folder) => PathBuf::from("patients").join(folder).join(&year).join(&month),
        None => {
            let mut dir = PathBuf::from("general_archive");
            if doc.document_type == "Unclassified" || issuer.is_none() {
                dir.push("Uncategorized");
            }
            dir.join(&year).join(&month)
        }
    };

    let info = if owner_folder.is_some() {
        sanitize_component(file_stem(&doc.file_name))
    } else {
        match issuer {
            Some(name) => sanitize_component(name),
            None => "UnknownSource".to_string(),
        }
    };

    let id_prefix: String = doc.id.chars().take(8).collect();
    let ext = file_extension(&doc.file_name).unwrap_or_else(|| ".txt".to_string());
    let file_name = format!(
        "{}_{}_{}-{}{}",
        primary_date.format("%Y-%m-%d"),
        info,
        doc_type_abbrev(&doc.document_type),
        id_prefix,
        ext
    );

    FilingPath {
        relative_dir,
        file_name,
    }
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
}
