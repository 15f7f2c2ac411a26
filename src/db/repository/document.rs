use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use serde_json::Value;

use crate::db::DatabaseError;
use crate::models::enums::ProcessingStatus;
use crate::models::Document;

const SELECT_COLUMNS: &str = "document_id, owner_id, file_name, source_path, upload_timestamp,
     extracted_text, document_type, processing_status, document_dates, issuer_source,
     recipient, tags_extracted, filed_path";

/// Columns the engine is allowed to patch through `update_document_fields`.
const UPDATABLE_COLUMNS: &[&str] = &[
    "owner_id",
    "file_name",
    "source_path",
    "extracted_text",
    "document_type",
    "processing_status",
    "document_dates",
    "issuer_source",
    "recipient",
    "tags_extracted",
    "filed_path",
];

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (document_id, owner_id, file_name, source_path, upload_timestamp,
         extracted_text, document_type, processing_status, document_dates, issuer_source,
         recipient, tags_extracted, filed_path)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            doc.id,
            doc.owner_id,
            doc.file_name,
            doc.source_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
            doc.upload_timestamp.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            doc.full_text,
            doc.document_type,
            doc.processing_status.as_str(),
            if doc.dates.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&doc.dates).unwrap_or_default())
            },
            doc.issuer,
            doc.recipient,
            if doc.tags.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&doc.tags).unwrap_or_default())
            },
            doc.filed_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &str) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM documents WHERE document_id = ?1"
    ))?;

    let result = stmt.query_row(params![id], read_row);
    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch every document in the given processing status, oldest upload first.
pub fn fetch_by_status(
    conn: &Connection,
    status: &ProcessingStatus,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM documents
         WHERE processing_status = ?1
         ORDER BY upload_timestamp ASC, document_id ASC"
    ))?;

    let rows = stmt
        .query_map(params![status.as_str()], read_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(document_from_row).collect()
}

/// Patch a subset of document columns. Returns whether a row was touched.
///
/// Only columns in the whitelist may be patched; anything else is a bug in
/// the caller, reported as `UnknownField`.
pub fn update_document_fields(
    conn: &Connection,
    id: &str,
    fields: &serde_json::Map<String, Value>,
) -> Result<bool, DatabaseError> {
    if fields.is_empty() {
        return Ok(false);
    }

    let mut set_clauses = Vec::with_capacity(fields.len());
    let mut sql_params: Vec<rusqlite::types::Value> = Vec::with_capacity(fields.len() + 1);

    for (column, value) in fields {
        if !UPDATABLE_COLUMNS.contains(&column.as_str()) {
            return Err(DatabaseError::UnknownField(column.clone()));
        }
        sql_params.push(value_to_sql(value));
        set_clauses.push(format!("{column} = ?{}", sql_params.len()));
    }

    sql_params.push(rusqlite::types::Value::Text(id.to_string()));
    let sql = format!(
        "UPDATE documents SET {}, last_modified_timestamp = CURRENT_TIMESTAMP
         WHERE document_id = ?{}",
        set_clauses.join(", "),
        sql_params.len()
    );

    let rows = conn.execute(&sql, rusqlite::params_from_iter(sql_params))?;
    Ok(rows > 0)
}

fn value_to_sql(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        // JSON objects and arrays land in TEXT columns as serialized JSON
        // (document_dates, tags_extracted).
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

struct DocumentRow {
    id: String,
    owner_id: Option<String>,
    file_name: Option<String>,
    source_path: Option<String>,
    upload_timestamp: Option<String>,
    full_text: Option<String>,
    document_type: String,
    processing_status: String,
    dates: Option<String>,
    issuer: Option<String>,
    recipient: Option<String>,
    tags: Option<String>,
    filed_path: Option<String>,
}

fn read_row(row: &Row) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        file_name: row.get(2)?,
        source_path: row.get(3)?,
        upload_timestamp: row.get(4)?,
        full_text: row.get(5)?,
        document_type: row.get(6)?,
        processing_status: row.get(7)?,
        dates: row.get(8)?,
        issuer: row.get(9)?,
        recipient: row.get(10)?,
        tags: row.get(11)?,
        filed_path: row.get(12)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    let dates: BTreeMap<String, String> = match row.dates {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| DatabaseError::InvalidJson {
            column: "document_dates".into(),
            reason: e.to_string(),
        })?,
        None => BTreeMap::new(),
    };
    let tags: Vec<String> = match row.tags {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| DatabaseError::InvalidJson {
            column: "tags_extracted".into(),
            reason: e.to_string(),
        })?,
        None => Vec::new(),
    };

    Ok(Document {
        id: row.id,
        owner_id: row.owner_id,
        file_name: row.file_name.unwrap_or_else(|| "unknown_file".into()),
        source_path: row.source_path.map(PathBuf::from),
        upload_timestamp: row.upload_timestamp.as_deref().and_then(parse_timestamp),
        full_text: row.full_text,
        document_type: row.document_type,
        dates,
        issuer: row.issuer,
        recipient: row.recipient,
        tags,
        filed_path: row.filed_path.map(PathBuf::from),
        processing_status: ProcessingStatus::from_str(&row.processing_status)?,
    })
}

/// SQLite's CURRENT_TIMESTAMP writes "YYYY-MM-DD HH:MM:SS"; callers may also
/// have stored ISO 8601 with a T separator or a trailing Z.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use serde_json::json;

    fn sample_doc(id: &str) -> Document {
        let mut doc = Document::new(id, "invoice.pdf");
        doc.full_text = Some("Invoice from ACME".into());
        doc.document_type = "Invoice".into();
        doc.processing_status = ProcessingStatus::Summarized;
        doc
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        insert_document(&conn, &sample_doc("doc-1")).unwrap();

        let doc = get_document(&conn, "doc-1").unwrap().unwrap();
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.file_name, "invoice.pdf");
        assert_eq!(doc.document_type, "Invoice");
        assert_eq!(doc.processing_status, ProcessingStatus::Summarized);
        assert!(doc.dates.is_empty());
        assert!(doc.filed_path.is_none());
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_document(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn fetch_by_status_filters() {
        let conn = open_memory_database().unwrap();
        insert_document(&conn, &sample_doc("doc-1")).unwrap();
        let mut other = sample_doc("doc-2");
        other.processing_status = ProcessingStatus::Filed;
        insert_document(&conn, &other).unwrap();

        let found = fetch_by_status(&conn, &ProcessingStatus::Summarized).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "doc-1");
    }

    #[test]
    fn update_fields_patches_and_reports_rows() {
        let conn = open_memory_database().unwrap();
        insert_document(&conn, &sample_doc("doc-1")).unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert("issuer_source".into(), json!("ACME Corporation"));
        fields.insert("document_dates".into(), json!({"invoice_date": "2023-01-15"}));
        fields.insert("tags_extracted".into(), json!(["urgent"]));
        fields.insert("processing_status".into(), json!("filed"));
        fields.insert("filed_path".into(), json!("/archive/2023/01/x.pdf"));

        assert!(update_document_fields(&conn, "doc-1", &fields).unwrap());

        let doc = get_document(&conn, "doc-1").unwrap().unwrap();
        assert_eq!(doc.issuer.as_deref(), Some("ACME Corporation"));
        assert_eq!(doc.dates.get("invoice_date").map(String::as_str), Some("2023-01-15"));
        assert_eq!(doc.tags, vec!["urgent"]);
        assert_eq!(doc.processing_status, ProcessingStatus::Filed);
        assert_eq!(doc.filed_path, Some(PathBuf::from("/archive/2023/01/x.pdf")));
    }

    #[test]
    fn update_unknown_document_reports_no_rows() {
        let conn = open_memory_database().unwrap();
        let mut fields = serde_json::Map::new();
        fields.insert("issuer_source".into(), json!("X Corp"));
        assert!(!update_document_fields(&conn, "ghost", &fields).unwrap());
    }

    #[test]
    fn update_rejects_unknown_column() {
        let conn = open_memory_database().unwrap();
        insert_document(&conn, &sample_doc("doc-1")).unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert("document_id".into(), json!("doc-2"));
        let err = update_document_fields(&conn, "doc-1", &fields).unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownField(_)));
    }

    #[test]
    fn upload_timestamp_round_trips() {
        let conn = open_memory_database().unwrap();
        let mut doc = sample_doc("doc-ts");
        let stamp = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        doc.upload_timestamp = Some(stamp);
        insert_document(&conn, &doc).unwrap();

        let fetched = get_document(&conn, "doc-ts").unwrap().unwrap();
        assert_eq!(fetched.upload_timestamp, Some(stamp));
    }

    #[test]
    fn timestamp_parsing_accepts_sqlite_and_iso_forms() {
        assert!(parse_timestamp("2023-06-01 10:30:00").is_some());
        assert!(parse_timestamp("2023-06-01T10:30:00").is_some());
        assert!(parse_timestamp("2023-06-01T10:30:00Z").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }
}
