use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::AuditEntry;

/// Append one entry to the audit_log table.
pub fn insert_audit_entry(conn: &Connection, entry: &AuditEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (user_id, event_type, event_name, status, resource_type,
         resource_id, details)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.user_id,
            entry.event_type,
            entry.event_name,
            entry.status.as_str(),
            entry.resource_type,
            entry.resource_id,
            entry.details,
        ],
    )?;
    Ok(())
}

/// Audit entries for one resource, newest first. Returns (event_name, status, details).
pub fn query_audit_by_resource(
    conn: &Connection,
    resource_id: &str,
) -> Result<Vec<(String, String, String)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT event_name, status, details FROM audit_log
         WHERE resource_id = ?1
         ORDER BY log_id DESC",
    )?;
    let rows = stmt
        .query_map(params![resource_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::enums::AuditStatus;

    #[test]
    fn audit_entries_append_and_query() {
        let conn = open_memory_database().unwrap();
        let entry = AuditEntry {
            user_id: "tagger_engine".into(),
            event_type: "AGENT_ACTIVITY".into(),
            event_name: "DOCUMENT_TAGGED_AND_FILED".into(),
            status: AuditStatus::Success,
            resource_type: "document".into(),
            resource_id: "doc-1".into(),
            details: "3 tags, 2 dates".into(),
        };
        insert_audit_entry(&conn, &entry).unwrap();

        let rows = query_audit_by_resource(&conn, "doc-1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "DOCUMENT_TAGGED_AND_FILED");
        assert_eq!(rows[0].1, "SUCCESS");
    }

    #[test]
    fn audit_query_empty_for_unknown_resource() {
        let conn = open_memory_database().unwrap();
        assert!(query_audit_by_resource(&conn, "ghost").unwrap().is_empty());
    }
}
