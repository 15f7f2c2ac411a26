use rusqlite::{params, Connection};

use crate::db::DatabaseError;

pub fn insert_owner(
    conn: &Connection,
    owner_id: &str,
    owner_name: Option<&str>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO owners (owner_id, owner_name) VALUES (?1, ?2)",
        params![owner_id, owner_name],
    )?;
    Ok(())
}

/// Display name for an owner, if the record exists and carries one.
pub fn get_owner_name(conn: &Connection, owner_id: &str) -> Result<Option<String>, DatabaseError> {
    let result = conn.query_row(
        "SELECT owner_name FROM owners WHERE owner_id = ?1",
        params![owner_id],
        |row| row.get::<_, Option<String>>(0),
    );
    match result {
        Ok(name) => Ok(name),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
