use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use serde::Serialize;
use uuid::Uuid;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::genome::SourceFormat;

/// One sealed report row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub id: Uuid,
    pub owner_email: String,
    pub checkout_id: String,
    pub source_format: SourceFormat,
    pub insight_count: usize,
    /// `SealedBlob` bytes
    pub sealed: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Row metadata without the blob, for listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportListing {
    pub id: Uuid,
    pub checkout_id: String,
    pub insight_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Persist-blob port. Implementations must be safe to share across
/// request handlers.
pub trait ReportStore: Send + Sync {
    fn insert(&self, record: &ReportRecord) -> Result<(), DatabaseError>;
    fn find(&self, id: &Uuid) -> Result<Option<ReportRecord>, DatabaseError>;
    fn find_by_checkout(&self, checkout_id: &str) -> Result<Option<ReportRecord>, DatabaseError>;
    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError>;
    fn list_for_owner(&self, email: &str) -> Result<Vec<ReportListing>, DatabaseError>;
}

// ═══════════════════════════════════════════
// Report queries
// ═══════════════════════════════════════════

const REPORT_COLUMNS: &str =
    "id, owner_email, checkout_id, source_format, insight_count, sealed, created_at";

pub fn insert_report(conn: &Connection, record: &ReportRecord) -> Result<(), DatabaseError> {
    let result = conn.execute(
        "INSERT INTO reports (id, owner_email, checkout_id, source_format, insight_count, sealed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.owner_email,
            record.checkout_id,
            record.source_format.as_str(),
            record.insight_count as i64,
            record.sealed,
            record.created_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, msg))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(
                msg.unwrap_or_else(|| "reports".into()),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<ReportRecord>, DatabaseError> {
    query_one(
        conn,
        &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
        &id.to_string(),
    )
}

pub fn get_report_by_checkout(
    conn: &Connection,
    checkout_id: &str,
) -> Result<Option<ReportRecord>, DatabaseError> {
    query_one(
        conn,
        &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE checkout_id = ?1"),
        checkout_id,
    )
}

pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM reports WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn list_reports_for_owner(
    conn: &Connection,
    email: &str,
) -> Result<Vec<ReportListing>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, checkout_id, insight_count, created_at FROM reports
         WHERE owner_email = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![email], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut listings = Vec::new();
    for row in rows {
        let (id, checkout_id, insight_count, created_at) = row?;
        listings.push(ReportListing {
            id: parse_uuid(&id)?,
            checkout_id,
            insight_count: insight_count.max(0) as usize,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(listings)
}

struct ReportRow {
    id: String,
    owner_email: String,
    checkout_id: String,
    source_format: String,
    insight_count: i64,
    sealed: Vec<u8>,
    created_at: String,
}

fn query_one(
    conn: &Connection,
    sql: &str,
    key: &str,
) -> Result<Option<ReportRecord>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let result = stmt.query_row(params![key], |row| {
        Ok(ReportRow {
            id: row.get(0)?,
            owner_email: row.get(1)?,
            checkout_id: row.get(2)?,
            source_format: row.get(3)?,
            insight_count: row.get(4)?,
            sealed: row.get(5)?,
            created_at: row.get(6)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(record_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn record_from_row(row: ReportRow) -> Result<ReportRecord, DatabaseError> {
    Ok(ReportRecord {
        id: parse_uuid(&row.id)?,
        owner_email: row.owner_email,
        checkout_id: row.checkout_id,
        source_format: row
            .source_format
            .parse()
            .map_err(|_| DatabaseError::InvalidValue {
                field: "source_format".into(),
                value: row.source_format.clone(),
            })?,
        insight_count: row.insight_count.max(0) as usize,
        sealed: row.sealed,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|_| DatabaseError::InvalidValue {
        field: "id".into(),
        value: raw.into(),
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidValue {
            field: "created_at".into(),
            value: raw.into(),
        })
}

// ═══════════════════════════════════════════
// SQLite-backed store
// ═══════════════════════════════════════════

/// `ReportStore` over a single serialized SQLite connection
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
}

impl SqliteReportStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_database(path)?),
        })
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_memory_database()?),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

impl ReportStore for SqliteReportStore {
    fn insert(&self, record: &ReportRecord) -> Result<(), DatabaseError> {
        self.with_conn(|conn| insert_report(conn, record))
    }

    fn find(&self, id: &Uuid) -> Result<Option<ReportRecord>, DatabaseError> {
        self.with_conn(|conn| get_report(conn, id))
    }

    fn find_by_checkout(&self, checkout_id: &str) -> Result<Option<ReportRecord>, DatabaseError> {
        self.with_conn(|conn| get_report_by_checkout(conn, checkout_id))
    }

    fn delete(&self, id: &Uuid) -> Result<(), DatabaseError> {
        self.with_conn(|conn| delete_report(conn, id))
    }

    fn list_for_owner(&self, email: &str) -> Result<Vec<ReportListing>, DatabaseError> {
        self.with_conn(|conn| list_reports_for_owner(conn, email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(checkout_id: &str, email: &str) -> ReportRecord {
        ReportRecord {
            id: Uuid::new_v4(),
            owner_email: email.into(),
            checkout_id: checkout_id.into(),
            source_format: SourceFormat::AncestryDna,
            insight_count: 12,
            sealed: vec![1, 2, 3, 4],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_find() {
        let store = SqliteReportStore::in_memory().unwrap();
        let rec = record("chk_1", "ada@example.com");
        store.insert(&rec).unwrap();

        let found = store.find(&rec.id).unwrap().unwrap();
        assert_eq!(found.id, rec.id);
        assert_eq!(found.sealed, rec.sealed);
        assert_eq!(found.source_format, SourceFormat::AncestryDna);
        assert_eq!(found.insight_count, 12);
    }

    #[test]
    fn find_missing_returns_none() {
        let store = SqliteReportStore::in_memory().unwrap();
        assert!(store.find(&Uuid::new_v4()).unwrap().is_none());
        assert!(store.find_by_checkout("nope").unwrap().is_none());
    }

    #[test]
    fn checkout_redeems_once() {
        let store = SqliteReportStore::in_memory().unwrap();
        store.insert(&record("chk_dup", "ada@example.com")).unwrap();
        let result = store.insert(&record("chk_dup", "ada@example.com"));
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn find_by_checkout() {
        let store = SqliteReportStore::in_memory().unwrap();
        let rec = record("chk_42", "ada@example.com");
        store.insert(&rec).unwrap();
        assert_eq!(store.find_by_checkout("chk_42").unwrap().unwrap().id, rec.id);
    }

    #[test]
    fn delete_removes_row() {
        let store = SqliteReportStore::in_memory().unwrap();
        let rec = record("chk_del", "ada@example.com");
        store.insert(&rec).unwrap();
        store.delete(&rec.id).unwrap();
        assert!(store.find(&rec.id).unwrap().is_none());
        assert!(matches!(
            store.delete(&rec.id),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn list_for_owner_newest_first() {
        let store = SqliteReportStore::in_memory().unwrap();
        let mut older = record("chk_a", "ada@example.com");
        older.created_at = Utc::now() - Duration::days(3);
        let newer = record("chk_b", "ada@example.com");
        store.insert(&older).unwrap();
        store.insert(&newer).unwrap();
        store.insert(&record("chk_c", "bob@example.com")).unwrap();

        let listings = store.list_for_owner("ada@example.com").unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, newer.id);
        assert_eq!(listings[1].id, older.id);
    }

    #[test]
    fn on_disk_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.db");
        let rec = record("chk_disk", "ada@example.com");
        {
            let store = SqliteReportStore::open(&path).unwrap();
            store.insert(&rec).unwrap();
        }
        let reopened = SqliteReportStore::open(&path).unwrap();
        assert_eq!(reopened.find(&rec.id).unwrap().unwrap().checkout_id, "chk_disk");
    }
}
