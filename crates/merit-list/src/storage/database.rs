//! SQLite database holding schema-less record collections
//!
//! Each record is stored as a JSON object in insertion order. Field lookups go
//! through `json_each`, so header names with embedded control characters
//! never have to be written as JSON paths.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Applicant, EntryKey, ExamType, Record};

/// SQLite-based record collection database
pub struct RecordDb {
    conn: Arc<Mutex<Connection>>,
}

/// Counts for diagnostics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RecordDbStats {
    pub collections: usize,
    pub records: usize,
    pub applicants: usize,
}

impl RecordDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::store(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#).map_err(|e| Error::store(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            -- One row per record; id preserves insertion order
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                exam_type TEXT,
                entry_key TEXT,
                inserted_at TEXT NOT NULL,
                FOREIGN KEY (collection) REFERENCES collections(name)
            );

            CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
            CREATE INDEX IF NOT EXISTS idx_records_entry_key ON records(collection, entry_key);

            CREATE TABLE IF NOT EXISTS applicants (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL,
                name TEXT NOT NULL,
                contact_number TEXT NOT NULL,
                preferred_branch TEXT NOT NULL,
                email TEXT NOT NULL,
                submitted_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_applicants_application_id ON applicants(application_id);
        "#)
        .map_err(|e| Error::store(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // ==================== Collections ====================

    pub fn collection_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT 1 FROM collections WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Create a collection. Fails with `CollectionExists` if the name is taken.
    pub fn create_collection(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::CollectionExists(name.to_string()))
            }
            Err(e) => Err(Error::store(format!("Failed to create collection {}: {}", name, e))),
        }
    }

    pub fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    // ==================== Records ====================

    /// Insert records in one transaction. Returns the number inserted.
    pub fn insert_records(&self, collection: &str, records: &[Record]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO records (collection, data, inserted_at) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                let data = serde_json::to_string(record)?;
                stmt.execute(params![collection, data, now])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// All records of a collection in insertion order
    pub fn find_all(&self, collection: &str) -> Result<Vec<Record>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT data FROM records WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![collection], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        decode_records(rows)
    }

    /// Records whose text field `field` equals `value` exactly
    pub fn find_by_field(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Record>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT r.data FROM records r, json_each(r.data) AS f
            WHERE r.collection = ?1
              AND f.key = ?2
              AND f.type = 'text'
              AND f.value = ?3
            ORDER BY r.id
            "#,
        )?;
        let rows = stmt
            .query_map(params![collection, field, value], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        decode_records(rows)
    }

    /// First record of a collection in insertion order
    pub fn first(&self, collection: &str) -> Result<Option<Record>> {
        let conn = self.conn.lock();
        let data = conn
            .query_row(
                "SELECT data FROM records WHERE collection = ?1 ORDER BY id LIMIT 1",
                params![collection],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d).map_err(Error::from))
            .transpose()
    }

    pub fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ==================== Merit list entries ====================

    pub fn contains_entry(&self, collection: &str, key: &EntryKey) -> Result<bool> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT 1 FROM records WHERE collection = ?1 AND entry_key = ?2 LIMIT 1",
                params![collection, key.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Unconditional insert of a keyed entry
    pub fn insert_entry(
        &self,
        collection: &str,
        key: &EntryKey,
        exam_type: ExamType,
        record: &Record,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO records (collection, data, exam_type, entry_key, inserted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                collection,
                serde_json::to_string(record)?,
                exam_type.as_str(),
                key.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert a keyed entry unless one with the same key exists.
    /// Check and write happen in a single statement. Returns whether a row was written.
    pub fn insert_entry_if_absent(
        &self,
        collection: &str,
        key: &EntryKey,
        exam_type: ExamType,
        record: &Record,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            r#"
            INSERT INTO records (collection, data, exam_type, entry_key, inserted_at)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE NOT EXISTS (
                SELECT 1 FROM records WHERE collection = ?1 AND entry_key = ?4
            )
            "#,
            params![
                collection,
                serde_json::to_string(record)?,
                exam_type.as_str(),
                key.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    // ==================== Applicants ====================

    pub fn insert_applicant(&self, applicant: &Applicant) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO applicants (
                id, application_id, name, contact_number, preferred_branch, email, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                applicant.id.to_string(),
                applicant.application_id,
                applicant.name,
                applicant.contact_number,
                applicant.preferred_branch,
                applicant.email,
                applicant.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Applicants with the given application id, oldest first
    pub fn applicants_by_application_id(&self, application_id: &str) -> Result<Vec<Applicant>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, application_id, name, contact_number, preferred_branch, email, submitted_at
            FROM applicants WHERE application_id = ?1 ORDER BY submitted_at
            "#,
        )?;
        let applicants = stmt
            .query_map(params![application_id], row_to_applicant)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(applicants)
    }

    pub fn get_stats(&self) -> Result<RecordDbStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> rusqlite::Result<usize> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0)).map(|n| n as usize)
        };
        Ok(RecordDbStats {
            collections: count("SELECT COUNT(*) FROM collections")?,
            records: count("SELECT COUNT(*) FROM records")?,
            applicants: count("SELECT COUNT(*) FROM applicants")?,
        })
    }
}

fn decode_records(rows: Vec<String>) -> Result<Vec<Record>> {
    rows.iter()
        .map(|data| serde_json::from_str(data).map_err(Error::from))
        .collect()
}

fn row_to_applicant(row: &rusqlite::Row) -> rusqlite::Result<Applicant> {
    let id_str: String = row.get(0)?;
    let submitted_at_str: String = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let submitted_at = DateTime::parse_from_rfc3339(&submitted_at_str)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Applicant {
        id,
        application_id: row.get(1)?,
        name: row.get(2)?,
        contact_number: row.get(3)?,
        preferred_branch: row.get(4)?,
        email: row.get(5)?,
        submitted_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewApplicant;

    fn row(id: &str, name: &str) -> Record {
        Record::new()
            .with("Application\rID", id)
            .with("Candidate's Full Name", name)
    }

    #[test]
    fn test_create_collection_twice_reports_exists() {
        let db = RecordDb::in_memory().unwrap();
        db.create_collection("CET").unwrap();
        assert!(db.collection_exists("CET").unwrap());
        assert!(matches!(
            db.create_collection("CET"),
            Err(Error::CollectionExists(name)) if name == "CET"
        ));
    }

    #[test]
    fn test_find_by_field_with_irregular_key() {
        let db = RecordDb::in_memory().unwrap();
        db.create_collection("JEE").unwrap();
        db.insert_records("JEE", &[row("EN1", "Asha Rao"), row("EN2", "Vikram Shah")])
            .unwrap();

        let found = db.find_by_field("JEE", "Application\rID", "EN2").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].get("Candidate's Full Name").and_then(|v| v.as_str()),
            Some("Vikram Shah")
        );

        // Same value under the "cleaned" key does not match
        assert!(db.find_by_field("JEE", "Application ID", "EN2").unwrap().is_empty());
    }

    #[test]
    fn test_records_keep_insertion_order() {
        let db = RecordDb::in_memory().unwrap();
        db.create_collection("ME").unwrap();
        db.insert_records("ME", &[row("3", "c"), row("1", "a"), row("2", "b")]).unwrap();

        let ids: Vec<_> = db
            .find_all("ME")
            .unwrap()
            .iter()
            .map(|r| r.get("Application\rID").unwrap().to_text())
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(db.count("ME").unwrap(), 3);
        assert_eq!(
            db.first("ME").unwrap().unwrap().get("Application\rID").unwrap().to_text(),
            "3"
        );
    }

    #[test]
    fn test_insert_entry_if_absent() {
        let db = RecordDb::in_memory().unwrap();
        db.create_collection("MeritList_CET").unwrap();
        let key = EntryKey::new("EN1", "Asha Rao");
        let record = row("EN1", "Asha Rao");

        assert!(db.insert_entry_if_absent("MeritList_CET", &key, ExamType::Cet, &record).unwrap());
        assert!(!db.insert_entry_if_absent("MeritList_CET", &key, ExamType::Cet, &record).unwrap());
        assert!(db.contains_entry("MeritList_CET", &key).unwrap());
        assert_eq!(db.count("MeritList_CET").unwrap(), 1);
    }

    #[test]
    fn test_applicants_roundtrip() {
        let db = RecordDb::in_memory().unwrap();
        let applicant = Applicant::from_submission(NewApplicant {
            application_id: "EN1".to_string(),
            name: "Asha Rao".to_string(),
            contact_number: "9000000000".to_string(),
            preferred_branch: "Computer".to_string(),
            email: "asha@example.com".to_string(),
        });
        db.insert_applicant(&applicant).unwrap();

        let found = db.applicants_by_application_id("EN1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, applicant.id);
        assert_eq!(found[0].preferred_branch, "Computer");

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.applicants, 1);
        assert_eq!(stats.collections, 0);
    }

    #[test]
    fn test_corrupt_applicant_row_is_an_error() {
        let db = RecordDb::in_memory().unwrap();
        db.conn
            .lock()
            .execute(
                "INSERT INTO applicants VALUES ('not-a-uuid', 'EN2', 'N', 'C', 'B', 'E', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        db.conn
            .lock()
            .execute(
                "INSERT INTO applicants VALUES (?1, 'EN3', 'N', 'C', 'B', 'E', 'yesterday')",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();

        assert!(db.applicants_by_application_id("EN2").is_err());
        assert!(db.applicants_by_application_id("EN3").is_err());
    }
}
