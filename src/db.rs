use crate::error::{Result, SeqError};
use crate::models::{Record, RecordKind};
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// Database handle for the stored record snapshot
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database connection
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Database { conn })
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database { conn })
    }

    /// Initialize the database schema
    pub fn init(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                position INTEGER PRIMARY KEY,
                kind TEXT NOT NULL CHECK (kind IN ('node', 'edge')),
                id TEXT NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_records_kind ON records(kind)",
            [],
        )?;
        Ok(())
    }

    /// Check if database is initialized
    pub fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='records'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ==================== Record Operations ====================

    /// Replace the stored snapshot with `records`, keeping their order
    pub fn replace_records(&self, records: &[Record]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM records", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO records (position, kind, id, body) VALUES (?1, ?2, ?3, ?4)")?;
            for (position, record) in records.iter().enumerate() {
                let body = serde_json::to_string(record)?;
                stmt.execute((position as i64, record.kind().as_str(), record.id(), body))?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Load the stored snapshot in its original order
    pub fn load_records(&self) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT position, kind, body FROM records ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (position, kind, body) = row?;
            records.push(record_from_row(position, &kind, &body)?);
        }
        Ok(records)
    }

    pub fn count_records(&self, kind: Option<RecordKind>) -> Result<usize> {
        let count: i64 = match kind {
            Some(kind) => self.conn.query_row(
                "SELECT COUNT(*) FROM records WHERE kind = ?1",
                [kind.as_str()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }

    // ==================== Config Operations ====================

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| e.into())
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
        Ok(())
    }
}

fn record_from_row(position: i64, kind: &str, body: &str) -> Result<Record> {
    let corrupt = |reason: String| SeqError::CorruptSnapshot { position, reason };

    let kind = RecordKind::try_from(kind).map_err(corrupt)?;
    let value: Value = serde_json::from_str(body).map_err(|e| corrupt(e.to_string()))?;
    Record::from_value_as(kind, value).map_err(corrupt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EdgeRecord, NodeRecord};
    use serde_json::json;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn test_init_is_idempotent() {
        let db = setup();
        db.init().unwrap();
        assert!(db.is_initialized().unwrap());
    }

    #[test]
    fn test_uninitialized() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.is_initialized().unwrap());
    }

    #[test]
    fn test_replace_and_load_keeps_order_and_payload() {
        let db = setup();

        let mut node = NodeRecord::new("b").with_successors(["a"]).with_title("Bee");
        node.payload.insert("formula".to_string(), json!("E = mc^2"));
        let records = vec![
            Record::from(node),
            Record::from(NodeRecord::new("a")),
            Record::from(EdgeRecord::new("e1", "b", "a")),
        ];

        assert_eq!(db.replace_records(&records).unwrap(), 3);
        assert_eq!(db.load_records().unwrap(), records);
        assert_eq!(db.count_records(None).unwrap(), 3);
        assert_eq!(db.count_records(Some(RecordKind::Node)).unwrap(), 2);
        assert_eq!(db.count_records(Some(RecordKind::Edge)).unwrap(), 1);
    }

    #[test]
    fn test_replace_discards_previous_snapshot() {
        let db = setup();

        db.replace_records(&[NodeRecord::new("old").into()]).unwrap();
        db.replace_records(&[NodeRecord::new("new").into()]).unwrap();

        let records = db.load_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "new");
    }

    #[test]
    fn test_corrupt_row_reported() {
        let db = setup();
        db.conn
            .execute(
                "INSERT INTO records (position, kind, id, body) VALUES (0, 'node', 'x', 'not json')",
                [],
            )
            .unwrap();

        let result = db.load_records();
        assert!(matches!(
            result,
            Err(SeqError::CorruptSnapshot { position: 0, .. })
        ));
    }

    #[test]
    fn test_config_roundtrip() {
        let db = setup();

        assert!(db.get_config("source").unwrap().is_none());
        db.set_config("source", "a.jsonl").unwrap();
        db.set_config("source", "b.jsonl").unwrap();
        assert_eq!(db.get_config("source").unwrap().as_deref(), Some("b.jsonl"));
    }
}
