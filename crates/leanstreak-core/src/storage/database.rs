//! SQLite-based streak snapshot storage.
//!
//! Snapshots are stored as JSON documents keyed by tracker name, so records
//! written by older versions decode through serde defaults instead of schema
//! migrations.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::{Result, StorageError};
use crate::result::StreakRecord;

/// SQLite database holding the latest snapshot per tracker.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Open the store at `<data_dir>/leanstreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("leanstreak.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS streak_snapshots (
                tracker    TEXT PRIMARY KEY,
                record     TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
    }

    /// Insert or replace the snapshot for `tracker`.
    pub fn save(&self, tracker: &str, record: &StreakRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let updated_at = record.updated_at.unwrap_or_else(Utc::now);
        self.conn.execute(
            "INSERT INTO streak_snapshots (tracker, record, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(tracker) DO UPDATE SET record = excluded.record,
                                                updated_at = excluded.updated_at",
            params![tracker, json, updated_at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn load(&self, tracker: &str) -> Result<Option<StreakRecord>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM streak_snapshots WHERE tracker = ?1",
                params![tracker],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|json| decode(tracker, &json)).transpose()
    }

    /// All stored snapshots, ordered by tracker name.
    pub fn list(&self) -> Result<Vec<(String, StreakRecord)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tracker, record FROM streak_snapshots ORDER BY tracker")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (tracker, json) = row?;
            let record = decode(&tracker, &json)?;
            records.push((tracker, record));
        }
        Ok(records)
    }

    /// When the snapshot for `tracker` was last written.
    pub fn updated_at(&self, tracker: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM streak_snapshots WHERE tracker = ?1",
                params![tracker],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Delete a snapshot. Returns whether one existed.
    pub fn delete(&self, tracker: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM streak_snapshots WHERE tracker = ?1",
            params![tracker],
        )?;
        Ok(removed > 0)
    }

    #[cfg(test)]
    fn put_raw(&self, tracker: &str, json: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO streak_snapshots (tracker, record, updated_at) VALUES (?1, ?2, ?3)",
            params![tracker, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn decode(tracker: &str, json: &str) -> Result<StreakRecord> {
    serde_json::from_str(json).map_err(|e| {
        StorageError::CorruptRecord {
            tracker: tracker.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::NaiveDate;

    fn record(streak: u32) -> StreakRecord {
        StreakRecord {
            current_streak_days: streak,
            rewards_earned: 2,
            rewards_consumed: 1,
            available_rewards: 1,
            last_activity_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            updated_at: None,
        }
    }

    #[test]
    fn save_and_load() {
        let store = SnapshotStore::open_memory().unwrap();
        assert!(store.load("meditation").unwrap().is_none());

        store.save("meditation", &record(9)).unwrap();
        assert_eq!(store.load("meditation").unwrap(), Some(record(9)));

        // Overwrite keeps a single row
        store.save("meditation", &record(10)).unwrap();
        assert_eq!(store.load("meditation").unwrap().unwrap().current_streak_days, 10);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn list_is_sorted_and_delete_removes() {
        let store = SnapshotStore::open_memory().unwrap();
        store.save("workout", &record(1)).unwrap();
        store.save("meditation", &record(2)).unwrap();
        let names: Vec<String> = store.list().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["meditation", "workout"]);

        assert!(store.delete("workout").unwrap());
        assert!(!store.delete("workout").unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn legacy_records_decode_with_defaults() {
        let store = SnapshotStore::open_memory().unwrap();
        store
            .put_raw("noalc", r#"{"current_streak_days":12,"rewards_earned":1}"#)
            .unwrap();
        let loaded = store.load("noalc").unwrap().unwrap();
        assert_eq!(loaded.current_streak_days, 12);
        assert_eq!(loaded.rewards_consumed, 0);
        assert_eq!(loaded.last_activity_date, None);
    }

    #[test]
    fn corrupt_record_is_reported() {
        let store = SnapshotStore::open_memory().unwrap();
        store.put_raw("broken", "not json").unwrap();
        assert!(matches!(
            store.load("broken"),
            Err(CoreError::Storage(StorageError::CorruptRecord { .. }))
        ));
    }

    #[test]
    fn updated_at_is_recorded() {
        let store = SnapshotStore::open_memory().unwrap();
        let at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store.save("workout", &record(3).with_updated_at(at)).unwrap();
        assert_eq!(store.updated_at("workout").unwrap(), Some(at));
        assert_eq!(store.updated_at("missing").unwrap(), None);
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.db");
        SnapshotStore::open_at(&path)
            .unwrap()
            .save("meditation", &record(4))
            .unwrap();
        let reopened = SnapshotStore::open_at(&path).unwrap();
        assert_eq!(reopened.load("meditation").unwrap(), Some(record(4)));
    }
}
