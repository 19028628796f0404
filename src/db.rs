//! Local key-value persistence for the latest risk result.
//!
//! A single SQLite table holds JSON values by key. Only one key is used,
//! [`RESULT_KEY`], and every save overwrites it.

use crate::error::StoreError;
use crate::models::RiskResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const RESULT_KEY: &str = "heatRiskResult";

/// Handle to the result store. Opens a fresh connection per operation so it
/// can be shared across tasks without locking.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Opens (or creates) the store at `path` and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        info!("Result store ready at {}", store.path.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Replaces the stored result.
    pub fn save(&self, result: &RiskResult) -> Result<(), StoreError> {
        let value = serde_json::to_string(result)?;
        let saved_at = chrono::Utc::now().to_rfc3339();
        self.connect()?.execute(
            "INSERT OR REPLACE INTO kv (key, value, saved_at) VALUES (?1, ?2, ?3)",
            params![RESULT_KEY, value, saved_at],
        )?;
        debug!(key = RESULT_KEY, %value, "Stored risk result");
        Ok(())
    }

    /// Raw JSON text under the result key, if any.
    pub fn load_raw(&self) -> Result<Option<String>, StoreError> {
        let conn = self.connect()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [RESULT_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn load(&self) -> Result<Option<RiskResult>, StoreError> {
        match self.load_raw()? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Removes the stored result. Nothing calls this automatically; the
    /// record lives until the next save or an explicit clear.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.connect()?
            .execute("DELETE FROM kv WHERE key = ?1", [RESULT_KEY])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, level: &str) -> RiskResult {
        RiskResult {
            city_name: Some(city.into()),
            lat: None,
            lon: None,
            age: "34".into(),
            condition: "asthma".into(),
            heat_index: Some(38.2),
            wbgt: Some(29.1),
            risk_level: Some(level.into()),
            risk_bucket: None,
            risk_label: None,
        }
    }

    #[test]
    fn save_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("risk.db")).unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save(&record("Tokyo", "high")).unwrap();
        store.save(&record("Sapporo", "low")).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.city_name.as_deref(), Some("Sapporo"));
        assert_eq!(loaded.risk_level.as_deref(), Some("low"));
    }

    #[test]
    fn stored_value_uses_result_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("risk.db")).unwrap();
        store.save(&record("Tokyo", "high")).unwrap();

        let raw = store.load_raw().unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["heatIndex"], 38.2);
        assert_eq!(json["riskLevel"], "high");
        assert!(json["riskBucket"].is_null());
    }

    #[test]
    fn record_survives_reopen_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.db");
        ResultStore::open(&path)
            .unwrap()
            .save(&record("Naha", "mid"))
            .unwrap();

        let reopened = ResultStore::open(&path).unwrap();
        assert!(reopened.load().unwrap().is_some());
        reopened.clear().unwrap();
        assert_eq!(reopened.load().unwrap(), None);
    }
}
