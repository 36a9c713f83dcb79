//! Durable annotation store
//!
//! Process-wide persisted review state: a classification per package name, a
//! free-text note per package name, and the raw manifest text. Each lives in
//! its own row of a SQLite key-value table under a fixed key, loaded once at
//! open and written back synchronously on every mutation (write-through).
//! The store is keyed by package name alone, so annotations survive manifest
//! edits, re-ordering, and re-fetches; entries for packages no longer in the
//! manifest are retained, not pruned.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::config::{CLASSIFICATIONS_KEY, MANIFEST_TEXT_KEY, NOTES_KEY};
use crate::version::error::StoreError;

/// User-assigned review status for a package.
///
/// "Unset" is the absence of an entry (`Option<Classification>`) and is
/// never persisted as a positive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Ok,
    Warn,
    Danger,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ok => "ok",
            Classification::Warn => "warn",
            Classification::Danger => "danger",
        }
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Classification::Ok),
            "warn" => Ok(Classification::Warn),
            "danger" => Ok(Classification::Danger),
            other => Err(format!(
                "unknown classification {:?}, expected ok, warn or danger",
                other
            )),
        }
    }
}

/// Pure classification transition: requesting the currently active value
/// clears it back to unset, anything else sets the requested value.
/// Consecutive identical toggles alternate between the value and unset.
pub fn toggle(
    current: Option<Classification>,
    requested: Classification,
) -> Option<Classification> {
    if current == Some(requested) {
        None
    } else {
        Some(requested)
    }
}

pub struct AnnotationStore {
    conn: Connection,
    classifications: HashMap<String, Classification>,
    notes: HashMap<String, String>,
    manifest_text: String,
}

impl AnnotationStore {
    /// Open (creating if needed) the store at `db_path` and load all three
    /// persisted entries. An absent or malformed entry falls back to its
    /// empty default; load problems are recovered locally, never surfaced.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening annotation store at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        let classifications = load_entry(&conn, CLASSIFICATIONS_KEY, HashMap::new())?;
        let notes = load_entry(&conn, NOTES_KEY, HashMap::new())?;
        let manifest_text = load_entry(&conn, MANIFEST_TEXT_KEY, String::new())?;

        debug!(
            "Loaded {} classifications and {} notes",
            classifications.len(),
            notes.len()
        );

        Ok(Self {
            conn,
            classifications,
            notes,
            manifest_text,
        })
    }

    pub fn classification(&self, name: &str) -> Option<Classification> {
        self.classifications.get(name).copied()
    }

    pub fn note(&self, name: &str) -> Option<&str> {
        self.notes.get(name).map(String::as_str)
    }

    pub fn manifest_text(&self) -> &str {
        &self.manifest_text
    }

    /// Apply the symmetric classification toggle for `name` and persist the
    /// mapping. Returns the classification now in effect.
    pub fn toggle_classification(
        &mut self,
        name: &str,
        value: Classification,
    ) -> Result<Option<Classification>, StoreError> {
        let next = toggle(self.classification(name), value);
        match next {
            Some(classification) => {
                self.classifications.insert(name.to_string(), classification);
            }
            None => {
                self.classifications.remove(name);
            }
        }
        save_entry(&self.conn, CLASSIFICATIONS_KEY, &self.classifications)?;
        Ok(next)
    }

    /// Unconditionally overwrite the note for `name` and persist the mapping
    pub fn set_note(&mut self, name: &str, text: &str) -> Result<(), StoreError> {
        self.notes.insert(name.to_string(), text.to_string());
        save_entry(&self.conn, NOTES_KEY, &self.notes)?;
        Ok(())
    }

    /// Store the raw manifest text, unparsed
    pub fn set_manifest_text(&mut self, text: &str) -> Result<(), StoreError> {
        self.manifest_text = text.to_string();
        save_entry(&self.conn, MANIFEST_TEXT_KEY, &self.manifest_text)?;
        Ok(())
    }

    /// Reset classifications, notes, and manifest text to their empty
    /// defaults in a single transaction.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM state WHERE key IN (?1, ?2, ?3)",
            (CLASSIFICATIONS_KEY, NOTES_KEY, MANIFEST_TEXT_KEY),
        )?;
        tx.commit()?;

        self.classifications.clear();
        self.notes.clear();
        self.manifest_text.clear();
        info!("Cleared all persisted annotation state");
        Ok(())
    }
}

/// Read the persisted value for `key`; absent or malformed rows fall back
/// to `default`
fn load_entry<T: DeserializeOwned>(
    conn: &Connection,
    key: &str,
    default: T,
) -> Result<T, StoreError> {
    let raw = conn.query_row("SELECT value FROM state WHERE key = ?1", [key], |row| {
        row.get::<_, String>(0)
    });

    match raw {
        Ok(value) => match serde_json::from_str(&value) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!("Malformed persisted state for {:?}, using default: {}", key, e);
                Ok(default)
            }
        },
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(default),
        Err(e) => Err(e.into()),
    }
}

/// Write-through persist for one entry
fn save_entry<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<(), StoreError> {
    let serialized = serde_json::to_string(value)?;
    conn.execute(
        r#"
        INSERT INTO state (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
        (key, serialized),
    )?;
    Ok(())
}
