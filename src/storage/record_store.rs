//! Record Store
//!
//! Keyed JSON documents behind a small trait pair: a [`RecordStoreFactory`]
//! opens a store from a location, a [`RecordStore`] exposes its structure and
//! fetches documents by identifier.
//!
//! The default backend is a SQLite file with two tables:
//!
//! ```sql
//! json_db_structure (id_name TEXT NOT NULL)
//! json_db_documents (id TEXT PRIMARY KEY, document TEXT NOT NULL)
//! ```
//!
//! Reads open the file read-only on a blocking thread.

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::constants::messages;
use crate::types::{ConfstackError, Result, ResultExt};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS json_db_structure (
    id_name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS json_db_documents (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL
);
"#;

// =============================================================================
// Types
// =============================================================================

/// Store metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStructure {
    /// Name of the identifier field inside each document
    pub id_name: String,
}

/// Record identifier: integer or string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    /// Accepts an integer (`2` or `2.0`) or a non-empty string
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| integral_f64(n.as_f64()?)).map(Self::Int),
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    fn from_document(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

/// Integral float within the exactly representable integer range
fn integral_f64(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0)
        .then_some(value as i64)
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => f.write_str(id),
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn structure(&self) -> Result<StoreStructure>;

    /// `Ok(None)` when no document has this identifier
    async fn get_by_id(&self, id: &RecordId) -> Result<Option<Map<String, Value>>>;
}

pub type SharedRecordStore = Arc<dyn RecordStore>;

/// Opens a store from the `file` location of a json-db layer
pub trait RecordStoreFactory: Send + Sync {
    fn open(&self, location: &Path) -> Result<SharedRecordStore>;
}

pub type SharedRecordStoreFactory = Arc<dyn RecordStoreFactory>;

// =============================================================================
// SQLite Backend
// =============================================================================

/// SQLite-backed record store
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    path: PathBuf,
}

impl SqliteRecordStore {
    /// Lazy handle; the file is opened on each read
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create (or reset) a store at `path` with the given identifier field
    pub fn create(path: impl Into<PathBuf>, id_name: &str) -> Result<Self> {
        let path = path.into();
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize record store schema")?;
        conn.execute("DELETE FROM json_db_structure", [])?;
        conn.execute(
            "INSERT INTO json_db_structure (id_name) VALUES (?1)",
            params![id_name],
        )?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a document; its identifier is read from the
    /// structure's `id_name` field
    pub fn insert(&self, document: &Map<String, Value>) -> Result<RecordId> {
        let conn = Connection::open(&self.path)?;
        let id_name = read_structure(&conn)?.id_name;
        let id = document
            .get(&id_name)
            .and_then(RecordId::from_document)
            .ok_or_else(|| {
                ConfstackError::Storage(format!("document has no valid '{}' field", id_name))
            })?;

        conn.execute(
            "INSERT OR REPLACE INTO json_db_documents (id, document) VALUES (?1, ?2)",
            params![id.to_string(), serde_json::to_string(document)?],
        )?;
        Ok(id)
    }

    fn connect(path: &Path) -> Result<Connection> {
        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context_fn(|| format!("Failed to open record store {}", path.display()))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&path)?;
            f(&conn)
        })
        .await
        .with_context("Record store task failed")?
    }
}

fn read_structure(conn: &Connection) -> Result<StoreStructure> {
    let id_name: Option<String> = conn
        .query_row("SELECT id_name FROM json_db_structure LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    id_name
        .map(|id_name| StoreStructure { id_name })
        .ok_or_else(|| ConfstackError::Storage("record store has no structure".to_string()))
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn structure(&self) -> Result<StoreStructure> {
        self.blocking(read_structure).await
    }

    async fn get_by_id(&self, id: &RecordId) -> Result<Option<Map<String, Value>>> {
        let key = id.to_string();
        debug!("Fetching record '{}' from {}", key, self.path.display());

        let raw: Option<String> = self
            .blocking(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT document FROM json_db_documents WHERE id = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        match raw {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw)? {
                Value::Object(map) => Ok(Some(map)),
                _ => Err(ConfstackError::Storage(
                    messages::DOCUMENT_NOT_OBJECT.to_string(),
                )),
            },
        }
    }
}

/// Opens [`SqliteRecordStore`] handles
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteStoreFactory;

impl RecordStoreFactory for SqliteStoreFactory {
    fn open(&self, location: &Path) -> Result<SharedRecordStore> {
        Ok(Arc::new(SqliteRecordStore::open(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn document(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn fixture(dir: &TempDir) -> SqliteRecordStore {
        let store = SqliteRecordStore::create(dir.path().join("store.db"), "myId").unwrap();
        store
            .insert(&document(json!({"myId": "jsonDbId", "option1": "value1"})))
            .unwrap();
        store
            .insert(&document(json!({"myId": 2, "option2": {"cle4": "value3"}})))
            .unwrap();
        store
    }

    #[test]
    fn test_record_id_from_value() {
        assert_eq!(RecordId::from_value(&json!(2)), Some(RecordId::Int(2)));
        assert_eq!(
            RecordId::from_value(&json!("abc")),
            Some(RecordId::Str("abc".to_string()))
        );
        assert_eq!(RecordId::from_value(&json!("")), None);
        assert_eq!(RecordId::from_value(&json!(2.0)), Some(RecordId::Int(2)));
        assert_eq!(RecordId::from_value(&json!(-3.0)), Some(RecordId::Int(-3)));
        assert_eq!(RecordId::from_value(&json!(1.5)), None);
        assert_eq!(RecordId::from_value(&json!(1e300)), None);
        assert_eq!(RecordId::from_value(&json!(true)), None);
        assert_eq!(RecordId::from_value(&json!(null)), None);
    }

    #[tokio::test]
    async fn test_structure_and_lookup() {
        let dir = TempDir::new().unwrap();
        let store = fixture(&dir);

        assert_eq!(store.structure().await.unwrap().id_name, "myId");

        let found = store
            .get_by_id(&RecordId::Str("jsonDbId".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get("option1"), Some(&json!("value1")));

        let by_int = store.get_by_id(&RecordId::Int(2)).await.unwrap().unwrap();
        assert_eq!(by_int.get("myId"), Some(&json!(2)));

        assert!(
            store
                .get_by_id(&RecordId::Str("missing".into()))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_missing_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStoreFactory
            .open(&dir.path().join("absent.db"))
            .unwrap();
        assert!(store.structure().await.is_err());
    }

    #[test]
    fn test_insert_requires_identifier() {
        let dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::create(dir.path().join("store.db"), "myId").unwrap();
        let err = store.insert(&document(json!({"other": 1}))).unwrap_err();
        assert!(err.to_string().contains("myId"));
    }
}
