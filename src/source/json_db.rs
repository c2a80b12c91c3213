//! json-db source: one record of a keyed record store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::{LayerSource, SourceContext};
use crate::constants::messages;
use crate::storage::{RecordId, SharedRecordStoreFactory, SqliteStoreFactory, resolve_path};
use crate::types::{
    LayerDescriptor, LayerError, LayerKind, LayerResult, Result, json_non_empty_str,
};

pub struct JsonDbSource {
    factory: SharedRecordStoreFactory,
    base_dir: Option<PathBuf>,
}

impl JsonDbSource {
    pub fn new(factory: SharedRecordStoreFactory, base_dir: Option<PathBuf>) -> Self {
        Self { factory, base_dir }
    }

    /// Fetch the record and drop the store's identifier field.
    /// `Ok(None)` when the identifier is unknown.
    async fn fetch(&self, file: &str, id: &RecordId) -> Result<Option<Map<String, Value>>> {
        let location = resolve_path(self.base_dir.as_deref(), file);
        let store = self.factory.open(&location)?;

        let structure = store.structure().await?;
        let Some(record) = store.get_by_id(id).await? else {
            return Ok(None);
        };

        Ok(Some(
            record
                .into_iter()
                .filter(|(key, _)| *key != structure.id_name)
                .collect(),
        ))
    }
}

impl Default for JsonDbSource {
    fn default() -> Self {
        Self::new(Arc::new(SqliteStoreFactory), None)
    }
}

#[async_trait]
impl LayerSource for JsonDbSource {
    fn kind(&self) -> LayerKind {
        LayerKind::JsonDb
    }

    async fn load(&self, descriptor: &LayerDescriptor, _ctx: &SourceContext) -> LayerResult {
        let Some(file) = json_non_empty_str(descriptor.field("file")) else {
            return LayerResult::invalid(descriptor, messages::FILE_INVALID);
        };
        let Some(id) = descriptor.field("id").and_then(RecordId::from_value) else {
            return LayerResult::invalid(descriptor, messages::ID_INVALID);
        };

        debug!("Fetching json-db record '{}' from {}", id, file);
        match self.fetch(file, &id).await {
            Ok(Some(config)) => LayerResult::loaded(descriptor.clone(), config),
            Ok(None) => {
                LayerResult::invalid(descriptor, format!("json-db: l'id '{}' est inconnu", id))
            }
            Err(e) => LayerResult::failed(
                descriptor.clone(),
                LayerError::new(e.detail()).with_cause(e.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::EventBus;
    use crate::source::EnvSnapshot;
    use crate::storage::{
        RecordStore, RecordStoreFactory, SharedRecordStore, SqliteRecordStore, StoreStructure,
    };
    use crate::types::ConfstackError;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn ctx() -> SourceContext {
        SourceContext::new(EnvSnapshot::default(), EventBus::new())
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    /// In-memory store with a single optional record
    struct MemoryStore {
        record: Option<Map<String, Value>>,
        fail: bool,
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn structure(&self) -> Result<StoreStructure> {
            if self.fail {
                return Err(ConfstackError::Storage("store unavailable".into()));
            }
            Ok(StoreStructure {
                id_name: "myId".into(),
            })
        }

        async fn get_by_id(&self, _id: &RecordId) -> Result<Option<Map<String, Value>>> {
            Ok(self.record.clone())
        }
    }

    struct MemoryFactory {
        record: Option<Map<String, Value>>,
        fail: bool,
        opened: Mutex<Vec<PathBuf>>,
    }

    impl MemoryFactory {
        fn new(record: Option<Value>) -> Self {
            Self {
                record: record.map(object),
                fail: false,
                opened: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecordStoreFactory for MemoryFactory {
        fn open(&self, location: &Path) -> Result<SharedRecordStore> {
            self.opened.lock().unwrap().push(location.to_path_buf());
            Ok(Arc::new(MemoryStore {
                record: self.record.clone(),
                fail: self.fail,
            }))
        }
    }

    #[tokio::test]
    async fn test_strips_identifier_field() {
        let factory = Arc::new(MemoryFactory::new(Some(json!({
            "myId": "jsonDbId",
            "option1": "value1",
            "option2": {"cle1": "value2"},
        }))));
        let source = JsonDbSource::new(factory.clone(), None);

        let result = source
            .load(&LayerDescriptor::json_db("/path/jsonDb", "jsonDbId"), &ctx())
            .await;

        assert_eq!(
            result.config().cloned().map(Value::Object),
            Some(json!({"option1": "value1", "option2": {"cle1": "value2"}}))
        );
        assert_eq!(
            factory.opened.lock().unwrap().clone(),
            vec![PathBuf::from("/path/jsonDb")]
        );
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let source = JsonDbSource::new(Arc::new(MemoryFactory::new(None)), None);
        let result = source
            .load(&LayerDescriptor::json_db("/path/jsonDb", 2), &ctx())
            .await;
        assert_eq!(result.error().unwrap().message, "json-db: l'id '2' est inconnu");
    }

    #[tokio::test]
    async fn test_store_error_is_layer_error() {
        let mut factory = MemoryFactory::new(None);
        factory.fail = true;
        let source = JsonDbSource::new(Arc::new(factory), None);

        let result = source
            .load(&LayerDescriptor::json_db("/path/jsonDb", "id"), &ctx())
            .await;
        let error = result.error().unwrap();
        assert_eq!(error.message, "store unavailable");
        assert_eq!(error.cause.as_deref(), Some("Storage error: store unavailable"));
    }

    #[tokio::test]
    async fn test_integral_float_id_is_accepted() {
        let factory = Arc::new(MemoryFactory::new(Some(json!({"myId": 2, "a": 1}))));
        let source = JsonDbSource::new(factory, None);

        let result = source
            .load(&LayerDescriptor::json_db("/path/jsonDb", json!(2.0)), &ctx())
            .await;
        assert_eq!(result.config().cloned().map(Value::Object), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_validation_order() {
        let factory = Arc::new(MemoryFactory::new(None));
        let source = JsonDbSource::new(factory.clone(), None);

        let no_file = LayerDescriptor::new("json-db").with_field("id", json!(null));
        assert_eq!(
            source.load(&no_file, &ctx()).await.error().unwrap().message,
            "'file' n'est pas valide"
        );

        for id in [json!(null), json!(""), json!(1.5), json!(true), json!({})] {
            let descriptor = LayerDescriptor::json_db("MonFichier", id);
            assert_eq!(
                source.load(&descriptor, &ctx()).await.error().unwrap().message,
                "'id' n'est pas valide"
            );
        }

        assert!(factory.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_store_end_to_end() {
        let dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::create(dir.path().join("conf.db"), "myId").unwrap();
        store
            .insert(&object(json!({"myId": 2, "option2": "value2"})))
            .unwrap();

        let source = JsonDbSource::new(
            Arc::new(SqliteStoreFactory),
            Some(dir.path().to_path_buf()),
        );
        let result = source
            .load(&LayerDescriptor::json_db("conf.db", 2), &ctx())
            .await;

        assert_eq!(
            result.config().cloned().map(Value::Object),
            Some(json!({"option2": "value2"}))
        );
    }
}
