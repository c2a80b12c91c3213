//! Storage collaborators: configuration files and keyed record stores.

pub mod file_loader;
pub mod record_store;

pub use file_loader::{FileFormat, FileLoader, FormatFileLoader, SharedFileLoader};
pub use record_store::{
    RecordId, RecordStore, RecordStoreFactory, SharedRecordStore, SharedRecordStoreFactory,
    SqliteRecordStore, SqliteStoreFactory, StoreStructure,
};

use std::path::{Path, PathBuf};

/// Resolve a layer path against an optional base directory
pub fn resolve_path(base_dir: Option<&Path>, file: &str) -> PathBuf {
    let path = Path::new(file);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}
