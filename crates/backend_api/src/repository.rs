use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::{RawRecord, Section};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use utils::NewEntry;

use crate::error::Result;

/// Repository trait for reading and appending expense records
/// This abstraction allows swapping between file-based and database-backed implementations
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn fetch_records(&self, owner_id: &str) -> Result<Vec<RawRecord>>;
    async fn save_section(&self, owner_id: &str, name: &str, at: DateTime<Utc>) -> Result<Section>;
    async fn save_entry(&self, owner_id: &str, entry: NewEntry, at: DateTime<Utc>)
        -> Result<RawRecord>;
}

/// File-based implementation over the JSON store.
///
/// Reads always load the current file. Writes run read-modify-write under a
/// single lock, so concurrent inserts never drop each other, and append to
/// the raw document so items the typed model cannot read are kept as they are.
pub struct FileRecordRepository {
    database_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileRecordRepository {
    pub fn new<P: AsRef<Path>>(database_path: P) -> Self {
        Self {
            database_path: utils::resolve_database_path(database_path),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    async fn load_document(&self) -> Result<Value> {
        if !tokio::fs::try_exists(&self.database_path).await? {
            return Ok(utils::parse_store("")?);
        }
        let content = tokio::fs::read_to_string(&self.database_path).await?;
        Ok(utils::parse_store(&content)?)
    }

    /// Replaces the store through a staging file and a rename, so concurrent
    /// readers never observe a partially written document.
    async fn store_document(&self, doc: &Value) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let staging = utils::staging_path(&self.database_path);
        let formatted = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&staging, formatted).await?;
        tokio::fs::rename(&staging, &self.database_path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for FileRecordRepository {
    async fn fetch_records(&self, owner_id: &str) -> Result<Vec<RawRecord>> {
        let database = utils::database_from_value(&self.load_document().await?)?;
        Ok(utils::records_for_owner(&database, owner_id))
    }

    async fn save_section(&self, owner_id: &str, name: &str, at: DateTime<Utc>) -> Result<Section> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_document().await?;
        let mut database = utils::database_from_value(&doc)?;
        let section = utils::add_section(&mut database, owner_id, name, at);
        utils::append_to_store(&mut doc, "sections", serde_json::to_value(&section)?)?;
        self.store_document(&doc).await?;
        tracing::debug!(owner_id, section_id = %section.id, "saved section");
        Ok(section)
    }

    async fn save_entry(
        &self,
        owner_id: &str,
        entry: NewEntry,
        at: DateTime<Utc>,
    ) -> Result<RawRecord> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_document().await?;
        let mut database = utils::database_from_value(&doc)?;
        let record = utils::add_entry(&mut database, owner_id, entry, at);
        utils::append_to_store(&mut doc, "entries", serde_json::to_value(&record)?)?;
        self.store_document(&doc).await?;
        tracing::debug!(owner_id, entry_id = ?record.id, "saved entry");
        Ok(record)
    }
}
