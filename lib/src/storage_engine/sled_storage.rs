// lib/src/storage_engine/sled_storage.rs

use log::{debug, info};
use sled::{Db, Tree};

use models::RecordId;

use crate::config::StorageConfig;
use crate::errors::{Result, TriageError};
use crate::storage_engine::records::Record;
use crate::storage_engine::storage_utils::{deserialize_record, id_key, serialize_record};

/// Sled-backed store with one tree per record kind. Cloning is cheap and
/// shares the same database.
#[derive(Clone, Debug)]
pub struct TriageStore {
    db: Db,
}

impl TriageStore {
    pub fn open(config: &StorageConfig) -> Result<Self> {
        info!("Opening sled database at {:?}", config.data_directory);
        std::fs::create_dir_all(&config.data_directory)?;
        let db = sled::Config::new()
            .path(&config.data_directory)
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_every_ms)
            .open()?;
        Ok(Self { db })
    }

    /// In-memory database removed on drop. Used by tests.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn tree<R: Record>(&self) -> Result<Tree> {
        Ok(self.db.open_tree(R::TREE)?)
    }

    /// Allocates an id and stores the record under it.
    pub fn insert<R: Record>(&self, mut record: R) -> Result<R> {
        let tree = self.tree::<R>()?;
        let id = self.db.generate_id()? + 1;
        record.set_id(id);
        tree.insert(id_key(id), serialize_record(&record)?)?;
        debug!("Inserted {} {}", R::ENTITY, id);
        Ok(record)
    }

    pub fn get<R: Record>(&self, id: RecordId) -> Result<Option<R>> {
        match self.tree::<R>()?.get(id_key(id))? {
            Some(bytes) => Ok(Some(deserialize_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Like `get`, but a missing row is `NotFound`.
    pub fn fetch<R: Record>(&self, id: RecordId) -> Result<R> {
        self.get(id)?.ok_or_else(|| TriageError::not_found(R::ENTITY, id))
    }

    pub fn exists<R: Record>(&self, id: RecordId) -> Result<bool> {
        Ok(self.tree::<R>()?.contains_key(id_key(id))?)
    }

    /// Every record of a kind, ascending by id.
    pub fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.tree::<R>()?
            .iter()
            .values()
            .map(|value| deserialize_record(&value?))
            .collect()
    }

    pub fn list_where<R, F>(&self, predicate: F) -> Result<Vec<R>>
    where
        R: Record,
        F: Fn(&R) -> bool,
    {
        let mut matching = Vec::new();
        for value in self.tree::<R>()?.iter().values() {
            let record: R = deserialize_record(&value?)?;
            if predicate(&record) {
                matching.push(record);
            }
        }
        Ok(matching)
    }

    pub fn any<R, F>(&self, predicate: F) -> Result<bool>
    where
        R: Record,
        F: Fn(&R) -> bool,
    {
        for value in self.tree::<R>()?.iter().values() {
            if predicate(&deserialize_record::<R>(&value?)?) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn count<R: Record>(&self) -> Result<usize> {
        Ok(self.tree::<R>()?.len())
    }

    /// Overwrites an existing record. Saving an unknown id is `NotFound`.
    pub fn save<R: Record>(&self, record: &R) -> Result<()> {
        let tree = self.tree::<R>()?;
        let key = id_key(record.id());
        if !tree.contains_key(key)? {
            return Err(TriageError::not_found(R::ENTITY, record.id()));
        }
        tree.insert(key, serialize_record(record)?)?;
        Ok(())
    }

    /// Returns whether a row was removed.
    pub fn remove<R: Record>(&self, id: RecordId) -> Result<bool> {
        let removed = self.tree::<R>()?.remove(id_key(id))?.is_some();
        if removed {
            debug!("Removed {} {}", R::ENTITY, id);
        }
        Ok(removed)
    }

    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}
