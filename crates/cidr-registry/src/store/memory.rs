//! In-memory record store
//!
//! Used by tests and by `--store memory` deployments. A single mutex guards
//! both the name index and the block index, so `put_if_absent` checks and
//! inserts atomically.

use super::{PutOutcome, RecordStore};
use crate::models::AllocationRecord;
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct Tables {
    /// name -> block
    by_name: HashMap<String, String>,
    /// secondary uniqueness index on block
    blocks: HashSet<String>,
}

/// Process-local record store
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    ///
    /// Later duplicates of a name or block are dropped.
    pub fn with_records(records: impl IntoIterator<Item = AllocationRecord>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.lock();
            for record in records {
                if tables.by_name.contains_key(&record.name) || tables.blocks.contains(&record.block)
                {
                    continue;
                }
                tables.blocks.insert(record.block.clone());
                tables.by_name.insert(record.name, record.block);
            }
        }
        store
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.tables.lock().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_all(&self) -> Result<Vec<AllocationRecord>> {
        let tables = self.tables.lock();
        Ok(tables
            .by_name
            .iter()
            .map(|(name, block)| AllocationRecord {
                name: name.clone(),
                block: block.clone(),
            })
            .collect())
    }

    async fn put_if_absent(&self, record: &AllocationRecord) -> Result<PutOutcome> {
        let mut tables = self.tables.lock();

        if tables.by_name.contains_key(&record.name) {
            return Ok(PutOutcome::NameTaken);
        }
        if tables.blocks.contains(&record.block) {
            return Ok(PutOutcome::BlockTaken);
        }

        tables.blocks.insert(record.block.clone());
        tables
            .by_name
            .insert(record.name.clone(), record.block.clone());

        Ok(PutOutcome::Created)
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        if let Some(block) = tables.by_name.remove(name) {
            tables.blocks.remove(&block);
        }
        Ok(())
    }
}
