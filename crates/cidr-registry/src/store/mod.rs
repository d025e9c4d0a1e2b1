//! Record store collaborators
//!
//! The registry keeps no state of its own. Every operation goes through a
//! [`RecordStore`], whose conditional write is what keeps names and blocks
//! unique under concurrent writers.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::InMemoryRecordStore;
#[cfg(feature = "postgres")]
pub use postgres::PgRecordStore;

use crate::config::StoreConfig;
use crate::models::AllocationRecord;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The record was persisted
    Created,
    /// A record with the same name already exists
    NameTaken,
    /// A record with the same block already exists
    BlockTaken,
}

/// Durable key-value table of allocation records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read every record, in no particular order
    async fn list_all(&self) -> Result<Vec<AllocationRecord>>;

    /// Persist `record` only if neither its name nor its block is present
    ///
    /// The check and the write must be atomic with respect to other callers.
    async fn put_if_absent(&self, record: &AllocationRecord) -> Result<PutOutcome>;

    /// Remove the record keyed by `name`; absence is not an error
    async fn delete_by_name(&self, name: &str) -> Result<()>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn list_all(&self) -> Result<Vec<AllocationRecord>> {
        (**self).list_all().await
    }

    async fn put_if_absent(&self, record: &AllocationRecord) -> Result<PutOutcome> {
        (**self).put_if_absent(record).await
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        (**self).delete_by_name(name).await
    }
}

/// Open the store described by configuration
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config {
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory record store; records are lost on restart");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
        #[cfg(feature = "postgres")]
        StoreConfig::Postgres(pg) => {
            let store = PgRecordStore::connect(pg).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreConfig::Postgres(_) => Err(crate::Error::Config(
            "postgres store requested but the `postgres` feature is disabled".to_string(),
        )),
    }
}
