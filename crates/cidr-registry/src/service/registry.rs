//! Allocation Registry
//!
//! Core service for name-to-block allocation, providing:
//! - Listing of all records, sorted by name
//! - Registration with name and block uniqueness
//! - Idempotent release by name
//! - Next free /16 suggestion from the configured pool

use crate::allocator::{parse_block, AllocationPool};
use crate::config::RegistryConfig;
use crate::models::AllocationRecord;
use crate::store::{PutOutcome, RecordStore};
use crate::{Error, Result};
use ipnet::Ipv4Net;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Allocation Registry
///
/// Holds no records itself: every operation re-reads the store. Cloning is
/// cheap and clones share the store client.
#[derive(Clone)]
pub struct Registry {
    /// Record store
    store: Arc<dyn RecordStore>,
    /// Managed /16 pool
    pool: AllocationPool,
    /// Deadline for each operation
    timeout: Duration,
}

impl Registry {
    /// Create a registry over `store` with pool and deadline from configuration
    pub fn new(store: Arc<dyn RecordStore>, config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            pool: AllocationPool::from_config(&config.pool)?,
            timeout: config.operation_timeout(),
        })
    }

    /// Create a registry from explicit parts
    pub fn with_pool(store: Arc<dyn RecordStore>, pool: AllocationPool, timeout: Duration) -> Self {
        Self {
            store,
            pool,
            timeout,
        }
    }

    /// Copy of this registry whose calls use a caller-supplied deadline
    pub fn with_deadline(&self, timeout: Duration) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pool: self.pool,
            timeout,
        }
    }

    pub fn pool(&self) -> &AllocationPool {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `operation`, aborting it when the deadline passes
    async fn within<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Record store call timed out");
                Err(Error::Timeout(self.timeout))
            }
        }
    }

    // ==================== Queries ====================

    /// List every record, sorted by name
    pub async fn list(&self) -> Result<Vec<AllocationRecord>> {
        let mut records = self.within(self.store.list_all()).await?;
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// First pool candidate not held by any record
    pub async fn next_available(&self) -> Result<Ipv4Net> {
        let records = self.within(self.store.list_all()).await?;

        let next = self
            .pool
            .next_free(records.iter().map(|r| r.block.as_str()))?;

        tracing::debug!(
            cidr = %next,
            records = records.len(),
            "Computed next available block"
        );

        Ok(next)
    }

    // ==================== Mutations ====================

    /// Register `block_text` under `name`
    ///
    /// The uniqueness pre-check gives precise errors for the common case; the
    /// store's conditional write decides the race when two callers pass the
    /// pre-check against the same snapshot.
    pub async fn register(&self, name: &str, block_text: &str) -> Result<AllocationRecord> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName("name must not be empty".to_string()));
        }

        let block = parse_block(block_text)?;
        let record = AllocationRecord::new(name, block);

        self.within(async {
            let existing = self.store.list_all().await?;

            // A taken name wins over a taken block, whatever the scan order
            if existing.iter().any(|other| other.name == record.name) {
                return Err(Error::DuplicateName(record.name.clone()));
            }
            if existing.iter().any(|other| other.block == record.block) {
                return Err(Error::DuplicateBlock(record.block.clone()));
            }

            match self.store.put_if_absent(&record).await? {
                PutOutcome::Created => Ok(()),
                PutOutcome::NameTaken => Err(Error::DuplicateName(record.name.clone())),
                PutOutcome::BlockTaken => Err(Error::DuplicateBlock(record.block.clone())),
            }
        })
        .await?;

        tracing::info!(name = %record.name, cidr = %record.block, "Registered block");

        Ok(record)
    }

    /// Release the block held by `name`; unknown names are not an error
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.within(self.store.delete_by_name(name)).await?;

        tracing::info!(name = %name, "Released block");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRecordStore;
    use async_trait::async_trait;

    fn registry() -> Registry {
        Registry::new(
            Arc::new(InMemoryRecordStore::new()),
            &RegistryConfig::default(),
        )
        .unwrap()
    }

    fn registry_with(records: &[(&str, &str)]) -> Registry {
        let store = InMemoryRecordStore::with_records(records.iter().map(|(n, b)| {
            AllocationRecord {
                name: n.to_string(),
                block: b.to_string(),
            }
        }));
        Registry::new(Arc::new(store), &RegistryConfig::default()).unwrap()
    }

    /// Store whose every call fails
    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn list_all(&self) -> Result<Vec<AllocationRecord>> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }

        async fn put_if_absent(&self, _record: &AllocationRecord) -> Result<PutOutcome> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }

        async fn delete_by_name(&self, _name: &str) -> Result<()> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
    }

    /// Store that never answers in time
    struct StalledStore;

    #[async_trait]
    impl RecordStore for StalledStore {
        async fn list_all(&self) -> Result<Vec<AllocationRecord>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        async fn put_if_absent(&self, _record: &AllocationRecord) -> Result<PutOutcome> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(PutOutcome::Created)
        }

        async fn delete_by_name(&self, _name: &str) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    /// Store whose scans always return a stale, empty snapshot
    struct StaleSnapshotStore(InMemoryRecordStore);

    #[async_trait]
    impl RecordStore for StaleSnapshotStore {
        async fn list_all(&self) -> Result<Vec<AllocationRecord>> {
            Ok(Vec::new())
        }

        async fn put_if_absent(&self, record: &AllocationRecord) -> Result<PutOutcome> {
            self.0.put_if_absent(record).await
        }

        async fn delete_by_name(&self, name: &str) -> Result<()> {
            self.0.delete_by_name(name).await
        }
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let registry = registry();

        let record = registry.register("prod", "10.0.0.0/16").await.unwrap();
        assert_eq!(record.name, "prod");
        assert_eq!(record.block, "10.0.0.0/16");

        let records = registry.list().await.unwrap();
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let registry = registry_with(&[
            ("zeta", "10.3.0.0/16"),
            ("alpha", "10.1.0.0/16"),
            ("mid", "192.168.0.0/24"),
        ]);

        let names: Vec<String> = registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_register_out_of_pool_block() {
        let registry = registry();
        let record = registry.register("office", "192.168.1.0/24").await.unwrap();
        assert_eq!(record.block, "192.168.1.0/24");
    }

    #[tokio::test]
    async fn test_register_duplicate_name() {
        let registry = registry();
        registry.register("prod", "10.0.0.0/16").await.unwrap();

        let result = registry.register("prod", "10.9.0.0/16").await;
        assert!(matches!(result, Err(Error::DuplicateName(name)) if name == "prod"));
    }

    #[tokio::test]
    async fn test_register_duplicate_block() {
        let registry = registry();
        registry.register("prod", "10.0.0.0/16").await.unwrap();

        let result = registry.register("staging", "10.0.0.0/16").await;
        assert!(matches!(result, Err(Error::DuplicateBlock(block)) if block == "10.0.0.0/16"));
    }

    #[tokio::test]
    async fn test_duplicate_name_wins_over_duplicate_block() {
        // Name clashes with one record, block with another. Fresh stores give
        // different HashMap scan orders, so repeat to cover both orders.
        for _ in 0..50 {
            let registry = registry_with(&[
                ("a", "10.0.0.0/16"),
                ("b", "10.1.0.0/16"),
                ("c", "10.2.0.0/16"),
                ("d", "192.168.0.0/24"),
            ]);

            let result = registry.register("b", "10.0.0.0/16").await;
            assert!(matches!(result, Err(Error::DuplicateName(name)) if name == "b"));

            let result = registry.register("a", "192.168.0.0/24").await;
            assert!(matches!(result, Err(Error::DuplicateName(name)) if name == "a"));
        }
    }

    #[tokio::test]
    async fn test_register_invalid_block() {
        let registry = registry();

        let result = registry.register("x", "not-a-cidr").await;
        assert!(matches!(result, Err(Error::InvalidBlock(_))));

        let result = registry.register("x", "10.0.0.0/33").await;
        assert!(matches!(result, Err(Error::InvalidBlock(_))));

        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_empty_name() {
        let registry = registry();
        let result = registry.register("  ", "10.0.0.0/16").await;
        assert!(matches!(result, Err(Error::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let registry = registry();
        registry.register("prod", "10.0.0.0/16").await.unwrap();

        registry.delete("prod").await.unwrap();
        registry.delete("prod").await.unwrap();
        registry.delete("never-existed").await.unwrap();

        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_reregister_block() {
        let registry = registry();
        registry.register("prod", "10.0.0.0/16").await.unwrap();
        registry.delete("prod").await.unwrap();

        let record = registry.register("prod-v2", "10.0.0.0/16").await.unwrap();
        assert_eq!(record.name, "prod-v2");
    }

    #[tokio::test]
    async fn test_next_available_empty() {
        let registry = registry();
        let next = registry.next_available().await.unwrap();
        assert_eq!(next.to_string(), "10.0.0.0/16");
    }

    #[tokio::test]
    async fn test_next_available_after_used() {
        let registry = registry_with(&[("a", "10.0.0.0/16"), ("b", "10.1.0.0/16")]);
        let next = registry.next_available().await.unwrap();
        assert_eq!(next.to_string(), "10.2.0.0/16");
    }

    #[tokio::test]
    async fn test_next_available_exhausted() {
        let records: Vec<(String, String)> = (0..=255)
            .map(|i| (format!("net-{:03}", i), format!("10.{}.0.0/16", i)))
            .collect();
        let refs: Vec<(&str, &str)> = records
            .iter()
            .map(|(n, b)| (n.as_str(), b.as_str()))
            .collect();
        let registry = registry_with(&refs);

        let result = registry.next_available().await;
        assert!(matches!(result, Err(Error::PoolExhausted(_))));
    }

    #[tokio::test]
    async fn test_next_available_custom_pool() {
        let pool = AllocationPool::new(172, 4).unwrap();
        let store = InMemoryRecordStore::with_records(vec![AllocationRecord {
            name: "a".to_string(),
            block: "172.0.0.0/16".to_string(),
        }]);
        let registry = Registry::with_pool(Arc::new(store), pool, Duration::from_secs(1));

        let next = registry.next_available().await.unwrap();
        assert_eq!(next.to_string(), "172.1.0.0/16");
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let registry = Registry::new(Arc::new(FailingStore), &RegistryConfig::default()).unwrap();

        assert!(matches!(registry.list().await, Err(Error::StoreUnavailable(_))));
        assert!(matches!(
            registry.next_available().await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            registry.register("a", "10.0.0.0/16").await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(registry.delete("a").await, Err(Error::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_input_checked_before_store() {
        // Validation errors win over an unavailable store
        let registry = Registry::new(Arc::new(FailingStore), &RegistryConfig::default()).unwrap();
        assert!(matches!(
            registry.register("a", "bogus").await,
            Err(Error::InvalidBlock(_))
        ));
    }

    #[tokio::test]
    async fn test_deadline_aborts_store_call() {
        let registry = Registry::new(Arc::new(StalledStore), &RegistryConfig::default())
            .unwrap()
            .with_deadline(Duration::from_millis(50));

        assert_eq!(registry.timeout(), Duration::from_millis(50));
        assert!(matches!(registry.list().await, Err(Error::Timeout(_))));
        assert!(matches!(
            registry.register("a", "10.0.0.0/16").await,
            Err(Error::Timeout(_))
        ));
        assert!(matches!(registry.delete("a").await, Err(Error::Timeout(_))));
        assert!(matches!(registry.next_available().await, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_conditional_write_closes_race() {
        let store = StaleSnapshotStore(InMemoryRecordStore::new());
        let registry = Registry::new(Arc::new(store), &RegistryConfig::default()).unwrap();

        registry.register("prod", "10.0.0.0/16").await.unwrap();

        // The pre-check sees nothing; the store still rejects both duplicates
        let result = registry.register("prod", "10.1.0.0/16").await;
        assert!(matches!(result, Err(Error::DuplicateName(_))));

        let result = registry.register("staging", "10.0.0.0/16").await;
        assert!(matches!(result, Err(Error::DuplicateBlock(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_same_name() {
        let registry = registry();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .register("contended", &format!("10.{}.0.0/16", i))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(Error::DuplicateName(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RegistryConfig::default();
        config.pool.size = 0;
        let result = Registry::new(Arc::new(InMemoryRecordStore::new()), &config);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
