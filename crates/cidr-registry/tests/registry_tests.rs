//! Registry behaviour through the public library surface

use cidr_registry::api::{create_router, AppState};
use cidr_registry::{AllocationPool, Error, InMemoryRecordStore, Registry, RegistryConfig};
use std::sync::Arc;
use std::time::Duration;

fn small_registry(size: u16) -> Registry {
    Registry::with_pool(
        Arc::new(InMemoryRecordStore::new()),
        AllocationPool::new(10, size).unwrap(),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_allocate_until_exhausted() {
    let registry = small_registry(4);

    for i in 0..4 {
        let next = registry.next_available().await.unwrap();
        assert_eq!(next.to_string(), format!("10.{}.0.0/16", i));
        registry
            .register(&format!("net-{}", i), &next.to_string())
            .await
            .unwrap();
    }

    let err = registry.next_available().await.unwrap_err();
    assert!(matches!(err, Error::PoolExhausted(_)));

    registry.delete("net-2").await.unwrap();
    let next = registry.next_available().await.unwrap();
    assert_eq!(next.to_string(), "10.2.0.0/16");
}

#[tokio::test]
async fn test_out_of_pool_blocks_do_not_consume_candidates() {
    let registry = small_registry(2);
    registry.register("office", "192.168.0.0/16").await.unwrap();
    registry.register("lab", "10.0.0.0/8").await.unwrap();
    registry.register("slice", "10.0.5.0/24").await.unwrap();

    let next = registry.next_available().await.unwrap();
    assert_eq!(next.to_string(), "10.0.0.0/16");
}

#[tokio::test]
async fn test_duplicate_block_detected_after_canonicalisation() {
    let registry = small_registry(256);
    registry.register("v6", "fd00:0:0:0::/48").await.unwrap();

    let err = registry.register("other", "fd00::/48").await.unwrap_err();
    assert!(matches!(err, Error::DuplicateBlock(_)));
}

#[tokio::test]
async fn test_failed_register_leaves_store_unchanged() {
    let registry = small_registry(256);
    registry.register("prod", "10.0.0.0/16").await.unwrap();

    assert!(registry.register("prod", "10.1.0.0/16").await.is_err());
    assert!(registry.register("stage", "10.0.0.0/16").await.is_err());
    assert!(registry.register("bad", "10.0.0.0/40").await.is_err());

    let records = registry.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "prod");
    assert_eq!(records[0].block, "10.0.0.0/16");
}

#[tokio::test]
async fn test_registry_from_default_config() {
    let config = RegistryConfig::default();
    let registry = Registry::new(Arc::new(InMemoryRecordStore::new()), &config).unwrap();

    assert_eq!(registry.pool().size(), 256);
    assert_eq!(registry.timeout(), config.operation_timeout());

    let state = Arc::new(AppState::new(registry));
    let _router = create_router(state);
}
