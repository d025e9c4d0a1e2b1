//! PostgreSQL store tests
//!
//! Require a reachable database in `DATABASE_URL`:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/registry cargo test --test postgres_tests -- --ignored
//! ```

#![cfg(feature = "postgres")]

use cidr_registry::{
    AllocationPool, AllocationRecord, PgRecordStore, PostgresConfig, PutOutcome, RecordStore,
    Registry,
};
use std::sync::Arc;
use std::time::Duration;

async fn fresh_store(table: &str) -> PgRecordStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut config = PostgresConfig::new(url);
    config.table = table.to_string();

    let store = PgRecordStore::connect(&config).await.unwrap();
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(store.inner())
        .await
        .unwrap();
    store.ensure_schema().await.unwrap();
    store
}

fn record(name: &str, block: &str) -> AllocationRecord {
    AllocationRecord {
        name: name.to_string(),
        block: block.to_string(),
    }
}

#[tokio::test]
#[ignore]
async fn test_put_if_absent_outcomes() {
    let store = fresh_store("cidr_records_put_test").await;

    assert_eq!(
        store.put_if_absent(&record("a", "10.0.0.0/16")).await.unwrap(),
        PutOutcome::Created
    );
    assert_eq!(
        store.put_if_absent(&record("a", "10.1.0.0/16")).await.unwrap(),
        PutOutcome::NameTaken
    );
    assert_eq!(
        store.put_if_absent(&record("b", "10.0.0.0/16")).await.unwrap(),
        PutOutcome::BlockTaken
    );

    let records = store.list_all().await.unwrap();
    assert_eq!(records, vec![record("a", "10.0.0.0/16")]);

    store.delete_by_name("a").await.unwrap();
    store.delete_by_name("a").await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_registry_over_postgres() {
    let store = Arc::new(fresh_store("cidr_records_registry_test").await);
    let registry = Registry::with_pool(store, AllocationPool::default(), Duration::from_secs(5));

    registry.register("prod", "10.0.0.0/16").await.unwrap();
    let next = registry.next_available().await.unwrap();
    assert_eq!(next.to_string(), "10.1.0.0/16");
}
