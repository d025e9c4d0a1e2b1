//! CIDR Registry
//!
//! Maps logical names to network blocks and suggests the next free /16 from
//! a fixed private pool:
//! - Name and block uniqueness enforced at write time
//! - Conditional writes at the store boundary for concurrent callers
//! - In-memory and PostgreSQL record stores
//! - REST API and CLI front ends

pub mod allocator;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

// Re-export core types
pub use allocator::{parse_block, AllocationPool};
pub use api::{create_router, start_server, AppState};
pub use config::{PoolConfig, PostgresConfig, RegistryConfig, ServerConfig, StoreConfig};
pub use error::{Error, Result};
pub use models::AllocationRecord;
pub use service::Registry;
pub use store::{InMemoryRecordStore, PutOutcome, RecordStore};
#[cfg(feature = "postgres")]
pub use store::PgRecordStore;
