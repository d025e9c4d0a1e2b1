//! Block parsing and pool allocation
//!
//! Provides:
//! - Validation of caller-supplied network prefixes
//! - The fixed /16 candidate pool scanned by next-available queries

mod block;
mod pool;

pub use block::parse_block;
pub use pool::{AllocationPool, MAX_POOL_SIZE, POOL_PREFIX_LEN};
