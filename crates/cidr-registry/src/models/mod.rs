//! Data models for the CIDR registry

mod record;

pub use record::AllocationRecord;
