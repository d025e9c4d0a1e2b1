//! Allocation record model

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// A name bound to a network block
///
/// `name` is the store's primary key. `block` holds the canonical text form of
/// a parsed prefix, so equality on the text is equality on the prefix value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Caller-supplied identifier, unique across records
    pub name: String,
    /// Network prefix in address/prefix-length form, unique across records
    pub block: String,
}

impl AllocationRecord {
    /// Create a record from an already validated prefix
    pub fn new(name: impl Into<String>, block: IpNet) -> Self {
        Self {
            name: name.into(),
            block: block.to_string(),
        }
    }
}
