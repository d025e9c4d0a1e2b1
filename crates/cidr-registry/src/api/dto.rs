//! Data Transfer Objects for the REST API
//!
//! Field names (`key`, `cidr`) follow the registry's public JSON contract.

use crate::models::AllocationRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// Record DTOs
// ============================================================================

/// Request to register a block under a key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub cidr: String,
}

/// A single record as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDto {
    pub key: String,
    pub cidr: String,
}

impl From<AllocationRecord> for RecordDto {
    fn from(record: AllocationRecord) -> Self {
        Self {
            key: record.name,
            cidr: record.block,
        }
    }
}

/// List response
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub records: Vec<RecordDto>,
    pub count: usize,
}

impl ListResponse {
    pub fn new(records: Vec<AllocationRecord>) -> Self {
        let records: Vec<RecordDto> = records.into_iter().map(RecordDto::from).collect();
        Self {
            count: records.len(),
            records,
        }
    }
}

/// Next available block response
#[derive(Debug, Clone, Serialize)]
pub struct NextResponse {
    pub cidr: String,
}

/// Successful registration
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub key: String,
    pub cidr: String,
}

impl RegisterResponse {
    pub fn new(record: AllocationRecord) -> Self {
        Self {
            message: "CIDR registered successfully".to_string(),
            key: record.name,
            cidr: record.block,
        }
    }
}

/// Successful release
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            message: "CIDR deleted successfully".to_string(),
            key: key.into(),
        }
    }
}

/// Query parameters accepted on `/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootQuery {
    /// `next` selects the next-available query on GET
    pub action: Option<String>,
    /// Record key for DELETE
    pub key: Option<String>,
}

// ============================================================================
// Common DTOs
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// API error response
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::new("POOL_EXHAUSTED", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("STORE_UNAVAILABLE", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new("TIMEOUT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new("METHOD_NOT_ALLOWED", "method not allowed")
    }
}
