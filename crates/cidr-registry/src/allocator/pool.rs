//! Fixed /16 allocation pool
//!
//! The pool is never stored. It is the ordered enumeration
//! `<base>.0.0.0/16, <base>.1.0.0/16, ...` regenerated on every query, and
//! the next free block is the first candidate whose text does not appear
//! among the used blocks.

use crate::config::PoolConfig;
use crate::{Error, Result};
use ipnet::Ipv4Net;
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Prefix length of every pool candidate
pub const POOL_PREFIX_LEN: u8 = 16;

/// Number of distinct second octets, and so the largest possible pool
pub const MAX_POOL_SIZE: u16 = 256;

/// The managed range of /16 candidates under one first octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPool {
    base_octet: u8,
    size: u16,
}

impl AllocationPool {
    /// Create a pool of `size` candidates under `base_octet`
    pub fn new(base_octet: u8, size: u16) -> Result<Self> {
        if size == 0 || size > MAX_POOL_SIZE {
            return Err(Error::Config(format!(
                "pool size must be between 1 and {}, got {}",
                MAX_POOL_SIZE, size
            )));
        }

        Ok(Self { base_octet, size })
    }

    /// Build the pool described by configuration
    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        Self::new(config.base_octet, config.size)
    }

    /// First octet shared by every candidate
    pub fn base_octet(&self) -> u8 {
        self.base_octet
    }

    /// Number of candidates
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Candidate at position `index` (the second octet)
    pub fn candidate(&self, index: u8) -> Ipv4Net {
        Ipv4Net::new_assert(Ipv4Addr::new(self.base_octet, index, 0, 0), POOL_PREFIX_LEN)
    }

    /// All candidates in ascending order
    pub fn candidates(&self) -> impl Iterator<Item = Ipv4Net> + '_ {
        (0..self.size).map(move |i| self.candidate(i as u8))
    }

    /// Whether a stored block's text lies in this pool's address range
    ///
    /// Only the literal first octet is compared; blocks outside the range can
    /// never equal a candidate and are skipped by the scan.
    pub fn covers_text(&self, block: &str) -> bool {
        block
            .strip_prefix(self.base_octet.to_string().as_str())
            .map_or(false, |rest| rest.starts_with('.'))
    }

    /// Human-readable description, e.g. `10.x.0.0/16`
    pub fn describe(&self) -> String {
        format!("{}.x.0.0/{}", self.base_octet, POOL_PREFIX_LEN)
    }

    /// Return the first candidate not present in `used`
    ///
    /// Linear scan in ascending order. Fails with `PoolExhausted` when every
    /// candidate is taken.
    pub fn next_free<'a, I>(&self, used: I) -> Result<Ipv4Net>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let used: HashSet<&str> = used
            .into_iter()
            .filter(|block| self.covers_text(block))
            .collect();

        self.candidates()
            .find(|candidate| !used.contains(candidate.to_string().as_str()))
            .ok_or_else(|| Error::PoolExhausted(self.describe()))
    }
}

impl Default for AllocationPool {
    fn default() -> Self {
        Self {
            base_octet: 10,
            size: MAX_POOL_SIZE,
        }
    }
}
