//! Network prefix validation

use crate::{Error, Result};
use ipnet::IpNet;

/// Parse caller-supplied text as a network prefix
///
/// Accepts IPv4 and IPv6 prefixes in address/prefix-length form. Host bits
/// may be set (`10.0.0.1/16` is accepted as written). Pool membership is not
/// checked here; any valid prefix can be registered.
pub fn parse_block(text: &str) -> Result<IpNet> {
    if text.is_empty() {
        return Err(Error::InvalidBlock("empty CIDR".to_string()));
    }

    text.parse::<IpNet>()
        .map_err(|e| Error::InvalidBlock(format!("invalid CIDR format '{}': {}", text, e)))
}
