//! Cache configuration.

use std::time::Duration;

const DEFAULT_VOLATILE_TTL_SECS: u64 = 60;
const DEFAULT_LISTING_TTL_SECS: u64 = 180;
const DEFAULT_STATIC_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_MAX_ENTRIES: usize = 4096;

/// TTL tiers and the capacity bound for the [`TtlStore`](super::TtlStore).
///
/// The store itself is TTL-agnostic per entry; the tiers encode the caller
/// convention: rating aggregates go volatile, listing rows and sorted sets go
/// listing, taxonomy goes static.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub volatile_ttl: Duration,
    pub listing_ttl: Duration,
    pub static_ttl: Duration,
    /// Upper bound on live entries; `0` disables the bound. When full, the
    /// entry with the soonest expiry is evicted first.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            volatile_ttl: Duration::from_secs(DEFAULT_VOLATILE_TTL_SECS),
            listing_ttl: Duration::from_secs(DEFAULT_LISTING_TTL_SECS),
            static_ttl: Duration::from_secs(DEFAULT_STATIC_TTL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
