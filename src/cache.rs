//! TTL cache for resolved name→address entries.
//!
//! Keys follow the canonical `"<chain_id>:<hostname>"` form so the same
//! hostname resolved on different chains never collides. The map is sharded
//! ([`DashMap`]) so concurrent fetches don't serialize on unrelated keys;
//! expired entries are removed lazily on read.

use alloy::primitives::Address;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    address: Address,
    target_chain_id: u64,
    expires_at: Instant,
}

/// Name→address cache with a fixed per-entry TTL.
pub struct NameAddrCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl NameAddrCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// The canonical cache key for a hostname resolved on a chain.
    pub fn key(chain_id: u64, hostname: &str) -> String {
        format!("{chain_id}:{hostname}")
    }

    /// Look up an entry. Expired entries are indistinguishable from absent
    /// ones.
    pub fn get(&self, key: &str) -> Option<(Address, u64)> {
        let (address, target_chain_id, expires_at) = self
            .entries
            .get(key)
            .map(|e| (e.address, e.target_chain_id, e.expires_at))?;
        if Instant::now() >= expires_at {
            self.entries.remove(key);
            return None;
        }
        Some((address, target_chain_id))
    }

    /// Insert or refresh an entry; it expires TTL from now.
    pub fn put(&self, key: String, address: Address, target_chain_id: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                address,
                target_chain_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn key_format() {
        assert_eq!(NameAddrCache::key(1, "example.eth"), "1:example.eth");
        assert_eq!(NameAddrCache::key(3334, "foo.w3q"), "3334:foo.w3q");
    }

    #[test]
    fn put_then_get() {
        let cache = NameAddrCache::new(Duration::from_secs(60));
        let addr = address!("0x00000000000000000000000000000000000000aa");
        cache.put(NameAddrCache::key(1, "example.eth"), addr, 100);
        assert_eq!(cache.get("1:example.eth"), Some((addr, 100)));
        assert_eq!(cache.get("5:example.eth"), None);
    }

    #[test]
    fn entries_expire() {
        let cache = NameAddrCache::new(Duration::from_millis(20));
        let addr = address!("0x00000000000000000000000000000000000000aa");
        cache.put("1:example.eth".to_string(), addr, 0);
        assert!(cache.get("1:example.eth").is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("1:example.eth"), None);
    }

    #[test]
    fn put_refreshes_expiry() {
        let cache = NameAddrCache::new(Duration::from_millis(40));
        let addr = address!("0x00000000000000000000000000000000000000aa");
        cache.put("1:a.eth".to_string(), addr, 0);
        std::thread::sleep(Duration::from_millis(25));
        cache.put("1:a.eth".to_string(), addr, 0);
        std::thread::sleep(Duration::from_millis(25));
        // Refreshed 25ms ago with a 40ms TTL: still live.
        assert!(cache.get("1:a.eth").is_some());
    }
}
