//! Result-cache policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// Days a stored result stays servable. Expired rows are evicted lazily
    /// on the next lookup.
    pub ttl_days: u32,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { ttl_days: 30 }
    }
}

impl CachePolicy {
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_days as u64 * 86_400
    }
}
