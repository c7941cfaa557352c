//! # planfact-storage
//!
//! SQLite-backed result cache for the extraction pipeline. Results are keyed
//! by content hash, carry a schema version, and expire after the policy TTL;
//! expired rows are evicted lazily on the next lookup. Every failure mode is
//! non-fatal to callers; the pipeline treats a broken cache as a miss.

use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension};

use planfact_core::config::CachePolicy;
use planfact_core::errors::StorageError;
use planfact_core::traits::ResultStore;
use planfact_core::types::result::ExtractionResult;

/// Bumped whenever the persisted result layout changes; rows written under
/// any other version are treated as misses and evicted.
const SCHEMA_VERSION: u32 = 1;

/// Content-hash-keyed SQLite result cache.
///
/// Cache traffic is two calls per run (one read, one write), so a single
/// mutex-guarded connection is plenty.
pub struct SqliteResultCache {
    conn: Mutex<Connection>,
    policy: CachePolicy,
}

impl SqliteResultCache {
    /// Open (and initialize if needed) a file-backed cache.
    pub fn open(path: &Path, policy: CachePolicy) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqe)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(sqe)?;
        Self::initialize(conn, policy)
    }

    /// In-memory cache for tests.
    pub fn open_in_memory(policy: CachePolicy) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqe)?;
        Self::initialize(conn, policy)
    }

    fn initialize(conn: Connection, policy: CachePolicy) -> Result<Self, StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS extraction_results (
                content_hash   TEXT PRIMARY KEY,
                schema_version INTEGER NOT NULL,
                payload        TEXT NOT NULL,
                stored_at      INTEGER NOT NULL
            );",
        )
        .map_err(sqe)?;
        Ok(Self {
            conn: Mutex::new(conn),
            policy,
        })
    }

    fn evict(conn: &Connection, content_hash: &str) {
        // Best-effort; a failed eviction only means one stale row.
        let _ = conn.execute(
            "DELETE FROM extraction_results WHERE content_hash = ?1",
            [content_hash],
        );
    }
}

impl ResultStore for SqliteResultCache {
    fn load(&self, content_hash: &str) -> Result<Option<ExtractionResult>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Sqlite {
            message: "cache connection poisoned".to_string(),
        })?;

        let row: Option<(u32, String, u64)> = conn
            .query_row(
                "SELECT schema_version, payload, stored_at
                 FROM extraction_results WHERE content_hash = ?1",
                [content_hash],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(sqe)?;

        let Some((version, payload, stored_at)) = row else {
            return Ok(None);
        };

        if version != SCHEMA_VERSION {
            tracing::debug!(found = version, expected = SCHEMA_VERSION, "cache schema mismatch");
            Self::evict(&conn, content_hash);
            return Ok(None);
        }
        if now_secs() >= stored_at.saturating_add(self.policy.ttl_secs()) {
            tracing::debug!(content_hash, "cache row expired, evicting");
            Self::evict(&conn, content_hash);
            return Ok(None);
        }

        match serde_json::from_str(&payload) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                // A corrupt row is a miss, not an error surface.
                Self::evict(&conn, content_hash);
                Err(StorageError::Decode {
                    message: e.to_string(),
                })
            }
        }
    }

    fn store(&self, content_hash: &str, result: &ExtractionResult) -> Result<(), StorageError> {
        let payload = serde_json::to_string(result).map_err(|e| StorageError::Decode {
            message: e.to_string(),
        })?;
        let conn = self.conn.lock().map_err(|_| StorageError::Sqlite {
            message: "cache connection poisoned".to_string(),
        })?;
        conn.execute(
            "INSERT OR REPLACE INTO extraction_results
             (content_hash, schema_version, payload, stored_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![content_hash, SCHEMA_VERSION, payload, now_secs()],
        )
        .map_err(sqe)?;
        Ok(())
    }
}

fn sqe(e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite {
        message: e.to_string(),
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planfact_core::types::result::{CacheStatus, RunStatus};
    use planfact_core::types::signal::{Evidence, Signal, SourceType};

    fn sample_result() -> ExtractionResult {
        let mut result = ExtractionResult::empty(RunStatus::Complete);
        result.content_hash = Some("abc123".to_string());
        result.facts.total_units = Some(Signal::new(
            14,
            0.91,
            Evidence::from_text(0, "PROPOSED 14 UNIT", SourceType::CoverSheet, 0.9),
        ));
        result.redundancy_score = 0.85;
        result
    }

    #[test]
    fn round_trip_returns_the_stored_result() {
        let cache = SqliteResultCache::open_in_memory(CachePolicy::default()).unwrap();
        let stored = sample_result();
        cache.store("abc123", &stored).unwrap();

        let loaded = cache.load("abc123").unwrap().unwrap();
        assert_eq!(loaded.facts.total_units.as_ref().unwrap().value, 14);
        assert_eq!(loaded.redundancy_score, stored.redundancy_score);
        assert_eq!(loaded.cache_status, CacheStatus::Computed);

        // The hit marker is applied by the consumer, nothing else changes.
        let tagged = loaded.as_cache_hit();
        assert_eq!(tagged.cache_status, CacheStatus::Hit);
        assert_eq!(tagged.redundancy_score, stored.redundancy_score);
    }

    #[test]
    fn unknown_hash_is_a_miss() {
        let cache = SqliteResultCache::open_in_memory(CachePolicy::default()).unwrap();
        assert!(cache.load("missing").unwrap().is_none());
    }

    #[test]
    fn expired_rows_are_evicted_on_lookup() {
        // ttl_days = 0 expires rows immediately.
        let cache = SqliteResultCache::open_in_memory(CachePolicy { ttl_days: 0 }).unwrap();
        cache.store("h", &sample_result()).unwrap();
        assert!(cache.load("h").unwrap().is_none());

        // The row is gone, not merely filtered.
        let conn = cache.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM extraction_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn schema_version_mismatch_is_a_miss() {
        let cache = SqliteResultCache::open_in_memory(CachePolicy::default()).unwrap();
        cache.store("h", &sample_result()).unwrap();
        {
            let conn = cache.conn.lock().unwrap();
            conn.execute("UPDATE extraction_results SET schema_version = 999", [])
                .unwrap();
        }
        assert!(cache.load("h").unwrap().is_none());
    }

    #[test]
    fn file_backed_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planfact-cache.db");
        {
            let cache = SqliteResultCache::open(&path, CachePolicy::default()).unwrap();
            cache.store("h", &sample_result()).unwrap();
        }
        let cache = SqliteResultCache::open(&path, CachePolicy::default()).unwrap();
        assert!(cache.load("h").unwrap().is_some());
    }
}
