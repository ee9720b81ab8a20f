use crate::config::AppConfig;
use crate::models::{CacheStatsResponse, MetricType};
use crate::services::DatabaseService;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};

/// TTL-bounded store of computed analytics views, keyed by the
/// (account, metric type, date range) triple.
///
/// Reads fail open: any storage error is logged and reported as a miss so
/// the caller recomputes. Writes are best-effort: a storage error is logged
/// and swallowed so caching can never fail the request that produced the
/// value.
#[derive(Debug)]
pub struct MetricCache {
    config: AppConfig,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl MetricCache {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.cache_enabled
    }

    /// Returns the stored payload if the entry is younger than the metric
    /// type's TTL, measured against the wall clock.
    pub fn get(
        &self,
        database: &DatabaseService,
        account_id: i32,
        metric: MetricType,
        date_range: &str,
    ) -> Option<String> {
        self.get_at(database, account_id, metric, date_range, Utc::now())
    }

    /// TTL check against an explicit `now`. Kept separate from [`get`] so
    /// freshness boundaries are testable without clock mocking.
    pub fn get_at(
        &self,
        database: &DatabaseService,
        account_id: i32,
        metric: MetricType,
        date_range: &str,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if !self.config.cache_enabled {
            return None;
        }

        let record = match database.get_metric_cache_entry(account_id, metric.as_str(), date_range)
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for {account_id}/{metric}/{date_range} - no entry");
                return None;
            }
            Err(e) => {
                // Fail open: a storage error must never block recomputation.
                warn!("Cache read failed for {account_id}/{metric}/{date_range}: {e}");
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let age_seconds = (now.naive_utc() - record.last_fetched_at).num_seconds();
        let ttl = self.config.ttl_for(metric) as i64;

        if age_seconds > ttl {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Cache entry expired for {account_id}/{metric}/{date_range} (age {age_seconds}s, ttl {ttl}s)"
            );
            return None;
        }

        self.hit_count.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Cache hit for {account_id}/{metric}/{date_range} (age {age_seconds}s, size {} bytes)",
            record.payload.len()
        );
        Some(record.payload)
    }

    /// Upserts the payload for a key triple, stamping `last_fetched_at`.
    pub fn put(
        &self,
        database: &DatabaseService,
        account_id: i32,
        metric: MetricType,
        date_range: &str,
        payload: &str,
    ) {
        if !self.config.cache_enabled {
            return;
        }

        match database.upsert_metric_cache_entry(account_id, metric.as_str(), date_range, payload)
        {
            Ok(_) => {
                debug!(
                    "Cached {metric} view for account {account_id} ({} bytes)",
                    payload.len()
                );
            }
            Err(e) => {
                warn!("Failed to cache {metric} view for account {account_id}: {e}");
            }
        }
    }

    pub fn get_hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    pub fn get_miss_count(&self) -> u64 {
        self.miss_count.load(Ordering::Relaxed)
    }

    pub fn get_hit_rate(&self) -> f64 {
        let hits = self.get_hit_count();
        let misses = self.get_miss_count();
        let total = hits + misses;

        if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn stats(&self, database: &DatabaseService) -> CacheStatsResponse {
        let (total_entries, total_size_bytes) =
            database.get_metric_cache_stats().unwrap_or((0, 0));

        CacheStatsResponse {
            enabled: self.config.cache_enabled,
            total_entries,
            total_size_bytes,
            hit_count: self.get_hit_count(),
            miss_count: self.get_miss_count(),
            hit_rate: self.get_hit_rate(),
        }
    }

    pub fn clear(&self, database: &DatabaseService) -> Result<usize, diesel::result::Error> {
        let removed = database.clear_metric_cache()?;
        debug!("Cleared {removed} cached views");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_setup() -> (TempDir, DatabaseService, MetricCache) {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("cache_test.db");
        let database =
            DatabaseService::new(db_path.to_str().expect("utf-8 path")).expect("database");
        let cache = MetricCache::new(AppConfig::default());
        (temp_dir, database, cache)
    }

    fn seed_account(database: &DatabaseService) -> i32 {
        use crate::models::{NewAccount, NewUser};
        use crate::schema::users;
        use diesel::prelude::*;

        let mut conn = database.get_connection().expect("connection");
        let user = NewUser::new(
            "tester".to_string(),
            "tester@example.com".to_string(),
            "secret".to_string(),
        )
        .expect("hash");
        diesel::insert_into(users::table)
            .values(&user)
            .execute(&mut conn)
            .expect("insert user");

        let account = database
            .create_account(NewAccount::new(
                1,
                "17841400000000000".to_string(),
                "tester".to_string(),
                "token".to_string(),
                None,
            ))
            .expect("account");
        account.id
    }

    #[test]
    fn test_get_within_ttl_returns_cached_value() {
        let (_tmp, database, cache) = test_setup();
        let account_id = seed_account(&database);

        cache.put(&database, account_id, MetricType::Overview, "default", "{\"v\":1}");

        // overview TTL is 300s: still fresh one second before expiry
        let now = Utc::now() + Duration::seconds(299);
        let value = cache.get_at(&database, account_id, MetricType::Overview, "default", now);
        assert_eq!(value, Some("{\"v\":1}".to_string()));
    }

    #[test]
    fn test_get_past_ttl_is_a_miss() {
        let (_tmp, database, cache) = test_setup();
        let account_id = seed_account(&database);

        cache.put(&database, account_id, MetricType::Overview, "default", "{\"v\":1}");

        let now = Utc::now() + Duration::seconds(301);
        let value = cache.get_at(&database, account_id, MetricType::Overview, "default", now);
        assert_eq!(value, None);
        assert_eq!(cache.get_miss_count(), 1);
    }

    #[test]
    fn test_ttl_differs_per_metric_type() {
        let (_tmp, database, cache) = test_setup();
        let account_id = seed_account(&database);

        cache.put(&database, account_id, MetricType::Growth, "period:week", "{\"v\":2}");

        // growth TTL is 600s: an entry stale for overview is still fresh here
        let now = Utc::now() + Duration::seconds(599);
        let value = cache.get_at(&database, account_id, MetricType::Growth, "period:week", now);
        assert_eq!(value, Some("{\"v\":2}".to_string()));
    }

    #[test]
    fn test_second_write_wins() {
        let (_tmp, database, cache) = test_setup();
        let account_id = seed_account(&database);

        cache.put(&database, account_id, MetricType::Posts, "limit:50", "{\"v\":1}");
        cache.put(&database, account_id, MetricType::Posts, "limit:50", "{\"v\":2}");

        let (total_entries, _) = database.get_metric_cache_stats().expect("stats");
        assert_eq!(total_entries, 1);

        let value = cache.get(&database, account_id, MetricType::Posts, "limit:50");
        assert_eq!(value, Some("{\"v\":2}".to_string()));
    }

    #[test]
    fn test_distinct_key_triples_do_not_collide() {
        let (_tmp, database, cache) = test_setup();
        let account_id = seed_account(&database);

        cache.put(&database, account_id, MetricType::Posts, "limit:10", "{\"v\":1}");
        cache.put(&database, account_id, MetricType::Posts, "limit:50", "{\"v\":2}");
        cache.put(&database, account_id, MetricType::Reels, "default", "{\"v\":3}");

        let (total_entries, _) = database.get_metric_cache_stats().expect("stats");
        assert_eq!(total_entries, 3);

        assert_eq!(
            cache.get(&database, account_id, MetricType::Posts, "limit:10"),
            Some("{\"v\":1}".to_string())
        );
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let (_tmp, database, _) = test_setup();
        let account_id = seed_account(&database);

        let config = AppConfig {
            cache_enabled: false,
            ..AppConfig::default()
        };
        let cache = MetricCache::new(config);

        cache.put(&database, account_id, MetricType::Overview, "default", "{\"v\":1}");
        let value = cache.get(&database, account_id, MetricType::Overview, "default");
        assert_eq!(value, None);
    }

    #[test]
    fn test_clear_removes_all_entries() {
        let (_tmp, database, cache) = test_setup();
        let account_id = seed_account(&database);

        cache.put(&database, account_id, MetricType::Overview, "default", "{}");
        cache.put(&database, account_id, MetricType::Reels, "default", "{}");

        let removed = cache.clear(&database).expect("clear");
        assert_eq!(removed, 2);

        let (total_entries, _) = database.get_metric_cache_stats().expect("stats");
        assert_eq!(total_entries, 0);
    }
}
