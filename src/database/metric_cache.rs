use crate::database::connection::{DbPool, get_connection_with_retry};
use crate::models::cache::{MetricCacheRecord, NewMetricCacheRecord, UpdateMetricCacheRecord};
use crate::schema::metric_cache;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use log::{debug, warn};

#[derive(QueryableByName)]
struct SumResult {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

pub struct MetricCacheOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> MetricCacheOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get the cache row for one (account, metric type, date range) triple.
    pub fn get_entry(
        &self,
        account_id: i32,
        metric_type: &str,
        date_range: &str,
    ) -> Result<Option<MetricCacheRecord>, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        metric_cache::table
            .filter(metric_cache::account_id.eq(account_id))
            .filter(metric_cache::metric_type.eq(metric_type))
            .filter(metric_cache::date_range.eq(date_range))
            .first::<MetricCacheRecord>(&mut conn)
            .optional()
    }

    /// Create or replace the row for a key triple. At most one row exists
    /// per triple; the write always stamps `last_fetched_at` with now.
    pub fn upsert_entry(
        &self,
        account_id: i32,
        metric_type: &str,
        date_range: &str,
        payload: &str,
    ) -> Result<MetricCacheRecord, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        let now = Utc::now().naive_utc();

        // Try to update existing record first
        let update_result = diesel::update(
            metric_cache::table
                .filter(metric_cache::account_id.eq(account_id))
                .filter(metric_cache::metric_type.eq(metric_type))
                .filter(metric_cache::date_range.eq(date_range)),
        )
        .set(UpdateMetricCacheRecord {
            payload: Some(payload.to_string()),
            last_fetched_at: Some(now),
            updated_at: Some(now),
        })
        .get_result::<MetricCacheRecord>(&mut conn);

        match update_result {
            Ok(record) => {
                debug!(
                    "Updated metric cache entry {account_id}/{metric_type}/{date_range}"
                );
                Ok(record)
            }
            Err(diesel::result::Error::NotFound) => {
                let new_record = NewMetricCacheRecord {
                    account_id,
                    metric_type: metric_type.to_string(),
                    date_range: date_range.to_string(),
                    payload: payload.to_string(),
                    last_fetched_at: now,
                    created_at: now,
                    updated_at: now,
                };

                let result = diesel::insert_into(metric_cache::table)
                    .values(&new_record)
                    .get_result::<MetricCacheRecord>(&mut conn);

                match result {
                    Ok(record) => {
                        debug!(
                            "Created metric cache entry {account_id}/{metric_type}/{date_range}"
                        );
                        Ok(record)
                    }
                    Err(e) => {
                        warn!(
                            "Failed to create metric cache entry {account_id}/{metric_type}/{date_range}: {e}"
                        );
                        Err(e)
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Failed to update metric cache entry {account_id}/{metric_type}/{date_range}: {e}"
                );
                Err(e)
            }
        }
    }

    /// Row count plus summed payload size across all cached views.
    pub fn get_stats(&self) -> Result<(i64, i64), diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        let total_entries: i64 = metric_cache::table
            .count()
            .get_result(&mut conn)
            .unwrap_or(0);

        let total_size_bytes: i64 = diesel::sql_query(
            "SELECT COALESCE(SUM(LENGTH(payload)), 0) as total FROM metric_cache",
        )
        .get_result::<SumResult>(&mut conn)
        .map(|result| result.total)
        .unwrap_or(0);

        Ok((total_entries, total_size_bytes))
    }

    /// Delete every cached view for one account.
    pub fn delete_for_account(&self, account_id: i32) -> Result<usize, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        diesel::delete(metric_cache::table.filter(metric_cache::account_id.eq(account_id)))
            .execute(&mut conn)
    }

    /// Clear all cached views.
    pub fn clear(&self) -> Result<usize, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        diesel::delete(metric_cache::table).execute(&mut conn)
    }
}
