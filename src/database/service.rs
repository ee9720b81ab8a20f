use super::accounts::AccountOperations;
use super::connection::{DbConnection, DbPool, create_pool, get_connection_with_retry};
use super::metric_cache::MetricCacheOperations;
use crate::models::account::{Account, NewAccount};
use crate::models::cache::MetricCacheRecord;

/// Main database service that provides a unified interface to all database operations
#[derive(Debug)]
pub struct DatabaseService {
    pub pool: DbPool,
}

impl DatabaseService {
    /// Creates a new DatabaseService with an initialized connection pool
    pub fn new(database_url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = create_pool(database_url)?;
        Ok(Self { pool })
    }

    /// Gets a connection from the pool with retry logic
    pub fn get_connection(&self) -> Result<DbConnection, diesel::r2d2::Error> {
        get_connection_with_retry(&self.pool)
    }

    // Account operations
    pub fn create_account(&self, new_account: NewAccount) -> Result<Account, diesel::result::Error> {
        let ops = AccountOperations::new(&self.pool);
        ops.create_account(new_account)
    }

    pub fn get_account(&self, account_id: i32) -> Result<Option<Account>, diesel::result::Error> {
        let ops = AccountOperations::new(&self.pool);
        ops.get_account(account_id)
    }

    pub fn get_accounts_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<Account>, diesel::result::Error> {
        let ops = AccountOperations::new(&self.pool);
        ops.get_accounts_for_user(user_id)
    }

    pub fn deactivate_account(&self, account_id: i32) -> Result<usize, diesel::result::Error> {
        let ops = AccountOperations::new(&self.pool);
        ops.deactivate_account(account_id)
    }

    // Metric cache operations
    pub fn get_metric_cache_entry(
        &self,
        account_id: i32,
        metric_type: &str,
        date_range: &str,
    ) -> Result<Option<MetricCacheRecord>, diesel::result::Error> {
        let ops = MetricCacheOperations::new(&self.pool);
        ops.get_entry(account_id, metric_type, date_range)
    }

    pub fn upsert_metric_cache_entry(
        &self,
        account_id: i32,
        metric_type: &str,
        date_range: &str,
        payload: &str,
    ) -> Result<MetricCacheRecord, diesel::result::Error> {
        let ops = MetricCacheOperations::new(&self.pool);
        ops.upsert_entry(account_id, metric_type, date_range, payload)
    }

    pub fn get_metric_cache_stats(&self) -> Result<(i64, i64), diesel::result::Error> {
        let ops = MetricCacheOperations::new(&self.pool);
        ops.get_stats()
    }

    pub fn delete_metric_cache_for_account(
        &self,
        account_id: i32,
    ) -> Result<usize, diesel::result::Error> {
        let ops = MetricCacheOperations::new(&self.pool);
        ops.delete_for_account(account_id)
    }

    pub fn clear_metric_cache(&self) -> Result<usize, diesel::result::Error> {
        let ops = MetricCacheOperations::new(&self.pool);
        ops.clear()
    }
}
