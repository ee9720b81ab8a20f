use crate::database::connection::{DbPool, get_connection_with_retry};
use crate::models::account::{Account, NewAccount};
use crate::schema::accounts;
use diesel::prelude::*;

/// Connected-account database operations
pub struct AccountOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> AccountOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    pub fn create_account(&self, new_account: NewAccount) -> Result<Account, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        diesel::insert_into(accounts::table)
            .values(&new_account)
            .get_result::<Account>(&mut conn)
    }

    pub fn get_account(&self, account_id: i32) -> Result<Option<Account>, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        accounts::table
            .filter(accounts::id.eq(account_id))
            .filter(accounts::is_active.eq(true))
            .first::<Account>(&mut conn)
            .optional()
    }

    pub fn get_accounts_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<Account>, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        accounts::table
            .filter(accounts::user_id.eq(user_id))
            .filter(accounts::is_active.eq(true))
            .order(accounts::created_at.asc())
            .load::<Account>(&mut conn)
    }

    /// Soft-deletes an account. Cached views for it stay behind but become
    /// unreachable; the cache admin endpoint can clear them.
    pub fn deactivate_account(&self, account_id: i32) -> Result<usize, diesel::result::Error> {
        let mut conn = get_connection_with_retry(self.pool).map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        diesel::update(accounts::table.filter(accounts::id.eq(account_id)))
            .set((
                accounts::is_active.eq(false),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
    }
}
