use crate::schema::accounts;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::serde::{Deserialize, Serialize};

/// A connected remote social account. The stored access token is the
/// credential the analytics service resolves at initialization time.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Account {
    pub id: i32,
    pub user_id: i32,
    pub remote_user_id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub token_expires_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_active: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = accounts)]
pub struct NewAccount {
    pub user_id: i32,
    pub remote_user_id: String,
    pub username: String,
    pub access_token: String,
    pub token_expires_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_active: bool,
}

impl NewAccount {
    pub fn new(
        user_id: i32,
        remote_user_id: String,
        username: String,
        access_token: String,
        token_expires_at: Option<NaiveDateTime>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            user_id,
            remote_user_id,
            username,
            access_token,
            token_expires_at,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }
}

/// Payload for connecting an account. The token exchange itself happens in
/// an external collaborator; this endpoint receives the resulting bearer
/// token.
#[derive(Deserialize, Debug)]
pub struct ConnectAccountRequest {
    pub remote_user_id: String,
    pub username: String,
    pub access_token: String,
    pub token_expires_at: Option<NaiveDateTime>,
}
