use crate::schema::metric_cache;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::serde::Serialize;

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = metric_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetricCacheRecord {
    pub id: i32,
    pub account_id: i32,
    pub metric_type: String,
    pub date_range: String,
    pub payload: String,
    pub last_fetched_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = metric_cache)]
pub struct NewMetricCacheRecord {
    pub account_id: i32,
    pub metric_type: String,
    pub date_range: String,
    pub payload: String,
    pub last_fetched_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = metric_cache)]
pub struct UpdateMetricCacheRecord {
    pub payload: Option<String>,
    pub last_fetched_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Debug)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    pub total_entries: i64,
    pub total_size_bytes: i64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}
