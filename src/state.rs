use crate::config::AppConfig;
use crate::services::{DatabaseService, MetricCache};
use std::sync::Arc;

#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub client: reqwest::Client,
    pub cache: Arc<MetricCache>,
    pub database: Arc<DatabaseService>,
}
