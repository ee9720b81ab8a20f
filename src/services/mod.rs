pub mod analytics;
pub mod auth;
pub mod cache;
pub mod export;
pub mod graph;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use cache::MetricCache;
pub use export::{ExportFormat, ExportService};
pub use graph::GraphClient;

pub use crate::database::DatabaseService;
