use crate::models::MetricType;
use log::info;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub graph_api_base: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub cache_enabled: bool,
    pub ttl_overview: u64,
    pub ttl_growth: u64,
    pub ttl_posts: u64,
    pub ttl_reels: u64,
    pub ttl_best_time: u64,
    pub ttl_hashtags: u64,
    pub ttl_content_intelligence: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            graph_api_base: "https://graph.instagram.com".to_string(),
            port: 8000,
            host: "127.0.0.1".to_string(),
            database_url: "./data/pulse.db".to_string(),
            cache_enabled: true,
            ttl_overview: 300,
            ttl_growth: 600,
            ttl_posts: 300,
            ttl_reels: 300,
            ttl_best_time: 600,
            ttl_hashtags: 600,
            ttl_content_intelligence: 600,
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Freshness window, in seconds, for a cached view of the given metric type.
    pub fn ttl_for(&self, metric: MetricType) -> u64 {
        match metric {
            MetricType::Overview => self.ttl_overview,
            MetricType::Growth => self.ttl_growth,
            MetricType::Posts => self.ttl_posts,
            MetricType::Reels => self.ttl_reels,
            MetricType::BestTime => self.ttl_best_time,
            MetricType::Hashtags => self.ttl_hashtags,
            MetricType::ContentIntelligence => self.ttl_content_intelligence,
        }
    }

    pub fn from_env() -> Self {
        let graph_api_base = env::var("PULSE_GRAPH_API_BASE")
            .unwrap_or_else(|_| "https://graph.instagram.com".to_string());

        let port = env::var("PULSE_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .unwrap_or(8000);

        let host = env::var("PULSE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let database_url =
            env::var("PULSE_DATABASE_URL").unwrap_or_else(|_| "./data/pulse.db".to_string());

        let cache_enabled = env::var("PULSE_CACHE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let ttl_overview = env_u64("PULSE_TTL_OVERVIEW", 300);
        let ttl_growth = env_u64("PULSE_TTL_GROWTH", 600);
        let ttl_posts = env_u64("PULSE_TTL_POSTS", 300);
        let ttl_reels = env_u64("PULSE_TTL_REELS", 300);
        let ttl_best_time = env_u64("PULSE_TTL_BEST_TIME", 600);
        let ttl_hashtags = env_u64("PULSE_TTL_HASHTAGS", 600);
        let ttl_content_intelligence = env_u64("PULSE_TTL_CONTENT_INTELLIGENCE", 600);

        info!("Configuration loaded:");
        info!("  Graph API Base: {graph_api_base}");
        info!("  Host: {host}");
        info!("  Port: {port}");
        info!("  Database URL: {database_url}");
        info!("  Cache Enabled: {cache_enabled}");
        info!(
            "  Cache TTLs (s): overview={ttl_overview} growth={ttl_growth} posts={ttl_posts} reels={ttl_reels} best_time={ttl_best_time} hashtags={ttl_hashtags}"
        );

        Self {
            graph_api_base,
            port,
            host,
            database_url,
            cache_enabled,
            ttl_overview,
            ttl_growth,
            ttl_posts,
            ttl_reels,
            ttl_best_time,
            ttl_hashtags,
            ttl_content_intelligence,
        }
    }
}
