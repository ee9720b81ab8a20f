use crate::models::media::{Demographics, MediaType};
use chrono::{DateTime, NaiveDate, Utc};
use rocket::serde::{Deserialize, Serialize};

/// The cacheable metric types. The string form is the `metric_type`
/// component of the cache key and must stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Overview,
    Growth,
    Posts,
    Reels,
    BestTime,
    Hashtags,
    ContentIntelligence,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Overview => "overview",
            MetricType::Growth => "growth",
            MetricType::Posts => "posts",
            MetricType::Reels => "reels",
            MetricType::BestTime => "best_time",
            MetricType::Hashtags => "hashtags",
            MetricType::ContentIntelligence => "content_intelligence",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact post record carried inside views.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostSummary {
    pub id: String,
    pub caption: String,
    pub media_type: MediaType,
    pub permalink: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub like_count: i64,
    pub comments_count: i64,
    pub engagement: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Overview {
    pub username: String,
    pub followers_count: i64,
    pub follows_count: i64,
    pub media_count: i64,
    /// (mean per-post engagement / followers) * 100, rounded to 2 decimals.
    pub engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub total_impressions: i64,
    pub total_reach: i64,
    pub total_saved: i64,
    pub recent_posts: Vec<PostSummary>,
    pub demographics: Demographics,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub posts: i64,
    pub engagement: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Growth {
    pub period: String,
    pub daily_activity: Vec<DailyActivity>,
    pub this_week_engagement: i64,
    pub last_week_engagement: i64,
    /// Week-over-week change in percent, rounded to 1 decimal.
    pub engagement_change_pct: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HourlyEngagement {
    pub hour: u32,
    pub posts: i64,
    pub avg_engagement: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DayEngagement {
    pub day: String,
    pub posts: i64,
    pub avg_engagement: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BestTimeToPost {
    /// Hour buckets (0-23) that received at least one post, ascending by hour.
    pub hourly: Vec<HourlyEngagement>,
    /// Day-of-week buckets, Sunday first.
    pub daily: Vec<DayEngagement>,
    pub best_hours: Vec<HourlyEngagement>,
    pub best_days: Vec<DayEngagement>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HashtagStats {
    pub tag: String,
    pub usage_count: i64,
    pub total_engagement: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub avg_engagement: f64,
    /// avg reach of posts carrying the tag / avg reach of all posts.
    pub reach_multiplier: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HashtagAnalysis {
    pub top_by_engagement: Vec<HashtagStats>,
    pub top_by_usage: Vec<HashtagStats>,
    pub reach_expanders: Vec<HashtagStats>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FormatStats {
    pub format: String,
    pub posts: i64,
    pub avg_engagement: f64,
    pub avg_reach: f64,
    pub avg_saved: f64,
    /// Average engagement normalized by follower count, in percent.
    pub engagement_rate: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CaptionLengthBucket {
    pub label: String,
    pub posts: i64,
    pub avg_engagement: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScoredPost {
    pub id: String,
    pub score: f64,
    /// Human-readable top contributing factors, at most two.
    pub factors: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScoreDistribution {
    pub excellent: i64,
    pub good: i64,
    pub average: i64,
    pub poor: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContentIntelligence {
    pub format_battle: Vec<FormatStats>,
    pub winning_format: Option<String>,
    pub caption_lengths: Vec<CaptionLengthBucket>,
    pub optimal_caption_length: Option<String>,
    pub avg_viral_coefficient: f64,
    /// Post ids whose save-to-like ratio exceeds 0.05.
    pub high_value_posts: Vec<String>,
    /// Post ids younger than 24h with engagement velocity above 10/h.
    pub fast_starters: Vec<String>,
    pub scored_posts: Vec<ScoredPost>,
    pub score_distribution: ScoreDistribution,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ReelsSplit {
    pub posts: i64,
    pub total_engagement: i64,
    pub avg_engagement: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_impressions: f64,
    pub avg_reach: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReelsAnalytics {
    pub reels: ReelsSplit,
    pub other: ReelsSplit,
    /// reel avg engagement / non-reel avg engagement, 0 when the latter is 0.
    pub reel_multiplier: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PostsAnalytics {
    pub total_posts: i64,
    pub total_engagement: i64,
    pub avg_engagement: f64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_reach: i64,
    pub top_by_engagement: Vec<String>,
    pub top_by_likes: Vec<String>,
    pub top_by_comments: Vec<String>,
    pub top_by_reach: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Per-account slice of the unified cross-account overview.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccountOverview {
    pub account_id: i32,
    pub username: String,
    pub followers_count: i64,
    pub media_count: i64,
    pub engagement_rate: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UnifiedOverview {
    pub accounts_included: i64,
    pub accounts: Vec<AccountOverview>,
    pub total_followers: i64,
    pub total_posts: i64,
    pub avg_engagement_rate: f64,
    pub last_updated: DateTime<Utc>,
}
