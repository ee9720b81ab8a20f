use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{
    AccountOverview, BestTimeToPost, CaptionLengthBucket, ContentIntelligence,
    DailyActivity, DayEngagement, Demographics, FormatStats, Growth, HashtagAnalysis,
    HashtagStats, HourlyEngagement, MediaItem, MediaType, MetricType, Overview, PostSummary,
    PostsAnalytics, Profile, ReelsAnalytics, ReelsSplit, ScoreDistribution, ScoredPost,
    UnifiedOverview,
};
use crate::services::{DatabaseService, GraphClient, MetricCache};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use log::{debug, info, warn};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

const OVERVIEW_MEDIA_COUNT: usize = 30;
const GROWTH_MEDIA_COUNT: usize = 100;
const BEST_TIME_MEDIA_COUNT: usize = 100;
const HASHTAG_MEDIA_COUNT: usize = 100;
const CONTENT_MEDIA_COUNT: usize = 100;
const REELS_MEDIA_COUNT: usize = 100;
const DEFAULT_POSTS_LIMIT: usize = 50;
const RECENT_POSTS_SHOWN: usize = 10;
const TOP_LIST_SIZE: usize = 10;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Orchestrates the remote client and the metric cache into named analytics
/// views for one (user, account) pair. `init` must resolve the account's
/// credential before any view method is called.
pub struct AnalyticsService {
    user_id: i32,
    account_id: i32,
    config: AppConfig,
    client: reqwest::Client,
    cache: Arc<MetricCache>,
    database: Arc<DatabaseService>,
    graph: Option<GraphClient>,
}

impl AnalyticsService {
    pub fn new(
        config: AppConfig,
        client: reqwest::Client,
        cache: Arc<MetricCache>,
        database: Arc<DatabaseService>,
        user_id: i32,
        account_id: i32,
    ) -> Self {
        Self {
            user_id,
            account_id,
            config,
            client,
            cache,
            database,
            graph: None,
        }
    }

    /// Resolves the account's stored access credential and builds the
    /// remote client. An expired or missing token is reported to the caller
    /// as a re-authentication instruction; no refresh is attempted here.
    pub fn init(&mut self) -> Result<(), ApiError> {
        let account = self
            .database
            .get_account(self.account_id)
            .map_err(|e| ApiError::DatabaseError(format!("Failed to load account: {e}")))?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Account {} not found", self.account_id))
            })?;

        if account.user_id != self.user_id {
            return Err(ApiError::Forbidden(
                "Account does not belong to this user".to_string(),
            ));
        }

        if let Some(expires_at) = account.token_expires_at {
            if Utc::now().naive_utc() > expires_at {
                return Err(ApiError::Unauthorized(
                    "Access token expired; reconnect the account".to_string(),
                ));
            }
        }

        self.graph = Some(GraphClient::new(
            self.client.clone(),
            self.config.graph_api_base.clone(),
            account.remote_user_id,
            account.access_token,
        ));
        debug!("Analytics service initialized for account {}", self.account_id);
        Ok(())
    }

    fn graph(&self) -> Result<&GraphClient, ApiError> {
        self.graph.as_ref().ok_or_else(|| {
            ApiError::NotInitialized(
                "Analytics service used before credential resolution".to_string(),
            )
        })
    }

    fn cached<T: serde::de::DeserializeOwned>(
        &self,
        metric: MetricType,
        date_range: &str,
    ) -> Option<T> {
        let payload = self
            .cache
            .get(&self.database, self.account_id, metric, date_range)?;
        match serde_json::from_str::<T>(&payload) {
            Ok(view) => Some(view),
            Err(e) => {
                warn!("Discarding undeserializable cached {metric} view: {e}");
                None
            }
        }
    }

    fn store<T: serde::Serialize>(&self, metric: MetricType, date_range: &str, view: &T) {
        match serde_json::to_string(view) {
            Ok(payload) => {
                self.cache
                    .put(&self.database, self.account_id, metric, date_range, &payload)
            }
            Err(e) => warn!("Failed to serialize {metric} view for caching: {e}"),
        }
    }

    /// Profile + recent media + best-effort demographics. A demographics
    /// failure leaves the breakdowns empty; profile and media failures are
    /// fatal.
    pub async fn get_overview(&self) -> Result<Overview, ApiError> {
        let graph = self.graph()?;

        if let Some(view) = self.cached::<Overview>(MetricType::Overview, "default") {
            return Ok(view);
        }

        let profile = graph.get_profile().await?;
        let media = graph.get_all_media_with_insights(OVERVIEW_MEDIA_COUNT).await?;
        let demographics = graph.get_follower_demographics().await;

        let view = compute_overview(&profile, &media, demographics, Utc::now());
        self.store(MetricType::Overview, "default", &view);
        info!("Computed overview for account {}", self.account_id);
        Ok(view)
    }

    /// Daily posting activity and week-over-week engagement comparison.
    /// The period label scopes the cache key; it does not yet bound the
    /// media query.
    pub async fn get_growth(&self, period: &str) -> Result<Growth, ApiError> {
        let graph = self.graph()?;
        let date_range = format!("period:{period}");

        if let Some(view) = self.cached::<Growth>(MetricType::Growth, &date_range) {
            return Ok(view);
        }

        let media = graph.get_all_media_with_insights(GROWTH_MEDIA_COUNT).await?;
        let view = compute_growth(&media, period, Utc::now());
        self.store(MetricType::Growth, &date_range, &view);
        Ok(view)
    }

    pub async fn get_best_times(&self) -> Result<BestTimeToPost, ApiError> {
        let graph = self.graph()?;

        if let Some(view) = self.cached::<BestTimeToPost>(MetricType::BestTime, "default") {
            return Ok(view);
        }

        let media = graph
            .get_all_media_with_insights(BEST_TIME_MEDIA_COUNT)
            .await?;
        let view = compute_best_times(&media, Utc::now());
        self.store(MetricType::BestTime, "default", &view);
        Ok(view)
    }

    pub async fn get_hashtags(&self) -> Result<HashtagAnalysis, ApiError> {
        let graph = self.graph()?;

        if let Some(view) = self.cached::<HashtagAnalysis>(MetricType::Hashtags, "default") {
            return Ok(view);
        }

        let media = graph.get_all_media_with_insights(HASHTAG_MEDIA_COUNT).await?;
        let view = compute_hashtags(&media, Utc::now());
        self.store(MetricType::Hashtags, "default", &view);
        Ok(view)
    }

    pub async fn get_content_intelligence(&self) -> Result<ContentIntelligence, ApiError> {
        let graph = self.graph()?;

        if let Some(view) =
            self.cached::<ContentIntelligence>(MetricType::ContentIntelligence, "default")
        {
            return Ok(view);
        }

        let profile = graph.get_profile().await?;
        let media = graph.get_all_media_with_insights(CONTENT_MEDIA_COUNT).await?;
        let view = compute_content_intelligence(
            &media,
            profile.followers_count,
            Utc::now(),
        );
        self.store(MetricType::ContentIntelligence, "default", &view);
        Ok(view)
    }

    pub async fn get_reels(&self) -> Result<ReelsAnalytics, ApiError> {
        let graph = self.graph()?;

        if let Some(view) = self.cached::<ReelsAnalytics>(MetricType::Reels, "default") {
            return Ok(view);
        }

        let media = graph.get_all_media_with_insights(REELS_MEDIA_COUNT).await?;
        let view = compute_reels(&media, Utc::now());
        self.store(MetricType::Reels, "default", &view);
        Ok(view)
    }

    pub async fn get_posts(&self, limit: Option<usize>) -> Result<PostsAnalytics, ApiError> {
        let graph = self.graph()?;
        let limit = limit.unwrap_or(DEFAULT_POSTS_LIMIT);
        let date_range = format!("limit:{limit}");

        if let Some(view) = self.cached::<PostsAnalytics>(MetricType::Posts, &date_range) {
            return Ok(view);
        }

        let media = graph.get_all_media_with_insights(limit).await?;
        let view = compute_posts(&media, Utc::now());
        self.store(MetricType::Posts, &date_range, &view);
        Ok(view)
    }
}

/// Cross-account overview: one analytics service per active account, all
/// fetches issued concurrently. An account whose fetch fails is logged and
/// excluded from the aggregate; the call itself never fails because of one
/// account.
pub async fn unified_overview(
    config: AppConfig,
    client: reqwest::Client,
    cache: Arc<MetricCache>,
    database: Arc<DatabaseService>,
    user_id: i32,
) -> Result<UnifiedOverview, ApiError> {
    let accounts = database
        .get_accounts_for_user(user_id)
        .map_err(|e| ApiError::DatabaseError(format!("Failed to list accounts: {e}")))?;

    let mut handles = Vec::new();
    for account in accounts {
        let config = config.clone();
        let client = client.clone();
        let cache = Arc::clone(&cache);
        let database = Arc::clone(&database);
        let account_id = account.id;

        handles.push(tokio::spawn(async move {
            let mut service =
                AnalyticsService::new(config, client, cache, database, user_id, account_id);
            service.init()?;
            let overview = service.get_overview().await?;
            Ok::<(i32, Overview), ApiError>((account_id, overview))
        }));
    }

    let mut parts = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok((account_id, overview))) => parts.push(AccountOverview {
                account_id,
                username: overview.username,
                followers_count: overview.followers_count,
                media_count: overview.media_count,
                engagement_rate: overview.engagement_rate,
            }),
            Ok(Err(e)) => warn!("Excluding account from unified overview: {e:?}"),
            Err(e) => warn!("Unified overview task failed: {e}"),
        }
    }

    Ok(build_unified(parts, Utc::now()))
}

fn build_unified(parts: Vec<AccountOverview>, now: DateTime<Utc>) -> UnifiedOverview {
    let total_followers = parts.iter().map(|a| a.followers_count).sum();
    let total_posts = parts.iter().map(|a| a.media_count).sum();
    let avg_engagement_rate = if parts.is_empty() {
        0.0
    } else {
        round2(parts.iter().map(|a| a.engagement_rate).sum::<f64>() / parts.len() as f64)
    };

    UnifiedOverview {
        accounts_included: parts.len() as i64,
        accounts: parts,
        total_followers,
        total_posts,
        avg_engagement_rate,
        last_updated: now,
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn sort_desc_f64<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}

fn to_post_summary(item: &MediaItem) -> PostSummary {
    PostSummary {
        id: item.id.clone(),
        caption: item.caption.clone(),
        media_type: item.media_type,
        permalink: item.permalink.clone(),
        timestamp: item.timestamp,
        like_count: item.like_count,
        comments_count: item.comments_count,
        engagement: item.engagement,
    }
}

fn compute_overview(
    profile: &Profile,
    media: &[MediaItem],
    demographics: Demographics,
    now: DateTime<Utc>,
) -> Overview {
    let post_count = media.len() as f64;
    let total_engagement: i64 = media.iter().map(|m| m.engagement).sum();
    let total_likes: i64 = media.iter().map(|m| m.like_count).sum();
    let total_comments: i64 = media.iter().map(|m| m.comments_count).sum();

    let avg_engagement = if media.is_empty() {
        0.0
    } else {
        total_engagement as f64 / post_count
    };

    let engagement_rate = if profile.followers_count > 0 {
        round2(avg_engagement / profile.followers_count as f64 * 100.0)
    } else {
        0.0
    };

    let avg_likes = if media.is_empty() {
        0.0
    } else {
        (total_likes as f64 / post_count).round()
    };
    let avg_comments = if media.is_empty() {
        0.0
    } else {
        (total_comments as f64 / post_count).round()
    };

    Overview {
        username: profile.username.clone(),
        followers_count: profile.followers_count,
        follows_count: profile.follows_count,
        media_count: profile.media_count,
        engagement_rate,
        avg_likes,
        avg_comments,
        total_impressions: media.iter().map(|m| m.impressions).sum(),
        total_reach: media.iter().map(|m| m.reach).sum(),
        total_saved: media.iter().map(|m| m.saved).sum(),
        recent_posts: media.iter().take(RECENT_POSTS_SHOWN).map(to_post_summary).collect(),
        demographics,
        last_updated: now,
    }
}

fn compute_growth(media: &[MediaItem], period: &str, now: DateTime<Utc>) -> Growth {
    let mut daily: std::collections::BTreeMap<chrono::NaiveDate, (i64, i64)> =
        std::collections::BTreeMap::new();
    for item in media {
        let entry = daily.entry(item.timestamp.date_naive()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += item.engagement;
    }

    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let this_week_engagement: i64 = media
        .iter()
        .filter(|m| m.timestamp > week_ago)
        .map(|m| m.engagement)
        .sum();
    let last_week_engagement: i64 = media
        .iter()
        .filter(|m| m.timestamp > two_weeks_ago && m.timestamp <= week_ago)
        .map(|m| m.engagement)
        .sum();

    let engagement_change_pct = if last_week_engagement == 0 {
        0.0
    } else {
        round1(
            (this_week_engagement - last_week_engagement) as f64
                / last_week_engagement as f64
                * 100.0,
        )
    };

    Growth {
        period: period.to_string(),
        daily_activity: daily
            .into_iter()
            .map(|(date, (posts, engagement))| DailyActivity {
                date,
                posts,
                engagement,
            })
            .collect(),
        this_week_engagement,
        last_week_engagement,
        engagement_change_pct,
        last_updated: now,
    }
}

fn compute_best_times(media: &[MediaItem], now: DateTime<Utc>) -> BestTimeToPost {
    let mut hours = [(0i64, 0i64); 24];
    let mut days = [(0i64, 0i64); 7];

    for item in media {
        let hour = item.timestamp.hour() as usize;
        hours[hour].0 += 1;
        hours[hour].1 += item.engagement;

        let day = item.timestamp.weekday().num_days_from_sunday() as usize;
        days[day].0 += 1;
        days[day].1 += item.engagement;
    }

    let hourly: Vec<HourlyEngagement> = (0..24)
        .filter(|&h| hours[h].0 > 0)
        .map(|h| HourlyEngagement {
            hour: h as u32,
            posts: hours[h].0,
            avg_engagement: round2(hours[h].1 as f64 / hours[h].0 as f64),
        })
        .collect();

    let daily: Vec<DayEngagement> = (0..7)
        .map(|d| DayEngagement {
            day: DAY_NAMES[d].to_string(),
            posts: days[d].0,
            avg_engagement: if days[d].0 > 0 {
                round2(days[d].1 as f64 / days[d].0 as f64)
            } else {
                0.0
            },
        })
        .collect();

    let mut best_hours = hourly.clone();
    sort_desc_f64(&mut best_hours, |h| h.avg_engagement);
    best_hours.truncate(3);

    let mut best_days: Vec<DayEngagement> =
        daily.iter().filter(|d| d.posts > 0).cloned().collect();
    sort_desc_f64(&mut best_days, |d| d.avg_engagement);
    best_days.truncate(3);

    BestTimeToPost {
        hourly,
        daily,
        best_hours,
        best_days,
        last_updated: now,
    }
}

/// Case-folded `#word` tokens of a caption, deduplicated so a post counts
/// once per tag.
fn extract_hashtags(caption: &str) -> Vec<String> {
    static HASHTAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = HASHTAG_RE.get_or_init(|| Regex::new(r"#(\w+)").expect("hashtag pattern"));

    let mut tags: Vec<String> = Vec::new();
    for cap in re.captures_iter(caption) {
        let tag = format!("#{}", cap[1].to_lowercase());
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn compute_hashtags(media: &[MediaItem], now: DateTime<Utc>) -> HashtagAnalysis {
    #[derive(Default)]
    struct TagAcc {
        usage: i64,
        engagement: i64,
        likes: i64,
        comments: i64,
        reach: i64,
    }

    let mut tags: HashMap<String, TagAcc> = HashMap::new();
    for item in media {
        for tag in extract_hashtags(&item.caption) {
            let acc = tags.entry(tag).or_default();
            acc.usage += 1;
            acc.engagement += item.engagement;
            acc.likes += item.like_count;
            acc.comments += item.comments_count;
            acc.reach += item.reach;
        }
    }

    let avg_all_reach = if media.is_empty() {
        0.0
    } else {
        media.iter().map(|m| m.reach).sum::<i64>() as f64 / media.len() as f64
    };

    let mut stats: Vec<HashtagStats> = tags
        .into_iter()
        .map(|(tag, acc)| {
            let avg_engagement = round2(acc.engagement as f64 / acc.usage as f64);
            let tag_avg_reach = acc.reach as f64 / acc.usage as f64;
            let reach_multiplier = if avg_all_reach > 0.0 {
                round2(tag_avg_reach / avg_all_reach)
            } else {
                0.0
            };
            HashtagStats {
                tag,
                usage_count: acc.usage,
                total_engagement: acc.engagement,
                total_likes: acc.likes,
                total_comments: acc.comments,
                avg_engagement,
                reach_multiplier,
            }
        })
        .collect();

    let mut top_by_engagement = stats.clone();
    sort_desc_f64(&mut top_by_engagement, |s| s.avg_engagement);
    top_by_engagement.truncate(20);

    stats.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
    let mut top_by_usage = stats.clone();
    top_by_usage.truncate(20);

    let mut reach_expanders: Vec<HashtagStats> = stats
        .into_iter()
        .filter(|s| s.reach_multiplier > 1.0)
        .collect();
    sort_desc_f64(&mut reach_expanders, |s| s.reach_multiplier);
    reach_expanders.truncate(10);

    HashtagAnalysis {
        top_by_engagement,
        top_by_usage,
        reach_expanders,
        last_updated: now,
    }
}

const CAPTION_BUCKETS: [(&str, usize, usize); 4] = [
    ("0-50", 0, 50),
    ("51-150", 51, 150),
    ("151-300", 151, 300),
    ("300+", 301, usize::MAX),
];

/// Weighted composite quality score for one post, plus the top two
/// contributing factors above their reporting thresholds.
fn composite_score(item: &MediaItem, followers: i64) -> (f64, Vec<String>) {
    let f_engagement = if followers > 0 {
        item.engagement as f64 / followers as f64 * 1000.0
    } else {
        0.0
    };
    let f_reach = if followers > 0 {
        item.reach as f64 / followers as f64 * 100.0
    } else {
        0.0
    };
    let f_saved = item.saved as f64 * 10.0;
    let f_viral = if item.reach > 0 {
        item.saved as f64 / item.reach as f64 * 1000.0
    } else {
        0.0
    };
    let f_comments = item.comments_count as f64 * 20.0;

    let weighted = [
        (0.25 * f_engagement, f_engagement, 50.0, "strong engagement for the audience size"),
        (0.25 * f_reach, f_reach, 50.0, "reach well beyond the follower base"),
        (0.20 * f_saved, f_saved, 30.0, "highly saveable content"),
        (0.15 * f_viral, f_viral, 20.0, "saves spreading it to new viewers"),
        (0.15 * f_comments, f_comments, 20.0, "sparks conversation"),
    ];

    let score = weighted.iter().map(|(w, _, _, _)| w).sum();

    let mut qualifying: Vec<&(f64, f64, f64, &str)> = weighted
        .iter()
        .filter(|(_, raw, threshold, _)| raw > threshold)
        .collect();
    qualifying.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    let factors = qualifying
        .iter()
        .take(2)
        .map(|(_, _, _, label)| (*label).to_string())
        .collect();

    (score, factors)
}

fn compute_content_intelligence(
    media: &[MediaItem],
    followers: i64,
    now: DateTime<Utc>,
) -> ContentIntelligence {
    // (a) format battle
    let mut formats: HashMap<MediaType, (i64, i64, i64, i64)> = HashMap::new();
    for item in media {
        let acc = formats.entry(item.media_type).or_insert((0, 0, 0, 0));
        acc.0 += 1;
        acc.1 += item.engagement;
        acc.2 += item.reach;
        acc.3 += item.saved;
    }

    let mut format_battle: Vec<FormatStats> = formats
        .into_iter()
        .map(|(format, (posts, engagement, reach, saved))| {
            let avg_engagement = engagement as f64 / posts as f64;
            FormatStats {
                format: format.as_str().to_string(),
                posts,
                avg_engagement: round2(avg_engagement),
                avg_reach: round2(reach as f64 / posts as f64),
                avg_saved: round2(saved as f64 / posts as f64),
                engagement_rate: if followers > 0 {
                    round2(avg_engagement / followers as f64 * 100.0)
                } else {
                    0.0
                },
            }
        })
        .collect();
    sort_desc_f64(&mut format_battle, |f| f.avg_engagement);
    let winning_format = format_battle.first().map(|f| f.format.clone());

    // (b) caption-length buckets
    let mut buckets = [(0i64, 0i64); 4];
    for item in media {
        let len = item.caption.chars().count();
        let idx = CAPTION_BUCKETS
            .iter()
            .position(|(_, lo, hi)| len >= *lo && len <= *hi)
            .unwrap_or(3);
        buckets[idx].0 += 1;
        buckets[idx].1 += item.engagement;
    }
    let caption_lengths: Vec<CaptionLengthBucket> = CAPTION_BUCKETS
        .iter()
        .enumerate()
        .map(|(i, (label, _, _))| CaptionLengthBucket {
            label: (*label).to_string(),
            posts: buckets[i].0,
            avg_engagement: if buckets[i].0 > 0 {
                round2(buckets[i].1 as f64 / buckets[i].0 as f64)
            } else {
                0.0
            },
        })
        .collect();
    let optimal_caption_length = caption_lengths
        .iter()
        .filter(|b| b.posts > 0)
        .max_by(|a, b| {
            a.avg_engagement
                .partial_cmp(&b.avg_engagement)
                .unwrap_or(Ordering::Equal)
        })
        .map(|b| b.label.clone());

    // (c) viral coefficient
    let avg_viral_coefficient = if media.is_empty() {
        0.0
    } else {
        media
            .iter()
            .map(|m| {
                if m.reach > 0 {
                    m.saved as f64 / m.reach as f64
                } else {
                    0.0
                }
            })
            .sum::<f64>()
            / media.len() as f64
    };

    // (d) save-to-like ratio
    let high_value_posts: Vec<String> = media
        .iter()
        .filter(|m| {
            let ratio = if m.like_count > 0 {
                m.saved as f64 / m.like_count as f64
            } else {
                0.0
            };
            ratio > 0.05
        })
        .map(|m| m.id.clone())
        .collect();

    // (e) engagement velocity among posts no older than a day
    let fast_starters: Vec<String> = media
        .iter()
        .filter(|m| {
            let age_hours = (now - m.timestamp).num_seconds() as f64 / 3600.0;
            if age_hours > 24.0 {
                return false;
            }
            let velocity = m.engagement as f64 / age_hours.max(1.0);
            velocity > 10.0
        })
        .map(|m| m.id.clone())
        .collect();

    // (f) composite quality score
    let mut scored_posts: Vec<ScoredPost> = media
        .iter()
        .map(|m| {
            let (score, factors) = composite_score(m, followers);
            ScoredPost {
                id: m.id.clone(),
                score: round2(score),
                factors,
            }
        })
        .collect();
    sort_desc_f64(&mut scored_posts, |p| p.score);

    let mut score_distribution = ScoreDistribution::default();
    for post in &scored_posts {
        if post.score >= 80.0 {
            score_distribution.excellent += 1;
        } else if post.score >= 50.0 {
            score_distribution.good += 1;
        } else if post.score >= 20.0 {
            score_distribution.average += 1;
        } else {
            score_distribution.poor += 1;
        }
    }

    ContentIntelligence {
        format_battle,
        winning_format,
        caption_lengths,
        optimal_caption_length,
        avg_viral_coefficient,
        high_value_posts,
        fast_starters,
        scored_posts,
        score_distribution,
        last_updated: now,
    }
}

fn reels_split(items: &[&MediaItem]) -> ReelsSplit {
    let posts = items.len() as i64;
    if posts == 0 {
        return ReelsSplit::default();
    }

    let total_engagement: i64 = items.iter().map(|m| m.engagement).sum();
    let denom = posts as f64;

    ReelsSplit {
        posts,
        total_engagement,
        avg_engagement: round2(total_engagement as f64 / denom),
        avg_likes: round2(items.iter().map(|m| m.like_count).sum::<i64>() as f64 / denom),
        avg_comments: round2(items.iter().map(|m| m.comments_count).sum::<i64>() as f64 / denom),
        avg_impressions: round2(items.iter().map(|m| m.impressions).sum::<i64>() as f64 / denom),
        avg_reach: round2(items.iter().map(|m| m.reach).sum::<i64>() as f64 / denom),
    }
}

fn compute_reels(media: &[MediaItem], now: DateTime<Utc>) -> ReelsAnalytics {
    let reel_items: Vec<&MediaItem> =
        media.iter().filter(|m| m.media_type.is_video_format()).collect();
    let other_items: Vec<&MediaItem> = media
        .iter()
        .filter(|m| !m.media_type.is_video_format())
        .collect();

    let reels = reels_split(&reel_items);
    let other = reels_split(&other_items);

    let reel_multiplier = if other.avg_engagement > 0.0 {
        round2(reels.avg_engagement / other.avg_engagement)
    } else {
        0.0
    };

    ReelsAnalytics {
        reels,
        other,
        reel_multiplier,
        last_updated: now,
    }
}

fn top_ids_by(media: &[MediaItem], key: impl Fn(&MediaItem) -> i64) -> Vec<String> {
    let mut sorted: Vec<&MediaItem> = media.iter().collect();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted
        .into_iter()
        .take(TOP_LIST_SIZE)
        .map(|m| m.id.clone())
        .collect()
}

fn compute_posts(media: &[MediaItem], now: DateTime<Utc>) -> PostsAnalytics {
    let total_posts = media.len() as i64;
    let total_engagement: i64 = media.iter().map(|m| m.engagement).sum();

    PostsAnalytics {
        total_posts,
        total_engagement,
        avg_engagement: if total_posts > 0 {
            round2(total_engagement as f64 / total_posts as f64)
        } else {
            0.0
        },
        total_likes: media.iter().map(|m| m.like_count).sum(),
        total_comments: media.iter().map(|m| m.comments_count).sum(),
        total_reach: media.iter().map(|m| m.reach).sum(),
        top_by_engagement: top_ids_by(media, |m| m.engagement),
        top_by_likes: top_ids_by(media, |m| m.like_count),
        top_by_comments: top_ids_by(media, |m| m.comments_count),
        top_by_reach: top_ids_by(media, |m| m.reach),
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("test timestamp")
            .with_timezone(&Utc)
    }

    fn item(
        id: &str,
        media_type: MediaType,
        timestamp: DateTime<Utc>,
        likes: i64,
        comments: i64,
        reach: i64,
        saved: i64,
    ) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            caption: String::new(),
            media_type,
            media_url: None,
            thumbnail_url: None,
            permalink: None,
            timestamp,
            like_count: likes,
            comments_count: comments,
            impressions: reach,
            reach,
            saved,
            engagement: likes + comments,
        }
    }

    fn profile(followers: i64) -> Profile {
        Profile {
            remote_user_id: "178414".to_string(),
            username: "demo".to_string(),
            name: None,
            profile_picture_url: None,
            followers_count: followers,
            follows_count: 100,
            media_count: 42,
            biography: None,
            website: None,
        }
    }

    #[test]
    fn test_engagement_rate_is_deterministic() {
        let now = ts("2024-06-01T12:00:00+00:00");
        let posted = ts("2024-05-20T12:00:00+00:00");
        let media: Vec<MediaItem> = (0..10)
            .map(|i| item(&format!("p{i}"), MediaType::Image, posted, 40, 10, 500, 5))
            .collect();

        let first = compute_overview(&profile(10_000), &media, Demographics::default(), now);
        let second = compute_overview(&profile(10_000), &media, Demographics::default(), now);

        // 10 posts at engagement 50 with 10k followers: 50/10000*100 = 0.50%
        assert_eq!(first.engagement_rate, 0.50);
        assert_eq!(second.engagement_rate, first.engagement_rate);
        assert_eq!(first.avg_likes, 40.0);
        assert_eq!(first.avg_comments, 10.0);
        assert_eq!(first.total_reach, 5000);
    }

    #[test]
    fn test_engagement_rate_zero_followers() {
        let now = ts("2024-06-01T12:00:00+00:00");
        let media = vec![item(
            "p1",
            MediaType::Image,
            ts("2024-05-20T12:00:00+00:00"),
            40,
            10,
            500,
            5,
        )];

        let view = compute_overview(&profile(0), &media, Demographics::default(), now);
        assert_eq!(view.engagement_rate, 0.0);
    }

    #[test]
    fn test_overview_tolerates_empty_demographics() {
        let now = ts("2024-06-01T12:00:00+00:00");
        let media = vec![item(
            "p1",
            MediaType::Image,
            ts("2024-05-20T12:00:00+00:00"),
            40,
            10,
            500,
            5,
        )];

        let view = compute_overview(&profile(2_000), &media, Demographics::default(), now);
        assert!(view.demographics.is_empty());
        assert_eq!(view.followers_count, 2_000);
        assert_eq!(view.recent_posts.len(), 1);
    }

    #[test]
    fn test_overview_keeps_ten_most_recent_in_source_order() {
        let now = ts("2024-06-01T12:00:00+00:00");
        let media: Vec<MediaItem> = (0..15)
            .map(|i| {
                item(
                    &format!("p{i}"),
                    MediaType::Image,
                    ts("2024-05-20T12:00:00+00:00") - Duration::days(i),
                    10,
                    0,
                    100,
                    0,
                )
            })
            .collect();

        let view = compute_overview(&profile(1_000), &media, Demographics::default(), now);
        assert_eq!(view.recent_posts.len(), 10);
        assert_eq!(view.recent_posts[0].id, "p0");
        assert_eq!(view.recent_posts[9].id, "p9");
    }

    #[test]
    fn test_growth_week_over_week() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let media = vec![
            // this week: 300 engagement
            item("a", MediaType::Image, now - Duration::days(2), 200, 100, 0, 0),
            // previous week: 200 engagement
            item("b", MediaType::Image, now - Duration::days(9), 150, 50, 0, 0),
            // older than both windows
            item("c", MediaType::Image, now - Duration::days(20), 999, 1, 0, 0),
        ];

        let view = compute_growth(&media, "month", now);
        assert_eq!(view.this_week_engagement, 300);
        assert_eq!(view.last_week_engagement, 200);
        assert_eq!(view.engagement_change_pct, 50.0);
        assert_eq!(view.daily_activity.len(), 3);
    }

    #[test]
    fn test_growth_change_zero_when_last_week_empty() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let media = vec![item(
            "a",
            MediaType::Image,
            now - Duration::days(2),
            200,
            100,
            0,
            0,
        )];

        let view = compute_growth(&media, "week", now);
        assert_eq!(view.last_week_engagement, 0);
        assert_eq!(view.engagement_change_pct, 0.0);
    }

    #[test]
    fn test_growth_buckets_by_utc_date() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let media = vec![
            item("a", MediaType::Image, ts("2024-06-10T01:00:00+00:00"), 10, 0, 0, 0),
            item("b", MediaType::Image, ts("2024-06-10T23:00:00+00:00"), 20, 0, 0, 0),
            item("c", MediaType::Image, ts("2024-06-11T00:30:00+00:00"), 5, 0, 0, 0),
        ];

        let view = compute_growth(&media, "month", now);
        assert_eq!(view.daily_activity.len(), 2);
        assert_eq!(view.daily_activity[0].posts, 2);
        assert_eq!(view.daily_activity[0].engagement, 30);
        assert_eq!(view.daily_activity[1].posts, 1);
    }

    #[test]
    fn test_best_times_ranking() {
        let now = ts("2024-06-15T00:00:00+00:00");
        // 2024-06-09 was a Sunday
        let media = vec![
            item("a", MediaType::Image, ts("2024-06-09T09:00:00+00:00"), 100, 0, 0, 0),
            item("b", MediaType::Image, ts("2024-06-09T09:30:00+00:00"), 200, 0, 0, 0),
            item("c", MediaType::Image, ts("2024-06-10T18:00:00+00:00"), 30, 0, 0, 0),
        ];

        let view = compute_best_times(&media, now);

        assert_eq!(view.daily.len(), 7);
        assert_eq!(view.daily[0].day, "Sunday");
        assert_eq!(view.daily[0].posts, 2);
        assert_eq!(view.daily[0].avg_engagement, 150.0);
        assert_eq!(view.daily[1].day, "Monday");

        assert_eq!(view.best_hours[0].hour, 9);
        assert_eq!(view.best_hours[0].avg_engagement, 150.0);
        assert_eq!(view.best_days[0].day, "Sunday");
        assert_eq!(view.best_days.len(), 2);
    }

    #[test]
    fn test_hashtags_case_folding() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let mut a = item("a", MediaType::Image, now - Duration::days(1), 10, 0, 100, 0);
        a.caption = "Great #SALE today".to_string();
        let mut b = item("b", MediaType::Image, now - Duration::days(2), 30, 0, 300, 0);
        b.caption = "another #sale".to_string();

        let view = compute_hashtags(&[a, b], now);
        assert_eq!(view.top_by_usage.len(), 1);
        let tag = &view.top_by_usage[0];
        assert_eq!(tag.tag, "#sale");
        assert_eq!(tag.usage_count, 2);
        assert_eq!(tag.total_engagement, 40);
        assert_eq!(tag.avg_engagement, 20.0);
    }

    #[test]
    fn test_hashtags_reach_expanders() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let mut a = item("a", MediaType::Image, now - Duration::days(1), 10, 0, 900, 0);
        a.caption = "#boost".to_string();
        let mut b = item("b", MediaType::Image, now - Duration::days(2), 10, 0, 100, 0);
        b.caption = "#niche".to_string();

        let view = compute_hashtags(&[a, b], now);
        // overall avg reach 500; #boost avg 900 -> multiplier 1.8
        assert_eq!(view.reach_expanders.len(), 1);
        assert_eq!(view.reach_expanders[0].tag, "#boost");
        assert_eq!(view.reach_expanders[0].reach_multiplier, 1.8);
    }

    #[test]
    fn test_extract_hashtags_dedupes_within_caption() {
        let tags = extract_hashtags("#go #GO #Go and #other");
        assert_eq!(tags, vec!["#go".to_string(), "#other".to_string()]);
    }

    #[test]
    fn test_format_battle_ranking() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let posted = now - Duration::days(3);
        let media = vec![
            item("i1", MediaType::Image, posted, 10, 0, 0, 0),
            item("i2", MediaType::Image, posted, 20, 0, 0, 0),
            item("i3", MediaType::Image, posted, 30, 0, 0, 0),
            item("r1", MediaType::Reel, posted, 100, 0, 0, 0),
            item("r2", MediaType::Reel, posted, 200, 0, 0, 0),
        ];

        let view = compute_content_intelligence(&media, 10_000, now);
        assert_eq!(view.winning_format.as_deref(), Some("REEL"));
        assert_eq!(view.format_battle[0].format, "REEL");
        assert_eq!(view.format_battle[0].avg_engagement, 150.0);
        assert_eq!(view.format_battle[1].format, "IMAGE");
        assert_eq!(view.format_battle[1].avg_engagement, 20.0);
    }

    #[test]
    fn test_caption_length_buckets() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let posted = now - Duration::days(3);
        let mut short = item("s", MediaType::Image, posted, 10, 0, 0, 0);
        short.caption = "brief".to_string();
        let mut long = item("l", MediaType::Image, posted, 90, 0, 0, 0);
        long.caption = "x".repeat(200);

        let view = compute_content_intelligence(&[short, long], 1_000, now);
        assert_eq!(view.caption_lengths.len(), 4);
        assert_eq!(view.caption_lengths[0].posts, 1);
        assert_eq!(view.caption_lengths[2].posts, 1);
        assert_eq!(view.optimal_caption_length.as_deref(), Some("151-300"));
    }

    #[test]
    fn test_viral_coefficient_zero_reach() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let media = vec![item(
            "a",
            MediaType::Image,
            now - Duration::days(1),
            10,
            0,
            0,
            50,
        )];

        let view = compute_content_intelligence(&media, 1_000, now);
        assert_eq!(view.avg_viral_coefficient, 0.0);
    }

    #[test]
    fn test_save_to_like_high_value_flag() {
        let now = ts("2024-06-15T00:00:00+00:00");
        let posted = now - Duration::days(2);
        let media = vec![
            // ratio 0.1 > 0.05
            item("hv", MediaType::Image, posted, 100, 0, 1_000, 10),
            // zero likes: ratio is exactly 0, never flagged
            item("zl", MediaType::Image, posted, 0, 0, 1_000, 50),
            // ratio 0.01
            item("lo", MediaType::Image, posted, 1_000, 0, 1_000, 10),
        ];

        let view = compute_content_intelligence(&media, 10_000, now);
        assert_eq!(view.high_value_posts, vec!["hv".to_string()]);
    }

    #[test]
    fn test_fast_starters_window_and_threshold() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let media = vec![
            // 12h old, engagement 240 -> velocity 20/h
            item("fast", MediaType::Reel, now - Duration::hours(12), 240, 0, 0, 0),
            // 12h old, engagement 60 -> velocity 5/h
            item("slow", MediaType::Reel, now - Duration::hours(12), 60, 0, 0, 0),
            // 48h old: outside the window regardless of velocity
            item("old", MediaType::Reel, now - Duration::hours(48), 5_000, 0, 0, 0),
        ];

        let view = compute_content_intelligence(&media, 10_000, now);
        assert_eq!(view.fast_starters, vec!["fast".to_string()]);
    }

    #[test]
    fn test_composite_score_weights() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let posted = now - Duration::days(3);
        // followers 1000, engagement 100, reach 500, saved 10, comments 20
        let post = item("p", MediaType::Image, posted, 80, 20, 500, 10);

        let (score, factors) = composite_score(&post, 1_000);
        // 0.25*100 + 0.25*50 + 0.20*100 + 0.15*20 + 0.15*400 = 120.5
        assert_eq!(round2(score), 120.5);
        // comments (60.0) and saved (20.0) are the largest qualifying
        // contributions after engagement (25.0): ranked by weighted value
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0], "sparks conversation");
        assert_eq!(factors[1], "strong engagement for the audience size");
    }

    #[test]
    fn test_composite_score_zero_followers_is_guarded() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let post = item("p", MediaType::Image, now - Duration::days(3), 80, 0, 0, 0);

        let (score, _) = composite_score(&post, 0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_distribution_buckets() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let posted = now - Duration::days(3);
        let media = vec![
            // 0.15 * 400 comments-factor alone = 60 -> good
            item("good", MediaType::Image, posted, 0, 20, 0, 0),
            // everything zero -> poor
            item("poor", MediaType::Image, posted, 0, 0, 0, 0),
        ];

        let view = compute_content_intelligence(&media, 0, now);
        assert_eq!(view.score_distribution.good, 1);
        assert_eq!(view.score_distribution.poor, 1);
        assert_eq!(view.score_distribution.excellent, 0);
        assert_eq!(view.scored_posts[0].id, "good");
    }

    #[test]
    fn test_reels_multiplier() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let posted = now - Duration::days(3);
        let media = vec![
            item("r1", MediaType::Reel, posted, 300, 0, 0, 0),
            item("v1", MediaType::Video, posted, 100, 0, 0, 0),
            item("i1", MediaType::Image, posted, 50, 0, 0, 0),
            item("i2", MediaType::Image, posted, 50, 0, 0, 0),
        ];

        let view = compute_reels(&media, now);
        assert_eq!(view.reels.posts, 2);
        assert_eq!(view.reels.avg_engagement, 200.0);
        assert_eq!(view.other.avg_engagement, 50.0);
        assert_eq!(view.reel_multiplier, 4.0);
    }

    #[test]
    fn test_reels_multiplier_zero_when_no_non_reel_posts() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let media = vec![item(
            "r1",
            MediaType::Reel,
            now - Duration::days(3),
            300,
            0,
            0,
            0,
        )];

        let view = compute_reels(&media, now);
        assert_eq!(view.other.posts, 0);
        assert_eq!(view.reel_multiplier, 0.0);
    }

    #[test]
    fn test_posts_top_lists() {
        let now = ts("2024-06-15T12:00:00+00:00");
        let posted = now - Duration::days(3);
        let media = vec![
            item("a", MediaType::Image, posted, 10, 90, 500, 0),
            item("b", MediaType::Image, posted, 80, 5, 100, 0),
            item("c", MediaType::Image, posted, 50, 50, 900, 0),
        ];

        let view = compute_posts(&media, now);
        assert_eq!(view.total_posts, 3);
        assert_eq!(view.top_by_engagement[0], "a");
        assert_eq!(view.top_by_likes[0], "b");
        assert_eq!(view.top_by_comments[0], "a");
        assert_eq!(view.top_by_reach[0], "c");
        assert_eq!(view.avg_engagement, round2(285.0 / 3.0));
    }

    #[test]
    fn test_unified_overview_aggregation() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single().expect("now");
        let parts = vec![
            AccountOverview {
                account_id: 1,
                username: "a".to_string(),
                followers_count: 1_000,
                media_count: 10,
                engagement_rate: 2.0,
            },
            AccountOverview {
                account_id: 3,
                username: "c".to_string(),
                followers_count: 3_000,
                media_count: 30,
                engagement_rate: 4.0,
            },
        ];

        let view = build_unified(parts, now);
        assert_eq!(view.accounts_included, 2);
        assert_eq!(view.total_followers, 4_000);
        assert_eq!(view.total_posts, 40);
        assert_eq!(view.avg_engagement_rate, 3.0);
    }

    #[tokio::test]
    async fn test_view_method_before_init_is_rejected() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("uninit.db");
        let database = Arc::new(
            DatabaseService::new(db_path.to_str().expect("utf-8 path")).expect("database"),
        );
        let cache = Arc::new(MetricCache::new(AppConfig::default()));

        let service = AnalyticsService::new(
            AppConfig::default(),
            reqwest::Client::new(),
            cache,
            database,
            1,
            1,
        );

        let err = service.get_overview().await.expect_err("must fail");
        assert!(matches!(err, ApiError::NotInitialized(_)));
    }

    #[test]
    fn test_unified_overview_empty() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single().expect("now");
        let view = build_unified(Vec::new(), now);
        assert_eq!(view.accounts_included, 0);
        assert_eq!(view.avg_engagement_rate, 0.0);
    }
}
