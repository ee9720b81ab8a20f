use crate::error::ApiError;
use crate::models::{DemographicSlice, Demographics, MediaItem, MediaType, Profile};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

/// Page size cap enforced by the remote media listing.
const MEDIA_PAGE_MAX: usize = 25;

const PROFILE_FIELDS: &str = "id,username,name,profile_picture_url,followers_count,follows_count,media_count,biography,website";

const MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp,like_count,comments_count";

const MEDIA_INSIGHT_METRICS: &str = "impressions,reach,saved";

/// Thin wrapper around the remote Graph-style API for one connected
/// account. No caching, no KPI logic, no retries: a failed call fails
/// immediately and is reported to the caller.
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    remote_user_id: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        remote_user_id: String,
        access_token: String,
    ) -> Self {
        Self {
            client,
            base_url,
            remote_user_id,
            access_token,
        }
    }

    /// GET a JSON document, mapping non-2xx responses to `Upstream` with
    /// the remote's structured `error.message` when one is present.
    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            response
                .json::<Value>()
                .await
                .map_err(|e| ApiError::ParseError(format!("Failed to parse upstream response: {e}")))
        } else {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("Upstream error: {status}"));
            Err(ApiError::Upstream(message))
        }
    }

    pub async fn get_profile(&self) -> Result<Profile, ApiError> {
        let url = format!(
            "{}/{}?fields={PROFILE_FIELDS}&access_token={}",
            self.base_url, self.remote_user_id, self.access_token
        );
        let json = self.get_json(&url).await?;

        Ok(Profile {
            remote_user_id: json["id"]
                .as_str()
                .unwrap_or(&self.remote_user_id)
                .to_string(),
            username: json["username"].as_str().unwrap_or_default().to_string(),
            name: json["name"].as_str().map(str::to_string),
            profile_picture_url: json["profile_picture_url"].as_str().map(str::to_string),
            followers_count: json["followers_count"].as_i64().unwrap_or(0),
            follows_count: json["follows_count"].as_i64().unwrap_or(0),
            media_count: json["media_count"].as_i64().unwrap_or(0),
            biography: json["biography"].as_str().map(str::to_string),
            website: json["website"].as_str().map(str::to_string),
        })
    }

    /// Fetch one page of media, flattening each item's insights
    /// sub-resource into numeric fields. Returns the items plus the opaque
    /// cursor for the next page, absent when the listing is exhausted.
    pub async fn get_media_page(
        &self,
        limit: usize,
        after: Option<&str>,
    ) -> Result<(Vec<MediaItem>, Option<String>), ApiError> {
        let limit = limit.min(MEDIA_PAGE_MAX);
        let mut url = format!(
            "{}/{}/media?fields={MEDIA_FIELDS}&limit={limit}&access_token={}",
            self.base_url, self.remote_user_id, self.access_token
        );
        if let Some(cursor) = after {
            url.push_str(&format!("&after={cursor}"));
        }

        let json = self.get_json(&url).await?;

        let mut items = Vec::new();
        if let Some(data) = json["data"].as_array() {
            for raw in data {
                let insights = match raw["id"].as_str() {
                    Some(media_id) => self.fetch_insights(media_id).await,
                    None => HashMap::new(),
                };
                match parse_media_item(raw, &insights) {
                    Ok(item) => items.push(item),
                    Err(e) => warn!("Skipping media item with unusable payload: {e:?}"),
                }
            }
        }

        // The remote includes a cursor on every page; only a `next` link
        // signals that another page actually exists.
        let cursor = if json["paging"]["next"].is_string() {
            json["paging"]["cursors"]["after"]
                .as_str()
                .map(str::to_string)
        } else {
            None
        };

        Ok((items, cursor))
    }

    /// Accumulate media sequentially until `count` items are collected or
    /// the cursor is exhausted, whichever comes first. Page fetches cannot
    /// be parallelized: each cursor comes from the previous response.
    pub async fn get_all_media_with_insights(
        &self,
        count: usize,
    ) -> Result<Vec<MediaItem>, ApiError> {
        let mut items: Vec<MediaItem> = Vec::new();
        let mut cursor: Option<String> = None;

        while items.len() < count {
            let remaining = count - items.len();
            let (page, next) = self.get_media_page(remaining, cursor.as_deref()).await?;
            let page_len = page.len();
            items.extend(page);

            match next {
                Some(c) if page_len > 0 => cursor = Some(c),
                _ => break,
            }
        }

        items.truncate(count);
        debug!(
            "Collected {} media items for account {}",
            items.len(),
            self.remote_user_id
        );
        Ok(items)
    }

    /// Per-item insight metrics as a name -> value map. Unavailable
    /// insights (common for non-eligible media types) yield an empty map
    /// rather than an error.
    async fn fetch_insights(&self, media_id: &str) -> HashMap<String, i64> {
        let url = format!(
            "{}/{media_id}/insights?metric={MEDIA_INSIGHT_METRICS}&access_token={}",
            self.base_url, self.access_token
        );

        match self.get_json(&url).await {
            Ok(json) => flatten_insights(&json),
            Err(e) => {
                debug!("Insights unavailable for media {media_id}: {e:?}");
                HashMap::new()
            }
        }
    }

    /// Best-effort fetch of the four follower breakdowns. Each breakdown is
    /// attempted independently; a sub-failure leaves that list empty and
    /// never fails the overall call.
    pub async fn get_follower_demographics(&self) -> Demographics {
        Demographics {
            city: self.fetch_breakdown("audience_city").await,
            country: self.fetch_breakdown("audience_country").await,
            age_gender: self.fetch_breakdown("audience_gender_age").await,
            online_hours: self.fetch_breakdown("online_followers").await,
        }
    }

    async fn fetch_breakdown(&self, metric: &str) -> Vec<DemographicSlice> {
        let url = format!(
            "{}/{}/insights?metric={metric}&period=lifetime&access_token={}",
            self.base_url, self.remote_user_id, self.access_token
        );

        match self.get_json(&url).await {
            Ok(json) => {
                let mut slices = Vec::new();
                if let Some(obj) = json["data"][0]["values"][0]["value"].as_object() {
                    for (dimension, value) in obj {
                        if let Some(v) = value.as_i64() {
                            slices.push(DemographicSlice {
                                dimension: dimension.clone(),
                                value: v,
                            });
                        }
                    }
                }
                slices.sort_by(|a, b| b.value.cmp(&a.value));
                slices
            }
            Err(e) => {
                warn!("Demographic breakdown {metric} unavailable: {e:?}");
                Vec::new()
            }
        }
    }
}

/// Flatten the insights response (`data: [{name, values: [{value}]}]`) into
/// a name -> value map.
fn flatten_insights(json: &Value) -> HashMap<String, i64> {
    let mut map = HashMap::new();
    if let Some(data) = json["data"].as_array() {
        for metric in data {
            if let (Some(name), Some(value)) = (
                metric["name"].as_str(),
                metric["values"][0]["value"].as_i64(),
            ) {
                map.insert(name.to_string(), value);
            }
        }
    }
    map
}

/// Build a `MediaItem` from one raw listing entry plus its flattened
/// insights. Metrics the remote omitted are reported as 0; a missing id or
/// timestamp makes the item unusable.
fn parse_media_item(
    raw: &Value,
    insights: &HashMap<String, i64>,
) -> Result<MediaItem, ApiError> {
    let id = raw["id"]
        .as_str()
        .ok_or_else(|| ApiError::ParseError("media item missing id".to_string()))?
        .to_string();

    let timestamp_raw = raw["timestamp"]
        .as_str()
        .ok_or_else(|| ApiError::ParseError(format!("media item {id} missing timestamp")))?;
    let timestamp = parse_timestamp(timestamp_raw)?;

    let media_type = match raw["media_type"].as_str() {
        Some("VIDEO") => MediaType::Video,
        Some("CAROUSEL_ALBUM") => MediaType::CarouselAlbum,
        Some("REEL") | Some("REELS") => MediaType::Reel,
        _ => MediaType::Image,
    };

    let like_count = raw["like_count"].as_i64().unwrap_or(0);
    let comments_count = raw["comments_count"].as_i64().unwrap_or(0);

    // The documented insight set does not list `engagement`, but the source
    // honors it when present; likes + comments otherwise.
    let engagement = insights
        .get("engagement")
        .copied()
        .unwrap_or(like_count + comments_count);

    Ok(MediaItem {
        id,
        caption: raw["caption"].as_str().unwrap_or_default().to_string(),
        media_type,
        media_url: raw["media_url"].as_str().map(str::to_string),
        thumbnail_url: raw["thumbnail_url"].as_str().map(str::to_string),
        permalink: raw["permalink"].as_str().map(str::to_string),
        timestamp,
        like_count,
        comments_count,
        impressions: insights.get("impressions").copied().unwrap_or(0),
        reach: insights.get("reach").copied().unwrap_or(0),
        saved: insights.get("saved").copied().unwrap_or(0),
        engagement,
    })
}

/// The remote reports ISO-8601 with either `+00:00` or `+0000` offsets.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::ParseError(format!("Unparseable media timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T10:30:00+00:00").is_ok());
        assert!(parse_timestamp("2024-05-01T10:30:00+0000").is_ok());
        assert!(parse_timestamp("not a date").is_err());

        let parsed = parse_timestamp("2024-05-01T10:30:00+0200").expect("offset timestamp");
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T08:30:00+00:00");
    }

    #[test]
    fn test_flatten_insights() {
        let json = json!({
            "data": [
                {"name": "impressions", "values": [{"value": 1200}]},
                {"name": "reach", "values": [{"value": 800}]},
                {"name": "saved", "values": [{"value": 35}]}
            ]
        });

        let map = flatten_insights(&json);
        assert_eq!(map.get("impressions"), Some(&1200));
        assert_eq!(map.get("reach"), Some(&800));
        assert_eq!(map.get("saved"), Some(&35));
        assert_eq!(map.get("engagement"), None);
    }

    #[test]
    fn test_parse_media_item_defaults_missing_metrics_to_zero() {
        let raw = json!({
            "id": "123",
            "caption": "hello",
            "media_type": "IMAGE",
            "timestamp": "2024-05-01T10:30:00+0000",
            "like_count": 10,
            "comments_count": 3
        });

        let item = parse_media_item(&raw, &HashMap::new()).expect("item");
        assert_eq!(item.impressions, 0);
        assert_eq!(item.reach, 0);
        assert_eq!(item.saved, 0);
        assert_eq!(item.engagement, 13);
    }

    #[test]
    fn test_parse_media_item_engagement_insight_wins() {
        let raw = json!({
            "id": "123",
            "media_type": "REEL",
            "timestamp": "2024-05-01T10:30:00+0000",
            "like_count": 10,
            "comments_count": 3
        });

        let mut insights = HashMap::new();
        insights.insert("engagement".to_string(), 99);

        let item = parse_media_item(&raw, &insights).expect("item");
        assert_eq!(item.engagement, 99);
        assert_eq!(item.media_type, MediaType::Reel);
    }

    #[test]
    fn test_parse_media_item_requires_id_and_timestamp() {
        let missing_id = json!({
            "media_type": "IMAGE",
            "timestamp": "2024-05-01T10:30:00+0000"
        });
        assert!(parse_media_item(&missing_id, &HashMap::new()).is_err());

        let missing_timestamp = json!({
            "id": "123",
            "media_type": "IMAGE"
        });
        assert!(parse_media_item(&missing_timestamp, &HashMap::new()).is_err());
    }
}
