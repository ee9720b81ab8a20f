use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};

/// Media format as reported by the remote Graph API.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "VIDEO")]
    Video,
    #[serde(rename = "CAROUSEL_ALBUM")]
    CarouselAlbum,
    #[serde(rename = "REEL")]
    Reel,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::CarouselAlbum => "CAROUSEL_ALBUM",
            MediaType::Reel => "REEL",
        }
    }

    /// Reels analytics groups REEL and VIDEO together as short-form video.
    pub fn is_video_format(&self) -> bool {
        matches!(self, MediaType::Reel | MediaType::Video)
    }
}

/// One published post/reel with its per-item insights flattened into
/// numeric fields. Metrics the remote omits (common for non-eligible media
/// types) are reported as 0.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub caption: String,
    pub media_type: MediaType,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub permalink: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub like_count: i64,
    pub comments_count: i64,
    pub impressions: i64,
    pub reach: i64,
    pub saved: i64,
    /// likes + comments, unless the source reported an `engagement` insight.
    pub engagement: i64,
}

/// Profile snapshot for the connected account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Profile {
    pub remote_user_id: String,
    pub username: String,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub follows_count: i64,
    pub media_count: i64,
    pub biography: Option<String>,
    pub website: Option<String>,
}

/// One slice of a demographic breakdown, e.g. ("Berlin", 1204).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DemographicSlice {
    pub dimension: String,
    pub value: i64,
}

/// Best-effort follower demographics. Each breakdown is fetched
/// independently and left empty when the remote call fails.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Demographics {
    pub city: Vec<DemographicSlice>,
    pub country: Vec<DemographicSlice>,
    pub age_gender: Vec<DemographicSlice>,
    pub online_hours: Vec<DemographicSlice>,
}

impl Demographics {
    pub fn is_empty(&self) -> bool {
        self.city.is_empty()
            && self.country.is_empty()
            && self.age_gender.is_empty()
            && self.online_hours.is_empty()
    }
}
