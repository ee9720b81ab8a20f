use crate::error::ApiError;
use crate::models::{
    AuthenticatedUser, BestTimeToPost, ContentIntelligence, Growth, HashtagAnalysis, Overview,
    PostsAnalytics, ReelsAnalytics, UnifiedOverview,
};
use crate::services::analytics::unified_overview;
use crate::services::{AnalyticsService, ExportFormat, ExportService};
use crate::state::AppState;
use rocket::http::ContentType;
use rocket::serde::json::Json;
use rocket::{State, get};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds and initializes an analytics service for one of the caller's
/// accounts. Initialization resolves the stored credential; ownership and
/// token expiry are enforced there.
fn service_for(
    state: &AppState,
    user: &AuthenticatedUser,
    account_id: i32,
) -> Result<AnalyticsService, ApiError> {
    let mut service = AnalyticsService::new(
        state.config.clone(),
        state.client.clone(),
        Arc::clone(&state.cache),
        Arc::clone(&state.database),
        user.user_id,
        account_id,
    );
    service.init()?;
    Ok(service)
}

#[get("/api/v1/accounts/<account_id>/overview")]
pub async fn account_overview(
    account_id: i32,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<Overview>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_overview().await?))
}

#[get("/api/v1/accounts/<account_id>/growth?<period>")]
pub async fn account_growth(
    account_id: i32,
    period: Option<&str>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<Growth>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_growth(period.unwrap_or("month")).await?))
}

#[get("/api/v1/accounts/<account_id>/best-times")]
pub async fn account_best_times(
    account_id: i32,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<BestTimeToPost>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_best_times().await?))
}

#[get("/api/v1/accounts/<account_id>/hashtags")]
pub async fn account_hashtags(
    account_id: i32,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<HashtagAnalysis>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_hashtags().await?))
}

#[get("/api/v1/accounts/<account_id>/content-intelligence")]
pub async fn account_content_intelligence(
    account_id: i32,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<ContentIntelligence>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_content_intelligence().await?))
}

#[get("/api/v1/accounts/<account_id>/reels")]
pub async fn account_reels(
    account_id: i32,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<ReelsAnalytics>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_reels().await?))
}

#[get("/api/v1/accounts/<account_id>/posts?<limit>")]
pub async fn account_posts(
    account_id: i32,
    limit: Option<usize>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<PostsAnalytics>, ApiError> {
    let service = service_for(state, &user, account_id)?;
    Ok(Json(service.get_posts(limit).await?))
}

/// Cross-account overview: per-account fetches run concurrently, failed
/// accounts are excluded rather than failing the request.
#[get("/api/v1/overview")]
pub async fn user_overview(
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<UnifiedOverview>, ApiError> {
    let view = unified_overview(
        state.config.clone(),
        state.client.clone(),
        Arc::clone(&state.cache),
        Arc::clone(&state.database),
        user.user_id,
    )
    .await?;
    Ok(Json(view))
}

#[get("/api/v1/accounts/<account_id>/export?<format>&<views>")]
pub async fn export_views(
    account_id: i32,
    format: Option<&str>,
    views: Option<&str>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<(ContentType, String), ApiError> {
    let format = ExportFormat::parse(format.unwrap_or("json"))?;
    let service = service_for(state, &user, account_id)?;

    let mut computed: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    for name in views.unwrap_or("overview").split(',') {
        let name = name.trim();
        let value = match name {
            "overview" => to_value(&service.get_overview().await?)?,
            "growth" => to_value(&service.get_growth("month").await?)?,
            "best_times" => to_value(&service.get_best_times().await?)?,
            "hashtags" => to_value(&service.get_hashtags().await?)?,
            "content_intelligence" => to_value(&service.get_content_intelligence().await?)?,
            "reels" => to_value(&service.get_reels().await?)?,
            "posts" => to_value(&service.get_posts(None).await?)?,
            other => {
                return Err(ApiError::BadRequest(format!("Unknown view '{other}'")));
            }
        };
        computed.insert(name.to_string(), value);
    }

    let body = ExportService::build(&computed, format)?;
    let content_type = match format {
        ExportFormat::Json => ContentType::JSON,
        ExportFormat::Csv => ContentType::CSV,
    };
    Ok((content_type, body))
}

fn to_value<T: serde::Serialize>(view: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(view)
        .map_err(|e| ApiError::InternalServerError(format!("Failed to serialize view: {e}")))
}
