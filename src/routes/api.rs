use crate::error::ApiError;
use crate::models::{
    AuthenticatedUser, BearerToken, CacheStatsResponse, LoginRequest, LoginResponse,
    LogoutResponse, RegisterRequest, RegisterResponse,
};
use crate::services::AuthService;
use crate::state::AppState;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use serde_json;

// Health check endpoint
#[get("/api/v1/health")]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

// Authentication endpoints
#[post("/api/v1/register", data = "<register_request>")]
pub async fn register(
    register_request: Json<RegisterRequest>,
    state: &State<AppState>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let register_data = register_request.into_inner();

    let user = AuthService::register_user(&state.database, register_data.clone())?;

    // Log the new user straight in
    let login_request = LoginRequest {
        name: register_data.name.clone(),
        password: register_data.password.clone(),
    };
    let (_user, token) = AuthService::authenticate_user(&state.database, login_request)?;

    Ok(Json(RegisterResponse {
        ok: true,
        id: user.id,
        token,
    }))
}

#[post("/api/v1/login", data = "<login_request>")]
pub async fn login(
    login_request: Json<LoginRequest>,
    state: &State<AppState>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (_user, token) =
        AuthService::authenticate_user(&state.database, login_request.into_inner())?;

    Ok(Json(LoginResponse { ok: true, token }))
}

#[post("/api/v1/logout")]
pub async fn logout(
    token: BearerToken,
    _user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<LogoutResponse>, ApiError> {
    AuthService::revoke_token(&state.database, &token.0)?;
    Ok(Json(LogoutResponse { ok: true }))
}

// Cache management endpoints
#[get("/api/v1/cache/stats")]
pub async fn get_cache_stats(
    _user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    Ok(Json(state.cache.stats(&state.database)))
}

#[delete("/api/v1/cache")]
pub async fn clear_cache(
    _user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.config.cache_enabled {
        return Err(ApiError::BadRequest("Cache is disabled".to_string()));
    }

    let removed = state
        .cache
        .clear(&state.database)
        .map_err(|e| ApiError::DatabaseError(format!("Failed to clear cache: {e}")))?;

    Ok(Json(serde_json::json!({
        "message": "Cache cleared successfully",
        "removed_entries": removed
    })))
}
