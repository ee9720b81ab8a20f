use crate::error::ApiError;
use crate::models::{Account, AuthenticatedUser, ConnectAccountRequest, NewAccount};
use crate::state::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};

#[post("/api/v1/accounts", data = "<request>")]
pub async fn connect_account(
    request: Json<ConnectAccountRequest>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<Account>, ApiError> {
    let request = request.into_inner();

    if request.access_token.is_empty() {
        return Err(ApiError::BadRequest("Access token is required".to_string()));
    }

    let account = state
        .database
        .create_account(NewAccount::new(
            user.user_id,
            request.remote_user_id,
            request.username,
            request.access_token,
            request.token_expires_at,
        ))
        .map_err(|e| ApiError::DatabaseError(format!("Failed to connect account: {e}")))?;

    info!(
        "User {} connected account {} ({})",
        user.username, account.id, account.username
    );
    Ok(Json(account))
}

#[get("/api/v1/accounts")]
pub async fn list_accounts(
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = state
        .database
        .get_accounts_for_user(user.user_id)
        .map_err(|e| ApiError::DatabaseError(format!("Failed to list accounts: {e}")))?;

    Ok(Json(accounts))
}

#[delete("/api/v1/accounts/<account_id>")]
pub async fn disconnect_account(
    account_id: i32,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = state
        .database
        .get_account(account_id)
        .map_err(|e| ApiError::DatabaseError(format!("Failed to load account: {e}")))?
        .ok_or_else(|| ApiError::NotFound(format!("Account {account_id} not found")))?;

    if account.user_id != user.user_id {
        return Err(ApiError::Forbidden(
            "Account does not belong to this user".to_string(),
        ));
    }

    state
        .database
        .deactivate_account(account_id)
        .map_err(|e| ApiError::DatabaseError(format!("Failed to disconnect account: {e}")))?;

    // Cached views for a disconnected account are dead weight; drop them.
    if let Err(e) = state.database.delete_metric_cache_for_account(account_id) {
        log::warn!("Failed to drop cached views for account {account_id}: {e}");
    }

    info!("User {} disconnected account {account_id}", user.username);
    Ok(Json(serde_json::json!({
        "message": "Account disconnected"
    })))
}
