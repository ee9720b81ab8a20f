use rocket::serde::{Deserialize, Serialize};
use rocket::{
    State,
    http::Status,
    request::{FromRequest, Outcome, Request},
};

// Authentication request/response models
#[derive(Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    pub ok: bool,
    pub id: i32,
    pub token: String,
}

#[derive(Serialize, Debug)]
pub struct LogoutResponse {
    pub ok: bool,
}

// Raw bearer token guard, used where the token itself is needed (logout)
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = crate::error::ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
        {
            Some(token) => Outcome::Success(BearerToken(token.to_string())),
            None => Outcome::Error((
                Status::Unauthorized,
                crate::error::ApiError::Unauthorized("Authorization header required".to_string()),
            )),
        }
    }
}

// Authentication guard for extracting user from Authorization header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub user_id: i32,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = crate::error::ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        use crate::services::AuthService;
        use crate::state::AppState;

        let state = request.guard::<&State<AppState>>().await.unwrap();

        let auth_header = request.headers().get_one("Authorization");

        if let Some(auth_value) = auth_header {
            if let Some(token) = auth_value.strip_prefix("Bearer ") {
                match AuthService::validate_token(&state.database, token) {
                    Ok(user) => Outcome::Success(AuthenticatedUser {
                        username: user.username,
                        user_id: user.id,
                    }),
                    Err(_) => Outcome::Error((
                        Status::Unauthorized,
                        crate::error::ApiError::Unauthorized("Invalid token".to_string()),
                    )),
                }
            } else {
                Outcome::Error((
                    Status::Unauthorized,
                    crate::error::ApiError::Unauthorized(
                        "Invalid authorization format".to_string(),
                    ),
                ))
            }
        } else {
            Outcome::Error((
                Status::Unauthorized,
                crate::error::ApiError::Unauthorized("Authorization header required".to_string()),
            ))
        }
    }
}
