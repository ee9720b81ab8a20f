use crate::error::ApiError;
use crate::models::{LoginRequest, NewUser, NewUserToken, RegisterRequest, User, UserToken};
use crate::schema::{user_tokens, users};
use crate::services::DatabaseService;
use diesel::prelude::*;
use log::debug;

pub struct AuthService;

impl AuthService {
    pub fn register_user(db: &DatabaseService, request: RegisterRequest) -> Result<User, ApiError> {
        let mut conn = db.get_connection().map_err(|e| {
            ApiError::InternalServerError(format!("Database connection error: {e}"))
        })?;

        let taken: i64 = users::table
            .filter(
                users::username
                    .eq(&request.name)
                    .or(users::email.eq(&request.email)),
            )
            .count()
            .get_result(&mut conn)
            .map_err(|e| ApiError::InternalServerError(format!("Database query error: {e}")))?;

        if taken > 0 {
            return Err(ApiError::BadRequest(
                "Username or email already exists".to_string(),
            ));
        }

        let new_user = NewUser::new(request.name, request.email, request.password)
            .map_err(|e| ApiError::InternalServerError(format!("Password hashing error: {e}")))?;

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .get_result::<User>(&mut conn)
            .map_err(|e| ApiError::InternalServerError(format!("Failed to create user: {e}")))?;

        debug!("User registered successfully: {}", user.username);
        Ok(user)
    }

    pub fn authenticate_user(
        db: &DatabaseService,
        request: LoginRequest,
    ) -> Result<(User, String), ApiError> {
        let mut conn = db.get_connection().map_err(|e| {
            ApiError::InternalServerError(format!("Database connection error: {e}"))
        })?;

        let user = users::table
            .filter(users::username.eq(&request.name))
            .filter(users::is_active.eq(true))
            .first::<User>(&mut conn)
            .optional()
            .map_err(|e| ApiError::InternalServerError(format!("Database query error: {e}")))?
            .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

        let password_valid = user.verify_password(&request.password).map_err(|e| {
            ApiError::InternalServerError(format!("Password verification error: {e}"))
        })?;

        if !password_valid {
            return Err(ApiError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let new_token = NewUserToken::new_auth_token(user.id);
        let token_value = new_token.token.clone();

        diesel::insert_into(user_tokens::table)
            .values(&new_token)
            .execute(&mut conn)
            .map_err(|e| ApiError::InternalServerError(format!("Failed to create token: {e}")))?;

        debug!("User authenticated successfully: {}", user.username);
        Ok((user, token_value))
    }

    pub fn validate_token(db: &DatabaseService, token: &str) -> Result<User, ApiError> {
        let mut conn = db.get_connection().map_err(|e| {
            ApiError::InternalServerError(format!("Database connection error: {e}"))
        })?;

        let user_token = user_tokens::table
            .filter(user_tokens::token.eq(token))
            .filter(user_tokens::is_active.eq(true))
            .first::<UserToken>(&mut conn)
            .optional()
            .map_err(|e| ApiError::InternalServerError(format!("Database query error: {e}")))?
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        if let Some(expires_at) = user_token.expires_at {
            if chrono::Utc::now().naive_utc() > expires_at {
                return Err(ApiError::Unauthorized("Token expired".to_string()));
            }
        }

        users::table
            .filter(users::id.eq(user_token.user_id))
            .filter(users::is_active.eq(true))
            .first::<User>(&mut conn)
            .map_err(|e| ApiError::InternalServerError(format!("Failed to retrieve user: {e}")))
    }

    pub fn revoke_token(db: &DatabaseService, token: &str) -> Result<(), ApiError> {
        let mut conn = db.get_connection().map_err(|e| {
            ApiError::InternalServerError(format!("Database connection error: {e}"))
        })?;

        diesel::update(user_tokens::table.filter(user_tokens::token.eq(token)))
            .set(user_tokens::is_active.eq(false))
            .execute(&mut conn)
            .map_err(|e| ApiError::InternalServerError(format!("Failed to revoke token: {e}")))?;

        debug!("Token revoked successfully");
        Ok(())
    }
}
