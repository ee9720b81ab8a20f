use rocket::response::{Responder, Response};
use rocket::{Request, http::Status};
use std::io::Cursor;

#[derive(Debug)]
pub enum ApiError {
    /// The remote data source rejected or failed a request. Carries the
    /// upstream-provided message when the error body was structured.
    Upstream(String),
    /// A view method was invoked before credential resolution completed.
    NotInitialized(String),
    ParseError(String),
    DatabaseError(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    InternalServerError(String),
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let (status, message) = match self {
            ApiError::Upstream(msg) => (Status::BadGateway, msg),
            ApiError::NotInitialized(msg) => (Status::InternalServerError, msg),
            ApiError::ParseError(msg) => (Status::BadRequest, msg),
            ApiError::DatabaseError(msg) => (Status::InternalServerError, msg),
            ApiError::BadRequest(msg) => (Status::BadRequest, msg),
            ApiError::Unauthorized(msg) => (Status::Unauthorized, msg),
            ApiError::Forbidden(msg) => (Status::Forbidden, msg),
            ApiError::NotFound(msg) => (Status::NotFound, msg),
            ApiError::InternalServerError(msg) => (Status::InternalServerError, msg),
        };

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::Plain)
            .sized_body(message.len(), Cursor::new(message))
            .ok()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Upstream(format!("Network error: {err}"))
    }
}
