use actix_multipart::MultipartError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use bulletin_core::{
    db::{MongoError, MongoErrorKind, WriteFailure},
    redis::RedisError,
    try_env
};
use derive_more::Display;
use serde_json::json;

lazy_static::lazy_static! {
    static ref DUPLICATE_KEY_FIELD: regex::Regex =
        regex::Regex::new(r#"dup key: \{ ?"?([A-Za-z0-9_.]+)"?"#).unwrap();
}

#[derive(Debug, Display)]
#[display("status: {status}, detail: {detail}")]
pub struct ErrorResponse {
    pub status:   u16,
    pub detail:   String,
    pub headers:  actix_web::http::header::HeaderMap,
    /// logged and, outside production, echoed back as `error`
    pub internal: Option<String>
}

impl Default for ErrorResponse {
    fn default() -> Self {
        ErrorResponse {
            status:   500,
            detail:   "An unexpected error occurred".to_string(),
            headers:  actix_web::http::header::HeaderMap::new(),
            internal: None
        }
    }
}

impl ErrorResponse {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        ErrorResponse {
            status,
            detail: detail.into(),
            ..Default::default()
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(401, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(403, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, detail)
    }

    pub fn with_internal(mut self, internal: impl ToString) -> Self {
        self.internal = Some(internal.to_string());
        self
    }
}

impl ResponseError for ErrorResponse {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let expose_internal = try_env().is_some_and(|env| env.dev);

        let body = match (&self.internal, expose_internal) {
            (Some(internal), true) => json!({
                "detail": self.detail,
                "error": internal
            }),
            _ => json!({
                "detail": self.detail
            })
        };

        let mut response = HttpResponse::build(self.status_code()).json(body);

        for (key, value) in self.headers.iter() {
            response.headers_mut().insert(key.clone(), value.clone());
        }

        response
    }
}

/// Field name of a duplicate-key violation, when the error is one.
pub fn duplicate_key_field(error: &MongoError) -> Option<String> {
    let message = match error.kind.as_ref() {
        MongoErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == 11000 =>
        {
            write_error.message.clone()
        }
        MongoErrorKind::Command(command_error) if command_error.code == 11000 => {
            command_error.message.clone()
        }
        _ => return None
    };

    Some(
        DUPLICATE_KEY_FIELD
            .captures(&message)
            .map(|captures| captures[1].to_string())
            .unwrap_or("field".to_string())
    )
}

impl From<MongoError> for ErrorResponse {
    fn from(error: MongoError) -> Self {
        if let Some(field) = duplicate_key_field(&error) {
            return ErrorResponse::bad_request(format!(
                "Duplicate {field} error. This {field} is already in use."
            ))
            .with_internal(error);
        }

        log::error!("database error: {error}");

        ErrorResponse::new(503, "Database service unavailable")
            .with_internal(error)
    }
}

impl From<RedisError> for ErrorResponse {
    fn from(error: RedisError) -> Self {
        log::error!("redis error: {error}");

        ErrorResponse::new(503, "Database service unavailable")
            .with_internal(error)
    }
}

impl From<bson::oid::Error> for ErrorResponse {
    fn from(error: bson::oid::Error) -> Self {
        ErrorResponse::bad_request("Invalid data format").with_internal(error)
    }
}

impl From<jsonwebtoken::errors::Error> for ErrorResponse {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        ErrorResponse::unauthorized("Authentication invalid")
            .with_internal(error)
    }
}

impl From<std::io::Error> for ErrorResponse {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            return ErrorResponse::not_found("Resource not found")
                .with_internal(error);
        }

        log::error!("io error: {error}");

        ErrorResponse::default().with_internal(error)
    }
}

impl From<MultipartError> for ErrorResponse {
    fn from(error: MultipartError) -> Self {
        ErrorResponse::bad_request("Upload error").with_internal(error)
    }
}

impl From<bson::ser::Error> for ErrorResponse {
    fn from(error: bson::ser::Error) -> Self {
        log::error!("serialization error: {error}");

        ErrorResponse::default().with_internal(error)
    }
}
