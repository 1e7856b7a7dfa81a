use crate::routes::error::ErrorResponse;
use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use std::io::Cursor;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Internal server error")]
    Media {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
    #[error("Unauthorized")]
    SessionMissing,
    #[error("Session expired")]
    SessionExpired,
    #[error("PIN already set up")]
    PinAlreadySetup,
    #[error("PIN not set up")]
    PinNotSetup,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {message}")]
    UuidError {
        message: String,
        #[source]
        source: uuid::Error,
    },
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn media(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Media {
            message: message.into(),
            source,
        }
    }

    pub fn uuid(message: impl Into<String>, source: uuid::Error) -> Self {
        Self::UuidError {
            message: message.into(),
            source,
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }

    /// Whether the client should drop its token and return to the PIN prompt.
    pub fn is_session_error(&self) -> bool {
        matches!(self, AppError::SessionMissing | AppError::SessionExpired)
    }
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        AppError::password_hash("PIN hashing failed", e)
    }
}

impl From<uuid::Error> for AppError {
    fn from(e: uuid::Error) -> Self {
        AppError::uuid("Invalid UUID", e)
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Media { .. } => Status::InternalServerError,
            AppError::PasswordHash { .. } => Status::InternalServerError,
            AppError::ConfigurationError { .. } => Status::InternalServerError,
            AppError::SessionMissing => Status::Unauthorized,
            AppError::SessionExpired => Status::Unauthorized,
            AppError::PinAlreadySetup => Status::BadRequest,
            AppError::PinNotSetup => Status::BadRequest,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::InvalidUpload(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::UuidError { .. } => Status::BadRequest,
            AppError::ValidationError(_) => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let status = Status::from(&self);

        if status.class().is_server_error() {
            error!(
                error = ?self,
                request_id = %request_id,
                method = %method,
                uri = %uri,
                "request failed"
            );
        } else {
            warn!(
                error = %self,
                request_id = %request_id,
                method = %method,
                uri = %uri,
                "request rejected"
            );
        }

        let body = ErrorResponse {
            error: self.to_string(),
            session_expired: self.is_session_error(),
        }
        .to_json();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Bad Request"),
            ("401", "Unauthorized - session missing or expired"),
            ("404", "Not Found"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_error_taxonomy() {
        assert_eq!(Status::from(&AppError::BadRequest("x".into())), Status::BadRequest);
        assert_eq!(Status::from(&AppError::PinAlreadySetup), Status::BadRequest);
        assert_eq!(Status::from(&AppError::PinNotSetup), Status::BadRequest);
        assert_eq!(Status::from(&AppError::SessionExpired), Status::Unauthorized);
        assert_eq!(Status::from(&AppError::SessionMissing), Status::Unauthorized);
        assert_eq!(Status::from(&AppError::NotFound("car".into())), Status::NotFound);
        assert_eq!(
            Status::from(&AppError::media("write failed", std::io::Error::other("disk full"))),
            Status::InternalServerError
        );
    }

    #[test]
    fn storage_errors_hide_details() {
        let err = AppError::media("write failed", std::io::Error::other("/srv/media is full"));
        assert_eq!(err.to_string(), "Internal server error");

        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn only_session_errors_force_relogin() {
        assert!(AppError::SessionExpired.is_session_error());
        assert!(AppError::SessionMissing.is_session_error());
        assert!(!AppError::PinNotSetup.is_session_error());
    }
}
