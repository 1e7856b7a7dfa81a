use crate::error::app_error::AppError;
use crate::service::session::{SessionCheck, SessionManager, token_prefix};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use std::sync::Arc;
use tracing::{debug, error};

pub const SESSION_HEADER: &str = "X-Session-Token";

/// Why a request was turned away; read back by the 401 catcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    Missing,
    Expired,
}

/// Request guard proving the caller holds a live session.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub expires_at: DateTime<Utc>,
}

/// The session header as sent, without validating it.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

pub(crate) fn parse_session_header(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|token| !token.is_empty())
}

fn reject(req: &Request<'_>, rejection: SessionRejection) -> RequestOutcome<Authenticated, AppError> {
    req.local_cache(|| Some(rejection));
    let error = match rejection {
        SessionRejection::Missing => AppError::SessionMissing,
        SessionRejection::Expired => AppError::SessionExpired,
    };
    Outcome::Error((Status::Unauthorized, error))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Authenticated {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(sessions) = req.rocket().state::<Arc<SessionManager>>() else {
            error!("session manager is not managed by rocket");
            return Outcome::Error((Status::InternalServerError, AppError::SessionMissing));
        };

        let Some(token) = parse_session_header(req.headers().get_one(SESSION_HEADER)) else {
            return reject(req, SessionRejection::Missing);
        };

        match sessions.validate(token).await {
            SessionCheck::Valid(session) => Outcome::Success(Authenticated {
                expires_at: session.expires_at,
            }),
            SessionCheck::Missing => {
                debug!(token = %token_prefix(token), "unknown session token");
                reject(req, SessionRejection::Missing)
            }
            SessionCheck::Expired => reject(req, SessionRejection::Expired),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionToken {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, ()> {
        let token = parse_session_header(req.headers().get_one(SESSION_HEADER)).map(str::to_string);
        Outcome::Success(SessionToken(token))
    }
}

fn session_security() -> RequestHeaderInput {
    let security_scheme = SecurityScheme {
        description: Some("Session token returned by POST /api/auth/verify.".to_string()),
        data: SecuritySchemeData::ApiKey {
            name: SESSION_HEADER.to_string(),
            location: "header".to_string(),
        },
        extensions: Object::default(),
    };

    let mut security_req = SecurityRequirement::new();
    security_req.insert("sessionToken".to_string(), Vec::new());

    RequestHeaderInput::Security("sessionToken".to_string(), security_scheme, security_req)
}

impl<'a> OpenApiFromRequest<'a> for Authenticated {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(session_security())
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Unauthorized - session missing or expired".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}

impl<'a> OpenApiFromRequest<'a> for SessionToken {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(session_security())
    }
}
