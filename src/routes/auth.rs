use crate::auth::SessionToken;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::auth::{AuthStatusResponse, PinRequest, SessionStatusResponse, SetupResponse, VerifyResponse};
use crate::service::auth::{AuthService, VerifyOutcome};
use crate::service::session::SessionManager;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use std::sync::Arc;

/// Whether a PIN has been configured
#[openapi(tag = "Authentication")]
#[get("/status")]
pub async fn get_status(pool: &State<PgPool>, sessions: &State<Arc<SessionManager>>) -> Result<Json<AuthStatusResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, sessions.inner().as_ref());
    let is_setup = service.is_setup().await?;
    Ok(Json(AuthStatusResponse { is_setup }))
}

/// Report whether the supplied session token is still valid
#[openapi(tag = "Authentication")]
#[get("/session")]
pub async fn get_session(pool: &State<PgPool>, sessions: &State<Arc<SessionManager>>, token: SessionToken) -> Json<SessionStatusResponse> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, sessions.inner().as_ref());
    Json(service.session_status(token.0.as_deref()).await)
}

/// Configure the PIN (first run only)
#[openapi(tag = "Authentication")]
#[post("/setup", data = "<payload>")]
pub async fn post_setup(pool: &State<PgPool>, sessions: &State<Arc<SessionManager>>, payload: JsonBody<PinRequest>) -> Result<Json<SetupResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, sessions.inner().as_ref());
    service.setup(&payload.pin).await?;
    Ok(Json(SetupResponse { success: true }))
}

/// Check the PIN and open a session
///
/// A wrong PIN answers `{"valid": false}` with status 200.
#[openapi(tag = "Authentication")]
#[post("/verify", data = "<payload>")]
pub async fn post_verify(pool: &State<PgPool>, sessions: &State<Arc<SessionManager>>, payload: JsonBody<PinRequest>) -> Result<Json<VerifyResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, sessions.inner().as_ref());

    let response = match service.verify(&payload.pin).await? {
        VerifyOutcome::Valid { token, expires_at } => VerifyResponse {
            valid: true,
            session_token: Some(token),
            expires_at: Some(expires_at.timestamp_millis()),
        },
        VerifyOutcome::Invalid => VerifyResponse::invalid(),
    };

    Ok(Json(response))
}

/// Invalidate the current session
#[openapi(tag = "Authentication")]
#[post("/logout")]
pub async fn post_logout(pool: &State<PgPool>, sessions: &State<Arc<SessionManager>>, token: SessionToken) -> Result<Status, AppError> {
    let token = token.0.ok_or(AppError::SessionMissing)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, sessions.inner().as_ref());
    service.logout(&token).await;
    Ok(Status::Ok)
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_status, get_session, post_setup, post_verify, post_logout]
}
