use crate::auth::SessionRejection;
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[derive(Serialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub error: String,
    /// Tells the client to discard its token and return to the PIN prompt.
    #[serde(rename = "sessionExpired", skip_serializing_if = "std::ops::Not::not")]
    pub session_expired: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            session_expired: false,
        }
    }

    pub fn to_json(&self) -> String {
        rocket::serde::json::to_string(self).unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string())
    }
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Bad request"))
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> Json<ErrorResponse> {
    let message = match req.local_cache(|| None::<SessionRejection>) {
        Some(SessionRejection::Expired) => "Session expired",
        _ => "Unauthorized",
    };

    Json(ErrorResponse {
        error: message.to_string(),
        session_expired: true,
    })
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Not found"))
}

#[catch(413)]
pub fn payload_too_large(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Payload too large"))
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Malformed request"))
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error"))
}
