use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// The single stored PIN credential.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credential {
    pub pin_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, JsonSchema)]
pub struct PinRequest {
    pub pin: String,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub is_setup: bool,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct SetupResponse {
    pub success: bool,
}

#[derive(Serialize, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub valid: bool,
    /// Unix timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Unix timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl VerifyResponse {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            session_token: None,
            expires_at: None,
        }
    }
}
