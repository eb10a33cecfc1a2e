use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::login_session::LoginSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSessionResponse {
    pub id: Uuid,
    pub device_id: String,
    pub device_info: String,
    pub location: String,
    pub login_count: i64,
    /// True once the device has cleared the trust threshold and skips the
    /// verification gate.
    pub trusted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSessionListResponse {
    pub items: Vec<LoginSessionResponse>,
}

impl LoginSessionResponse {
    pub fn from_session(value: LoginSession, trust_threshold: i64) -> Self {
        Self {
            id: value.id,
            device_id: value.device_id,
            device_info: value.device_info,
            location: value.location,
            login_count: value.login_count,
            trusted: value.login_count >= trust_threshold,
            created_at: value.created_at,
            last_login: value.last_login,
        }
    }
}
