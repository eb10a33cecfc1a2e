use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per known device. `device_id` is a client-generated opaque token
/// and a UX convenience only, never an authorization boundary: it can be
/// cleared or forged by the end user, and a high `login_count` merely skips
/// the cosmetic verification gate, not the credential check.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginSession {
    pub id: Uuid,
    pub device_id: String,
    pub device_info: String,
    pub location: String,
    pub login_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}
