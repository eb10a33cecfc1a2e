use crate::error::Result;
use crate::models::login_session::LoginSession;
use crate::services::geo_service::{GeoResolver, UNKNOWN_LOCATION};
use crate::utils::device::describe_device;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Persistence seam for per-device login records. The production impl talks
/// to Postgres; tests substitute an in-memory store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_by_device(&self, device_id: &str) -> Result<Option<LoginSession>>;

    async fn insert(
        &self,
        device_id: &str,
        device_info: &str,
        location: &str,
    ) -> Result<LoginSession>;

    /// Bumps `login_count` by one and overwrites the per-login metadata.
    async fn touch(&self, id: Uuid, device_info: &str, location: &str) -> Result<()>;

    /// Newest `last_login` first.
    async fn list(&self) -> Result<Vec<LoginSession>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_by_device(&self, device_id: &str) -> Result<Option<LoginSession>> {
        let session = sqlx::query_as::<_, LoginSession>(
            r#"
            SELECT id, device_id, device_info, location, login_count, created_at, last_login
            FROM login_sessions
            WHERE device_id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn insert(
        &self,
        device_id: &str,
        device_info: &str,
        location: &str,
    ) -> Result<LoginSession> {
        let session = sqlx::query_as::<_, LoginSession>(
            r#"
            INSERT INTO login_sessions (device_id, device_info, location, login_count)
            VALUES ($1, $2, $3, 1)
            RETURNING id, device_id, device_info, location, login_count, created_at, last_login
            "#,
        )
        .bind(device_id)
        .bind(device_info)
        .bind(location)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn touch(&self, id: Uuid, device_info: &str, location: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE login_sessions
            SET login_count = login_count + 1,
                device_info = $2,
                location = $3,
                last_login = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(device_info)
        .bind(location)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<LoginSession>> {
        let sessions = sqlx::query_as::<_, LoginSession>(
            r#"
            SELECT id, device_id, device_info, location, login_count, created_at, last_login
            FROM login_sessions
            ORDER BY last_login DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Idempotent: zero rows affected is fine.
        sqlx::query("DELETE FROM login_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Answers "how many times has this device logged in?" and records new
/// successful logins. The count only unlocks a cosmetic fast path in the
/// login flow, so every failure here degrades instead of propagating.
#[derive(Clone)]
pub struct DeviceTrustService {
    store: Arc<dyn SessionStore>,
    geo: Arc<dyn GeoResolver>,
}

impl DeviceTrustService {
    pub fn new(store: Arc<dyn SessionStore>, geo: Arc<dyn GeoResolver>) -> Self {
        Self { store, geo }
    }

    /// Returns 0 for unseen devices and on store errors: an unreachable
    /// store must show the full verification flow, never grant the
    /// shortcut.
    pub async fn login_count(&self, device_id: &str) -> i64 {
        match self.store.find_by_device(device_id).await {
            Ok(Some(session)) => session.login_count,
            Ok(None) => 0,
            Err(err) => {
                warn!(error = ?err, "Login count lookup failed, treating device as unseen");
                0
            }
        }
    }

    /// Read-modify-write against the shared store; a concurrent login from a
    /// second tab can lose one increment, which is acceptable for an
    /// informational counter.
    pub async fn record_login(
        &self,
        device_id: &str,
        user_agent: &str,
        ip: Option<&str>,
    ) -> Result<()> {
        let device_info = describe_device(user_agent);
        let location = match self.geo.resolve(ip).await {
            Ok(location) => location,
            Err(err) => {
                warn!(error = ?err, "Geolocation lookup failed, storing sentinel");
                UNKNOWN_LOCATION.to_string()
            }
        };

        match self.store.find_by_device(device_id).await? {
            Some(session) => self.store.touch(session.id, &device_info, &location).await,
            None => self
                .store
                .insert(device_id, &device_info, &location)
                .await
                .map(|_| ()),
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<LoginSession>> {
        self.store.list().await
    }

    pub async fn delete_session(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await
    }
}
