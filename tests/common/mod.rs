use async_trait::async_trait;
use chrono::Utc;
use kripikwasyif_backend::config::QUIZ_QUESTIONS;
use kripikwasyif_backend::error::{Error, Result};
use kripikwasyif_backend::models::login_session::LoginSession;
use kripikwasyif_backend::services::auth_service::AuthService;
use kripikwasyif_backend::services::device_trust_service::{DeviceTrustService, SessionStore};
use kripikwasyif_backend::services::geo_service::GeoResolver;
use kripikwasyif_backend::utils::credentials::PlaintextVerifier;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_OWNER: &str = "allea";
pub const TEST_USERNAME: &str = "akutelang";
pub const TEST_PASSWORD: &str = "456789";
pub const TEST_JWT_SECRET: &str = "test_secret_key";

/// In-memory stand-in for the Postgres session store, with switches to
/// simulate an unreachable backing store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, LoginSession>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, device_id: &str, login_count: i64) -> LoginSession {
        let session = LoginSession {
            id: Uuid::new_v4(),
            device_id: device_id.to_string(),
            device_info: "Windows - Chrome".to_string(),
            location: "unknown".to_string(),
            login_count,
            created_at: Some(Utc::now() - chrono::Duration::days(7)),
            last_login: Some(Utc::now() - chrono::Duration::days(1)),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(device_id.to_string(), session.clone());
        session
    }

    pub fn get(&self, device_id: &str) -> Option<LoginSession> {
        self.sessions.lock().unwrap().get(device_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_by_device(&self, device_id: &str) -> Result<Option<LoginSession>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Internal("store unreachable".into()));
        }
        Ok(self.get(device_id))
    }

    async fn insert(
        &self,
        device_id: &str,
        device_info: &str,
        location: &str,
    ) -> Result<LoginSession> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("store unreachable".into()));
        }
        let session = LoginSession {
            id: Uuid::new_v4(),
            device_id: device_id.to_string(),
            device_info: device_info.to_string(),
            location: location.to_string(),
            login_count: 1,
            created_at: Some(Utc::now()),
            last_login: Some(Utc::now()),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(device_id.to_string(), session.clone());
        Ok(session)
    }

    async fn touch(&self, id: Uuid, device_info: &str, location: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("store unreachable".into()));
        }
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.values_mut().find(|s| s.id == id) {
            session.login_count += 1;
            session.device_info = device_info.to_string();
            session.location = location.to_string();
            session.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<LoginSession>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Internal("store unreachable".into()));
        }
        let mut sessions: Vec<LoginSession> =
            self.sessions.lock().unwrap().values().cloned().collect();
        sessions.sort_by(|a, b| b.last_login.cmp(&a.last_login));
        Ok(sessions)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("store unreachable".into()));
        }
        self.sessions.lock().unwrap().retain(|_, s| s.id != id);
        Ok(())
    }
}

/// Geolocation fake: a fixed answer, or `Err` to exercise the fallback.
pub struct StaticGeoResolver {
    pub location: Option<String>,
}

#[async_trait]
impl GeoResolver for StaticGeoResolver {
    async fn resolve(&self, _ip: Option<&str>) -> Result<String> {
        self.location
            .clone()
            .ok_or_else(|| Error::Internal("geo lookup failed".into()))
    }
}

/// Geolocation fake that remembers which address it was asked about.
#[derive(Default)]
pub struct RecordingGeoResolver {
    last_ip: Mutex<Option<Option<String>>>,
}

impl RecordingGeoResolver {
    pub fn last_ip(&self) -> Option<Option<String>> {
        self.last_ip.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeoResolver for RecordingGeoResolver {
    async fn resolve(&self, ip: Option<&str>) -> Result<String> {
        *self.last_ip.lock().unwrap() = Some(ip.map(str::to_string));
        Ok("Semarang, Central Java, Indonesia".to_string())
    }
}

pub fn auth_service(
    store: Arc<InMemorySessionStore>,
    geo: Arc<dyn GeoResolver>,
) -> AuthService {
    let tracker = DeviceTrustService::new(store, geo);
    AuthService::new(
        tracker,
        Arc::new(PlaintextVerifier::new(
            TEST_USERNAME.to_string(),
            TEST_PASSWORD.to_string(),
        )),
        TEST_OWNER.to_string(),
        QUIZ_QUESTIONS,
        3,
        TEST_JWT_SECRET.to_string(),
    )
}

/// Maps a served question back to its configured answer.
pub fn answer_for(question: &str) -> &'static str {
    QUIZ_QUESTIONS
        .iter()
        .find(|q| q.question == question)
        .map(|q| q.answer)
        .expect("question should come from the configured set")
}
