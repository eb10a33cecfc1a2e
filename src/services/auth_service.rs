use crate::config::QuizQuestion;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::services::device_trust_service::DeviceTrustService;
use crate::utils::credentials::CredentialVerifier;
use crate::utils::token::generate_device_token;
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

const DEVICE_TOKEN_LENGTH: usize = 32;
const ADMIN_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;
const FLOW_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStep {
    Verify,
    Quiz,
    Login,
    Authenticated,
}

/// The admin login gate as a pure state machine. Devices with enough prior
/// logins start directly at `Login`; everyone else walks
/// `Verify -> Quiz -> Login`. The struct owns no I/O; [`AuthService`] wires
/// it to the device tracker and the credential verifier.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    step: LoginStep,
    quiz: Option<QuizQuestion>,
}

impl LoginFlow {
    pub fn begin(login_count: i64, threshold: i64) -> Self {
        let step = if login_count >= threshold {
            LoginStep::Login
        } else {
            LoginStep::Verify
        };
        Self { step, quiz: None }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.quiz.as_ref()
    }

    /// A successful claim re-randomizes the quiz selection every time, so
    /// backing out and re-verifying can yield a different question.
    pub fn submit_owner_name<R: Rng>(
        &mut self,
        input: &str,
        owner_name: &str,
        questions: &'static [QuizQuestion],
        rng: &mut R,
    ) -> Result<QuizQuestion> {
        if self.step != LoginStep::Verify {
            return Err(Error::BadRequest("Flow is not at the verify step".into()));
        }
        if !phrase_matches(input, owner_name) {
            return Err(Error::Unauthorized(
                "Nama pemilik salah! Anda bukan admin yang berwenang.".into(),
            ));
        }

        let question = questions[rng.gen_range(0..questions.len())];
        self.quiz = Some(question);
        self.step = LoginStep::Quiz;
        Ok(question)
    }

    /// A wrong answer keeps the same question; only a fresh verify success
    /// re-draws it.
    pub fn submit_quiz_answer(&mut self, input: &str) -> Result<()> {
        if self.step != LoginStep::Quiz {
            return Err(Error::BadRequest("Flow is not at the quiz step".into()));
        }
        let question = self
            .quiz
            .as_ref()
            .ok_or_else(|| Error::Internal("Quiz step without a selected question".into()))?;

        if !phrase_matches(input, question.answer) {
            return Err(Error::Unauthorized("Jawaban salah! Coba lagi.".into()));
        }

        self.step = LoginStep::Login;
        Ok(())
    }

    /// Discards the quiz selection and returns to the verify gate.
    pub fn back_to_verify(&mut self) -> Result<()> {
        match self.step {
            LoginStep::Quiz | LoginStep::Login => {
                self.quiz = None;
                self.step = LoginStep::Verify;
                Ok(())
            }
            _ => Err(Error::BadRequest("Flow cannot return to verify".into())),
        }
    }

    pub fn submit_credentials(&mut self, accepted: bool) -> Result<()> {
        if self.step != LoginStep::Login {
            return Err(Error::BadRequest("Flow is not at the login step".into()));
        }
        if !accepted {
            return Err(Error::Unauthorized("Username atau password salah!".into()));
        }
        self.step = LoginStep::Authenticated;
        Ok(())
    }
}

/// Trimmed, case-insensitive comparison used for the owner phrase and quiz
/// answers. Whitespace-only input never matches a non-empty phrase.
fn phrase_matches(input: &str, expected: &str) -> bool {
    input.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Snapshot of a flow handed back to the client after each submission.
#[derive(Debug, Clone)]
pub struct FlowStatus {
    pub flow_id: Uuid,
    pub device_id: String,
    pub step: LoginStep,
    pub question: Option<&'static str>,
}

/// Drives [`LoginFlow`] instances against the device tracker. Flow state is
/// in-process only, keyed by a server-issued id, and discarded once the flow
/// authenticates or outlives [`FLOW_TTL`]; the `device_id` is the only thing
/// the client keeps.
#[derive(Clone)]
pub struct AuthService {
    tracker: DeviceTrustService,
    verifier: Arc<dyn CredentialVerifier>,
    owner_name: String,
    questions: &'static [QuizQuestion],
    trust_threshold: i64,
    jwt_secret: String,
    flow_ttl: Duration,
    flows: Arc<Mutex<HashMap<Uuid, FlowEntry>>>,
}

/// A flow that neither authenticates nor errors out still has to leave the
/// map eventually; entries older than the TTL are swept on every lock.
struct FlowEntry {
    device_id: String,
    flow: LoginFlow,
    created_at: Instant,
}

impl AuthService {
    pub fn new(
        tracker: DeviceTrustService,
        verifier: Arc<dyn CredentialVerifier>,
        owner_name: String,
        questions: &'static [QuizQuestion],
        trust_threshold: i64,
        jwt_secret: String,
    ) -> Self {
        Self {
            tracker,
            verifier,
            owner_name,
            questions,
            trust_threshold,
            jwt_secret,
            flow_ttl: FLOW_TTL,
            flows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_flow_ttl(mut self, ttl: Duration) -> Self {
        self.flow_ttl = ttl;
        self
    }

    /// Entry point ("Loading" in the UI): resolves the device's login count
    /// and positions a fresh flow. Unknown clients get a new device token.
    pub async fn start(&self, device_id: Option<String>) -> FlowStatus {
        let device_id = match device_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_device_token(DEVICE_TOKEN_LENGTH),
        };

        let count = self.tracker.login_count(&device_id).await;
        let flow = LoginFlow::begin(count, self.trust_threshold);
        let flow_id = Uuid::new_v4();
        let step = flow.step();

        self.lock_flows().insert(
            flow_id,
            FlowEntry {
                device_id: device_id.clone(),
                flow,
                created_at: Instant::now(),
            },
        );

        FlowStatus {
            flow_id,
            device_id,
            step,
            question: None,
        }
    }

    pub async fn submit_owner_name(&self, flow_id: Uuid, input: &str) -> Result<FlowStatus> {
        let mut flows = self.lock_flows();
        let entry = flows.get_mut(&flow_id).ok_or_else(flow_not_found)?;

        let question = entry.flow.submit_owner_name(
            input,
            &self.owner_name,
            self.questions,
            &mut rand::thread_rng(),
        )?;

        Ok(FlowStatus {
            flow_id,
            device_id: entry.device_id.clone(),
            step: entry.flow.step(),
            question: Some(question.question),
        })
    }

    pub async fn submit_quiz_answer(&self, flow_id: Uuid, input: &str) -> Result<FlowStatus> {
        let mut flows = self.lock_flows();
        let entry = flows.get_mut(&flow_id).ok_or_else(flow_not_found)?;

        entry.flow.submit_quiz_answer(input)?;

        Ok(FlowStatus {
            flow_id,
            device_id: entry.device_id.clone(),
            step: entry.flow.step(),
            question: None,
        })
    }

    pub async fn back_to_verify(&self, flow_id: Uuid) -> Result<FlowStatus> {
        let mut flows = self.lock_flows();
        let entry = flows.get_mut(&flow_id).ok_or_else(flow_not_found)?;

        entry.flow.back_to_verify()?;

        Ok(FlowStatus {
            flow_id,
            device_id: entry.device_id.clone(),
            step: entry.flow.step(),
            question: None,
        })
    }

    /// Credential check and, on success, the one side effect of the whole
    /// flow: recording the login against the device. Persistence failures
    /// after the credentials have been accepted never block access.
    pub async fn login(
        &self,
        flow_id: Uuid,
        username: &str,
        password: &str,
        user_agent: &str,
        ip: Option<&str>,
    ) -> Result<String> {
        let device_id = {
            let mut flows = self.lock_flows();
            let entry = flows.get_mut(&flow_id).ok_or_else(flow_not_found)?;

            let accepted = self.verifier.verify(username, password);
            entry.flow.submit_credentials(accepted)?;
            let device_id = entry.device_id.clone();
            flows.remove(&flow_id);
            device_id
        };

        if let Err(err) = self.tracker.record_login(&device_id, user_agent, ip).await {
            warn!(error = ?err, device_id = %device_id, "Failed to record login session");
        }

        self.issue_admin_token()
    }

    fn issue_admin_token(&self) -> Result<String> {
        let exp = crate::utils::time::now().timestamp() + ADMIN_TOKEN_TTL_SECS;
        let claims = Claims {
            sub: "admin".to_string(),
            exp: exp as usize,
            role: Some("admin".to_string()),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn lock_flows(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, FlowEntry>> {
        let mut flows = self.flows.lock().expect("login flow mutex poisoned");
        let ttl = self.flow_ttl;
        flows.retain(|_, entry| entry.created_at.elapsed() < ttl);
        flows
    }
}

fn flow_not_found() -> Error {
    Error::NotFound("Login flow not found or expired".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QUIZ_QUESTIONS;
    use rand::rngs::mock::StepRng;

    fn rng() -> StepRng {
        StepRng::new(0, 1)
    }

    #[test]
    fn unseen_device_starts_at_verify() {
        let flow = LoginFlow::begin(0, 3);
        assert_eq!(flow.step(), LoginStep::Verify);
    }

    #[test]
    fn count_below_threshold_starts_at_verify() {
        let flow = LoginFlow::begin(2, 3);
        assert_eq!(flow.step(), LoginStep::Verify);
    }

    #[test]
    fn trusted_device_skips_to_login() {
        let flow = LoginFlow::begin(3, 3);
        assert_eq!(flow.step(), LoginStep::Login);
        let flow = LoginFlow::begin(5, 3);
        assert_eq!(flow.step(), LoginStep::Login);
    }

    #[test]
    fn owner_name_match_is_trimmed_and_case_insensitive() {
        let mut flow = LoginFlow::begin(0, 3);
        flow.submit_owner_name("  ALLEA ", "allea", QUIZ_QUESTIONS, &mut rng())
            .expect("phrase should match");
        assert_eq!(flow.step(), LoginStep::Quiz);
        assert!(flow.current_question().is_some());
    }

    #[test]
    fn wrong_owner_name_stays_in_verify() {
        let mut flow = LoginFlow::begin(0, 3);
        let err = flow
            .submit_owner_name("bukan", "allea", QUIZ_QUESTIONS, &mut rng())
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(flow.step(), LoginStep::Verify);
        assert!(flow.current_question().is_none());
    }

    #[test]
    fn whitespace_only_owner_name_is_a_mismatch() {
        let mut flow = LoginFlow::begin(0, 3);
        assert!(flow
            .submit_owner_name("   ", "allea", QUIZ_QUESTIONS, &mut rng())
            .is_err());
        assert_eq!(flow.step(), LoginStep::Verify);
    }

    #[test]
    fn wrong_quiz_answer_keeps_the_same_question() {
        let mut flow = LoginFlow::begin(0, 3);
        flow.submit_owner_name("allea", "allea", QUIZ_QUESTIONS, &mut rng())
            .unwrap();
        let before = flow.current_question().unwrap().question;

        let err = flow.submit_quiz_answer("salah").unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(flow.step(), LoginStep::Quiz);
        assert_eq!(flow.current_question().unwrap().question, before);
    }

    #[test]
    fn correct_quiz_answer_advances_to_login() {
        let mut flow = LoginFlow::begin(0, 3);
        let question = flow
            .submit_owner_name("allea", "allea", QUIZ_QUESTIONS, &mut rng())
            .unwrap();
        flow.submit_quiz_answer(&format!("  {}  ", question.answer.to_uppercase()))
            .expect("trimmed, case-insensitive answer should match");
        assert_eq!(flow.step(), LoginStep::Login);
    }

    #[test]
    fn backing_out_discards_the_quiz_selection() {
        let mut flow = LoginFlow::begin(0, 3);
        flow.submit_owner_name("allea", "allea", QUIZ_QUESTIONS, &mut rng())
            .unwrap();
        flow.back_to_verify().unwrap();
        assert_eq!(flow.step(), LoginStep::Verify);
        assert!(flow.current_question().is_none());
    }

    #[test]
    fn credentials_rejected_in_wrong_step() {
        let mut flow = LoginFlow::begin(0, 3);
        let err = flow.submit_credentials(true).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(flow.step(), LoginStep::Verify);
    }

    #[test]
    fn wrong_credentials_stay_in_login() {
        let mut flow = LoginFlow::begin(5, 3);
        let err = flow.submit_credentials(false).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert_eq!(flow.step(), LoginStep::Login);
    }

    #[test]
    fn correct_credentials_authenticate() {
        let mut flow = LoginFlow::begin(5, 3);
        flow.submit_credentials(true).unwrap();
        assert_eq!(flow.step(), LoginStep::Authenticated);
    }

    mod service {
        use super::super::*;
        use crate::config::QUIZ_QUESTIONS;
        use crate::models::login_session::LoginSession;
        use crate::services::device_trust_service::SessionStore;
        use crate::services::geo_service::GeoResolver;
        use crate::utils::credentials::MockCredentialVerifier;
        use async_trait::async_trait;

        /// Store that accepts nothing: every operation fails.
        struct DownStore;

        #[async_trait]
        impl SessionStore for DownStore {
            async fn find_by_device(&self, _: &str) -> Result<Option<LoginSession>> {
                Err(Error::Internal("store down".into()))
            }
            async fn insert(&self, _: &str, _: &str, _: &str) -> Result<LoginSession> {
                Err(Error::Internal("store down".into()))
            }
            async fn touch(&self, _: Uuid, _: &str, _: &str) -> Result<()> {
                Err(Error::Internal("store down".into()))
            }
            async fn list(&self) -> Result<Vec<LoginSession>> {
                Err(Error::Internal("store down".into()))
            }
            async fn delete(&self, _: Uuid) -> Result<()> {
                Err(Error::Internal("store down".into()))
            }
        }

        struct DownGeo;

        #[async_trait]
        impl GeoResolver for DownGeo {
            async fn resolve(&self, _: Option<&str>) -> Result<String> {
                Err(Error::Internal("geo down".into()))
            }
        }

        fn service(verifier: MockCredentialVerifier) -> AuthService {
            let tracker = DeviceTrustService::new(Arc::new(DownStore), Arc::new(DownGeo));
            AuthService::new(
                tracker,
                Arc::new(verifier),
                "allea".to_string(),
                QUIZ_QUESTIONS,
                3,
                "secret".to_string(),
            )
        }

        #[tokio::test]
        async fn verifier_is_consulted_once_per_submit() {
            let mut verifier = MockCredentialVerifier::new();
            verifier
                .expect_verify()
                .times(1)
                .returning(|username, password| username == "akutelang" && password == "456789");

            let service = service(verifier);
            // Store is down: the count degrades to 0 and the full flow runs.
            let status = service.start(Some("dev-1".to_string())).await;
            assert_eq!(status.step, LoginStep::Verify);

            let status = service
                .submit_owner_name(status.flow_id, "allea")
                .await
                .unwrap();
            let question = status.question.unwrap();
            let answer = QUIZ_QUESTIONS
                .iter()
                .find(|q| q.question == question)
                .unwrap()
                .answer;
            service
                .submit_quiz_answer(status.flow_id, answer)
                .await
                .unwrap();

            // Both the record write and the geo lookup fail, yet the token
            // is still issued.
            let token = service
                .login(status.flow_id, "akutelang", "456789", "test-agent", None)
                .await
                .expect("login must not depend on persistence");
            assert!(!token.is_empty());
        }

        #[tokio::test]
        async fn rejected_credentials_never_consume_the_flow() {
            let mut verifier = MockCredentialVerifier::new();
            verifier.expect_verify().times(2).returning(|_, _| false);

            let service = service(verifier);
            let status = service.start(Some("dev-2".to_string())).await;
            let flow_id = status.flow_id;
            let status = service.submit_owner_name(flow_id, "allea").await.unwrap();
            let question = status.question.unwrap();
            let answer = QUIZ_QUESTIONS
                .iter()
                .find(|q| q.question == question)
                .unwrap()
                .answer;
            service.submit_quiz_answer(flow_id, answer).await.unwrap();

            for _ in 0..2 {
                let err = service
                    .login(flow_id, "x", "y", "test-agent", None)
                    .await
                    .unwrap_err();
                assert!(matches!(err, Error::Unauthorized(_)));
            }
        }

        #[tokio::test]
        async fn abandoned_flows_expire() {
            let service =
                service(MockCredentialVerifier::new()).with_flow_ttl(Duration::ZERO);

            let status = service.start(Some("dev-3".to_string())).await;
            let err = service
                .submit_owner_name(status.flow_id, "allea")
                .await
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(_)));
        }

        #[tokio::test]
        async fn live_flows_survive_the_sweep() {
            let service = service(MockCredentialVerifier::new());

            let stale = service.start(Some("dev-4".to_string())).await;
            let fresh = service.start(Some("dev-5".to_string())).await;
            // Both are well inside the TTL: neither may be swept by the
            // other's traffic.
            service
                .submit_owner_name(stale.flow_id, "allea")
                .await
                .unwrap();
            service
                .submit_owner_name(fresh.flow_id, "allea")
                .await
                .unwrap();
        }
    }

    #[test]
    fn quiz_selection_draws_from_the_configured_set() {
        let mut flow = LoginFlow::begin(0, 3);
        let question = flow
            .submit_owner_name("allea", "allea", QUIZ_QUESTIONS, &mut rand::thread_rng())
            .unwrap();
        assert!(QUIZ_QUESTIONS
            .iter()
            .any(|q| q.question == question.question));
    }
}
