use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::auth_service::{FlowStatus, LoginStep};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StartFlowPayload {
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOwnerPayload {
    pub flow_id: Uuid,
    #[validate(length(min = 1))]
    pub owner_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizAnswerPayload {
    pub flow_id: Uuid,
    #[validate(length(min = 1))]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowIdPayload {
    pub flow_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CredentialsPayload {
    pub flow_id: Uuid,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStatusResponse {
    pub flow_id: Uuid,
    pub device_id: String,
    pub step: LoginStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedResponse {
    pub step: LoginStep,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub logged_in: bool,
}

impl From<FlowStatus> for FlowStatusResponse {
    fn from(value: FlowStatus) -> Self {
        Self {
            flow_id: value.flow_id,
            device_id: value.device_id,
            step: value.step,
            question: value.question.map(str::to_string),
        }
    }
}
