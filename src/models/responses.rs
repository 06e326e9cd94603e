use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything the modal needs to show the form in place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadFormResponse {
    pub title: String,
    pub html: String,
    pub config: Map<String, Value>,
    pub modules: Vec<String>,
    #[serde(rename = "bottomScripts")]
    pub bottom_scripts: String,
    #[serde(rename = "cancelMsg")]
    pub cancel_msg: String,
}

/// Returned by the modal submit API once the ticket was opened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub title: String,
    pub html: String,
    #[serde(rename = "finishMsg")]
    pub finish_msg: String,
}

/// Modal API payload: either the form again, or the confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModalResponse {
    Confirmation(ConfirmationResponse),
    Form(LoadFormResponse),
    Error(ApiErrorResponse),
}

/// `{ "success": 1 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: u8,
}

/// `{ "error": "..." }` as consumed by the dialog scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
