use serde::{Deserialize, Serialize};
use validator::Validate;

/// Action API submission (JSON)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitRequest {
    #[validate(range(min = 1))]
    #[serde(rename = "articleId")]
    pub article_id: u64,
    #[validate(length(min = 1))]
    pub request: String,
    #[serde(rename = "contactName", default)]
    pub contact_name: String,
    #[serde(rename = "contactEmail", default)]
    pub contact_email: String,
    #[serde(rename = "g-recaptcha-response", default)]
    pub recaptcha_token: String,
}

/// Form-encoded submission coming from the rendered form, either as a full
/// page POST or through the modal submit API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(rename = "wpkzcrArticleId", default)]
    pub article_id: String,
    #[serde(rename = "wpkzcrPageTitle", default)]
    pub page_title: String,
    #[serde(rename = "wpkzcrRequest", default)]
    pub request: String,
    #[serde(rename = "wpkzcrContactName", default)]
    pub contact_name: String,
    #[serde(rename = "wpkzcrContactEmail", default)]
    pub contact_email: String,
    #[serde(rename = "wpkzcrModal", default)]
    pub modal: String,
    #[serde(rename = "g-recaptcha-response", default)]
    pub recaptcha_token: String,
}

impl FormSubmission {
    /// Article ids arrive as text; anything unparsable resolves to no page
    pub fn article_id(&self) -> Option<u64> {
        self.article_id.trim().parse().ok()
    }

    pub fn is_modal(&self) -> bool {
        !self.modal.is_empty()
    }
}

/// Query for loading the form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadFormQuery {
    #[serde(rename = "articleId", default)]
    pub article_id: Option<u64>,
    #[serde(default)]
    pub modal: Option<String>,
}
