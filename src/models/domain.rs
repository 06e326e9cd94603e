use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Score recorded on the ticket when the CAPTCHA could not be verified
pub const UNKNOWN_SCORE: f64 = -1.0;

/// Page metadata supplied by the wiki host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "articleId")]
    pub article_id: u64,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Interlanguage links, language code -> target title
    #[serde(rename = "languageLinks", default)]
    pub language_links: BTreeMap<String, String>,
    #[serde(rename = "contentArea", default)]
    pub content_area: Option<String>,
}

/// A change request assembled at submit time. Consumed once when the ticket
/// is opened; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRequest {
    pub article_id: u64,
    pub page_title: String,
    pub request_text: String,
    pub contact_name: String,
    /// Only syntactically valid addresses make it in here
    pub contact_email: Option<String>,
    pub categories: BTreeSet<String>,
    pub translated_languages: BTreeSet<String>,
    pub content_area: Option<String>,
    pub content_language_name: String,
    pub recaptcha_score: f64,
    pub source_link: Option<String>,
}

impl ChangeRequest {
    /// Build the service desk payload for this request
    pub fn into_issue(
        self,
        service_desk_id: &str,
        request_type_id: &str,
        raise_on_behalf_of: Option<CustomerId>,
    ) -> TicketIssue {
        TicketIssue {
            service_desk_id: service_desk_id.to_string(),
            request_type_id: request_type_id.to_string(),
            raise_on_behalf_of,
            request_field_values: RequestFieldValues {
                summary: self.page_title.clone(),
                description: self.request_text,
                language: SelectValue::new(self.content_language_name),
                page_title: self.page_title,
                contact_name: self.contact_name,
                contact_email: self.contact_email,
                categories: self.categories.into_iter().collect(),
                translated_languages: self
                    .translated_languages
                    .into_iter()
                    .map(SelectValue::new)
                    .collect(),
                content_area: self.content_area,
                link: self.source_link,
                recaptcha_score: self.recaptcha_score,
            },
        }
    }
}

/// Service desk customer account id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Select and multi-select fields are set by value, not by option id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectValue {
    pub value: String,
}

impl SelectValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// Payload for the service desk "create request" endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketIssue {
    #[serde(rename = "serviceDeskId")]
    pub service_desk_id: String,
    #[serde(rename = "requestTypeId")]
    pub request_type_id: String,
    #[serde(rename = "raiseOnBehalfOf")]
    pub raise_on_behalf_of: Option<CustomerId>,
    #[serde(rename = "requestFieldValues")]
    pub request_field_values: RequestFieldValues,
}

/// Request fields. Custom field ids are fixed by the service desk project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFieldValues {
    pub summary: String,
    pub description: String,
    #[serde(rename = "customfield_10305")]
    pub language: SelectValue,
    #[serde(rename = "customfield_10201")]
    pub page_title: String,
    #[serde(rename = "customfield_10202")]
    pub contact_name: String,
    #[serde(rename = "customfield_10203", default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(rename = "customfield_10800")]
    pub categories: Vec<String>,
    #[serde(rename = "customfield_11711")]
    pub translated_languages: Vec<SelectValue>,
    #[serde(rename = "customfield_11691", default, skip_serializing_if = "Option::is_none")]
    pub content_area: Option<String>,
    #[serde(rename = "customfield_11689", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(rename = "customfield_11714")]
    pub recaptcha_score: f64,
}
