use crate::config::JiraSettings;
use crate::models::{CustomerId, TicketIssue};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use validator::ValidateEmail;

/// Errors that can occur when talking to Jira Service Management
#[derive(Debug, Error)]
pub enum TicketingError {
    #[error("Jira configuration incomplete: missing {0}")]
    MissingConfig(String),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {status} - {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Jira Service Management REST client
///
/// Handles:
/// - Customer lookup by email (experimental API)
/// - Customer creation
/// - Opening service desk requests
pub struct TicketingClient {
    server: String,
    user: String,
    password: String,
    service_desk_id: String,
    request_type_id: String,
    project: String,
    client: Client,
}

impl std::fmt::Debug for TicketingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketingClient")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"***")
            .field("service_desk_id", &self.service_desk_id)
            .field("request_type_id", &self.request_type_id)
            .field("project", &self.project)
            .finish()
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String, TicketingError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TicketingError::MissingConfig(name.to_string()))
}

fn redact(value: &Option<String>) -> &'static str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => "***",
        _ => "",
    }
}

/// Syntactic email check used before any lookup
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

impl TicketingClient {
    /// Create a client from settings
    ///
    /// Fails unless server, user, password, service desk id, request type
    /// id and project key are all present. The project key is needed for the
    /// customer search. The failure is logged with the password redacted.
    pub fn from_settings(settings: &JiraSettings) -> Result<Self, TicketingError> {
        let resolved = (|| {
            Ok::<_, TicketingError>((
                required(&settings.server, "server")?,
                required(&settings.user, "user")?,
                required(&settings.password, "password")?,
                required(&settings.service_desk_id, "serviceDeskId")?,
                required(&settings.request_type_id, "requestTypeId")?,
                required(&settings.project, "project")?,
            ))
        })();

        let (server, user, password, service_desk_id, request_type_id, project) = match resolved {
            Ok(values) => values,
            Err(e) => {
                tracing::error!(
                    "Missing Jira configuration: server={}, user={}, password={}, serviceDeskId={}, requestTypeId={}, project={}",
                    settings.server.as_deref().unwrap_or(""),
                    settings.user.as_deref().unwrap_or(""),
                    redact(&settings.password),
                    settings.service_desk_id.as_deref().unwrap_or(""),
                    settings.request_type_id.as_deref().unwrap_or(""),
                    settings.project.as_deref().unwrap_or(""),
                );
                return Err(e);
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            user,
            password,
            service_desk_id,
            request_type_id,
            project,
            client,
        })
    }

    pub fn service_desk_id(&self) -> &str {
        &self.service_desk_id
    }

    pub fn request_type_id(&self) -> &str {
        &self.request_type_id
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    /// Look up an existing customer by email
    ///
    /// Returns `Ok(None)` without calling out when the email is empty or
    /// invalid, and when the search finds nobody.
    pub async fn find_customer(&self, email: &str) -> Result<Option<CustomerId>, TicketingError> {
        if !is_valid_email(email) {
            tracing::debug!("Skipping customer lookup for empty or invalid email");
            return Ok(None);
        }

        let url = format!(
            "{}/rest/servicedeskapi/servicedesk/projectKey:{}/customer",
            self.server, self.project
        );

        let response = self
            .authorized(self.client.get(&url))
            .header("X-ExperimentalApi", "opt-in")
            .query(&[("limit", "1"), ("query", email.trim())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Jira customer query callout failed: {}, email={}", e, email);
                TicketingError::RequestError(e)
            })?;

        let json = Self::read_json(response, "customer query", &format!("email={}", email)).await?;

        let size = json
            .get("size")
            .and_then(|s| s.as_u64())
            .ok_or_else(|| TicketingError::InvalidResponse("Missing size".into()))?;
        if size == 0 {
            tracing::debug!("No Jira customer found for {}", email);
            return Ok(None);
        }

        json.get("values")
            .and_then(|v| v.as_array())
            .and_then(|values| values.first())
            .and_then(|first| first.get("accountId"))
            .and_then(|id| id.as_str())
            .map(|id| Some(CustomerId(id.to_string())))
            .ok_or_else(|| TicketingError::InvalidResponse("Missing values[0].accountId".into()))
    }

    /// Create a new customer with the given email and display name
    pub async fn create_customer(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<CustomerId, TicketingError> {
        let url = format!("{}/rest/servicedeskapi/customer", self.server);
        let payload = serde_json::json!({
            "email": email,
            "displayName": display_name,
        });

        let response = self
            .authorized(self.client.post(&url))
            .header("X-ExperimentalApi", "opt-in")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Jira create customer callout failed: {}, email={}", e, email);
                TicketingError::RequestError(e)
            })?;

        let context = format!("email={}, name={}", email, display_name);
        let json = Self::read_json(response, "create customer", &context).await?;

        json.get("accountId")
            .and_then(|id| id.as_str())
            .map(|id| CustomerId(id.to_string()))
            .ok_or_else(|| TicketingError::InvalidResponse("Missing accountId".into()))
    }

    /// Open a service desk request. Returns the created request as sent
    /// back by Jira.
    pub async fn open_ticket(&self, issue: &TicketIssue) -> Result<Value, TicketingError> {
        let url = format!("{}/rest/servicedeskapi/request", self.server);
        let issue_json = serde_json::to_string(issue)
            .map_err(|e| TicketingError::InvalidResponse(format!("Failed to encode issue: {}", e)))?;

        let response = self
            .authorized(self.client.post(&url))
            .body(issue_json.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Jira open ticket callout failed: {}, issueData={}", e, issue_json);
                TicketingError::RequestError(e)
            })?;

        let json = Self::read_json(response, "open ticket", &format!("issueData={}", issue_json)).await?;

        tracing::info!(
            "Opened Jira request {}",
            json.get("issueKey").and_then(|k| k.as_str()).unwrap_or("<unknown>")
        );

        Ok(json)
    }

    async fn read_json(
        response: reqwest::Response,
        operation: &str,
        context: &str,
    ) -> Result<Value, TicketingError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());

        if !status.is_success() {
            tracing::error!("Jira {} callout returned {}: {}, {}", operation, status, body, context);
            return Err(TicketingError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Jira {} callout failed to parse JSON: {}", operation, body);
            TicketingError::InvalidResponse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_settings() -> JiraSettings {
        JiraSettings {
            server: Some("https://jira.test/".to_string()),
            user: Some("bot".to_string()),
            password: Some("hunter2".to_string()),
            service_desk_id: Some("4".to_string()),
            request_type_id: Some("47".to_string()),
            project: Some("KZ".to_string()),
            short_link_format: None,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = TicketingClient::from_settings(&complete_settings()).unwrap();
        assert_eq!(client.server, "https://jira.test");
        assert_eq!(client.service_desk_id(), "4");
        assert_eq!(client.request_type_id(), "47");
    }

    #[test]
    fn test_missing_password_is_rejected() {
        let mut settings = complete_settings();
        settings.password = Some(String::new());
        let err = TicketingClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, TicketingError::MissingConfig(ref f) if f == "password"));
    }

    #[test]
    fn test_missing_project_is_rejected() {
        let mut settings = complete_settings();
        settings.project = None;
        let err = TicketingClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, TicketingError::MissingConfig(ref f) if f == "project"));
    }

    #[test]
    fn test_empty_settings_are_rejected() {
        assert!(TicketingClient::from_settings(&JiraSettings::default()).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let client = TicketingClient::from_settings(&complete_settings()).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email(" user@example.com "));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn test_invalid_email_skips_lookup() {
        let client = TicketingClient::from_settings(&complete_settings()).unwrap();
        let result = client.find_customer("not-an-email").await.unwrap();
        assert!(result.is_none());
    }
}
