use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::submission::CaptchaPolicy;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub recaptcha: RecaptchaSettings,
    #[serde(default)]
    pub jira: JiraSettings,
    #[serde(default)]
    pub submission: SubmissionSettings,
    #[serde(default)]
    pub wiki: WikiSettings,
    #[serde(default)]
    pub messages: MessageCatalog,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Public path of the full-page form, used for button links.
    #[serde(default = "default_form_path")]
    pub form_path: String,
    /// Take the client address from `Forwarded` / `X-Forwarded-For`.
    /// Only enable behind a proxy that sets these headers itself.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            form_path: default_form_path(),
            trust_proxy_headers: false,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_form_path() -> String { "/change-request".to_string() }

/// reCAPTCHA v3 settings. Both keys are optional at load time; a missing
/// secret only disables verification for the affected submissions.
#[derive(Debug, Clone, Deserialize)]
pub struct RecaptchaSettings {
    pub site_key: Option<String>,
    pub secret: Option<String>,
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

impl Default for RecaptchaSettings {
    fn default() -> Self {
        Self {
            site_key: None,
            secret: None,
            verify_url: default_verify_url(),
        }
    }
}

fn default_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

/// Jira Service Management API settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraSettings {
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub service_desk_id: Option<String>,
    pub request_type_id: Option<String>,
    /// Project key used by the customer search endpoint
    pub project: Option<String>,
    /// Template for the ticket's short link, e.g. `https://kz.org.il/$lang/?curid=$articleId`
    pub short_link_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionSettings {
    #[serde(default)]
    pub captcha_policy: CaptchaPolicy,
    /// Create a service desk customer when the email lookup finds none
    #[serde(default)]
    pub create_missing_customers: bool,
    /// Offered to users in error messages as a `mailto:` fallback
    pub fallback_email: Option<String>,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            captcha_policy: CaptchaPolicy::default(),
            create_missing_customers: false,
            fallback_email: None,
        }
    }
}

/// Where page metadata comes from
#[derive(Debug, Clone, Deserialize)]
pub struct WikiSettings {
    /// Content language code of the wiki (`he`, `ar`, ...)
    #[serde(default = "default_content_language")]
    pub content_language: String,
    /// MediaWiki action API endpoint, e.g. `https://www.kolzchut.org.il/w/api.php`
    pub api_url: Option<String>,
    /// TOML page catalog used when no API endpoint is configured
    pub pages_file: Option<String>,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            content_language: default_content_language(),
            api_url: None,
            pages_file: None,
        }
    }
}

fn default_content_language() -> String { "he".to_string() }

/// User-facing strings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageCatalog {
    pub title: String,
    pub intro_heading: String,
    pub intro_text: String,
    pub relevant_page: String,
    pub request_label: String,
    pub contact_intro_heading: String,
    pub contact_intro_text: String,
    pub contact_name: String,
    pub contact_email: String,
    pub notice: String,
    pub submit: String,
    pub cancel: String,
    pub finish: String,
    pub button_label: String,
    pub submission_error: String,
    pub captcha_fail: String,
    pub invalid_page: String,
    pub missing_request: String,
    pub load_error: String,
    pub confirmation: String,
    pub fallback_email: String,
    /// Subject of the fallback email; `$1` is the page title
    pub fallback_email_title: String,
    /// First line of the fallback email body
    pub fallback_email_body: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            title: "Change request".to_string(),
            intro_heading: "Found a mistake or something missing?".to_string(),
            intro_text: "Tell us what should be changed in this article.".to_string(),
            relevant_page: "Relevant page".to_string(),
            request_label: "What should be changed?".to_string(),
            contact_intro_heading: "How can we reach you?".to_string(),
            contact_intro_text: "We may contact you if we need more details.".to_string(),
            contact_name: "Name".to_string(),
            contact_email: "Email".to_string(),
            notice: "Please do not include sensitive personal information.".to_string(),
            submit: "Send".to_string(),
            cancel: "Cancel".to_string(),
            finish: "Close".to_string(),
            button_label: "Suggest a change".to_string(),
            submission_error: "Your request could not be sent. Please try again later.".to_string(),
            captcha_fail: "We could not verify that you are human. Please try again.".to_string(),
            invalid_page: "The page you are referring to could not be found.".to_string(),
            missing_request: "Please describe the change you are requesting.".to_string(),
            load_error: "The change request form could not be loaded.".to_string(),
            confirmation: "Thank you! Your request was received.".to_string(),
            fallback_email: "You can also email us at".to_string(),
            fallback_email_title: "Change request: $1".to_string(),
            fallback_email_body: "I tried to send this change request through the website:".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CRD_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CRD__JIRA__PASSWORD -> jira.password
            .add_source(
                Environment::with_prefix("CRD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
