//! Change Request Desk - change request intake for wiki articles
//!
//! Readers submit a change request for an article; the submission is
//! checked with reCAPTCHA v3 and opened as a Jira Service Management
//! request. The form is served as a full page or loaded into a modal.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::Settings;
use crate::core::{FormPresenter, Pipeline, SubmissionPolicy};
use crate::routes::AppState;
use crate::services::{
    CaptchaError, CaptchaVerifier, PageDirectory, PageDirectoryError, StaticPageDirectory, TicketingClient,
    WikiApiPageDirectory,
};

// Re-export commonly used types
pub use crate::core::{CaptchaPolicy, SubmissionError, SubmissionHandler, SubmissionInput};
pub use crate::models::{ChangeRequest, PageInfo, TicketIssue};

/// Errors that prevent the service from starting
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("page directory: {0}")]
    Pages(#[from] PageDirectoryError),

    #[error("reCAPTCHA client: {0}")]
    Captcha(#[from] CaptchaError),
}

/// Build the page directory the settings ask for: the wiki API when an
/// endpoint is configured, otherwise the static catalog (possibly empty).
pub fn page_directory(settings: &Settings) -> Result<Arc<dyn PageDirectory>, PageDirectoryError> {
    if let Some(api_url) = settings.wiki.api_url.as_deref().filter(|u| !u.is_empty()) {
        tracing::info!("Resolving pages through wiki API at {}", api_url);
        return Ok(Arc::new(WikiApiPageDirectory::new(api_url.to_string())?));
    }

    match settings.wiki.pages_file.as_deref() {
        Some(path) => {
            let directory = StaticPageDirectory::load(path)?;
            tracing::info!("Loaded {} pages from {}", directory.len(), path);
            Ok(Arc::new(directory))
        }
        None => {
            tracing::warn!("No wiki API or page catalog configured; every article will be unknown");
            Ok(Arc::new(StaticPageDirectory::default()))
        }
    }
}

/// Wire settings and a page directory into the shared application state
pub fn build_state(settings: &Settings, pages: Arc<dyn PageDirectory>) -> Result<AppState, StartupError> {
    let messages = Arc::new(settings.messages.clone());

    let captcha = Arc::new(CaptchaVerifier::new(
        settings.recaptcha.verify_url.clone(),
        settings.recaptcha.secret.clone(),
    )?);

    // Incomplete Jira settings are not fatal; submissions fail until fixed
    let ticketing = TicketingClient::from_settings(&settings.jira).ok().map(Arc::new);

    let policy = SubmissionPolicy {
        captcha_policy: settings.submission.captcha_policy,
        create_missing_customers: settings.submission.create_missing_customers,
        content_language: settings.wiki.content_language.clone(),
        short_link_format: settings.jira.short_link_format.clone(),
        fallback_email: settings.submission.fallback_email.clone(),
    };

    let presenter = FormPresenter::new(
        messages.clone(),
        settings.recaptcha.site_key.clone(),
        settings.server.form_path.clone(),
    );

    Ok(AppState {
        pipeline: Pipeline {
            pages,
            captcha,
            ticketing,
            policy,
            messages,
        },
        presenter,
        trust_proxy_headers: settings.server.trust_proxy_headers,
    })
}
