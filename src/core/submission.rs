use crate::config::MessageCatalog;
use crate::models::{ChangeRequest, FormSubmission, PageInfo, SubmitRequest, UNKNOWN_SCORE};
use crate::services::{
    is_valid_email, CaptchaError, CaptchaVerifier, PageDirectory, PageDirectoryError, TicketingClient,
    TicketingError,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// What to do when the CAPTCHA cannot be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptchaPolicy {
    /// Record the score as unknown (-1) and open the ticket anyway
    #[default]
    FailOpen,
    /// Reject the submission
    FailClosed,
}

/// Errors that end a submission attempt
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("request text is empty")]
    MissingRequestText,

    #[error("article {0:?} does not resolve to a page")]
    UnknownArticle(Option<u64>),

    #[error("page lookup failed: {0}")]
    PageLookup(#[from] PageDirectoryError),

    #[error("ticketing is not configured")]
    Configuration,

    #[error("CAPTCHA verification failed: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("ticketing failed: {0}")]
    Ticketing(#[from] TicketingError),
}

impl SubmissionError {
    /// The message shown to the user. Backend details never leak here.
    pub fn user_message<'a>(&self, messages: &'a MessageCatalog) -> &'a str {
        match self {
            SubmissionError::MissingRequestText => &messages.missing_request,
            SubmissionError::Captcha(_) => &messages.captcha_fail,
            _ => &messages.submission_error,
        }
    }
}

/// Form input for one submission, regardless of which surface it came from
#[derive(Debug, Clone, Default)]
pub struct SubmissionInput {
    pub article_id: Option<u64>,
    /// Title as the form knew it; the resolved page title wins when available
    pub page_title: String,
    pub request_text: String,
    pub contact_name: String,
    pub contact_email: String,
    pub recaptcha_token: String,
}

impl From<SubmitRequest> for SubmissionInput {
    fn from(req: SubmitRequest) -> Self {
        Self {
            article_id: Some(req.article_id),
            page_title: String::new(),
            request_text: req.request,
            contact_name: req.contact_name,
            contact_email: req.contact_email,
            recaptcha_token: req.recaptcha_token,
        }
    }
}

impl From<&FormSubmission> for SubmissionInput {
    fn from(form: &FormSubmission) -> Self {
        Self {
            article_id: form.article_id(),
            page_title: form.page_title.clone(),
            request_text: form.request.clone(),
            contact_name: form.contact_name.clone(),
            contact_email: form.contact_email.clone(),
            recaptcha_token: form.recaptcha_token.clone(),
        }
    }
}

/// Settings that shape every submission
#[derive(Debug, Clone, Default)]
pub struct SubmissionPolicy {
    pub captcha_policy: CaptchaPolicy,
    pub create_missing_customers: bool,
    pub content_language: String,
    pub short_link_format: Option<String>,
    pub fallback_email: Option<String>,
}

/// Collaborators shared by all submissions. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    pub pages: Arc<dyn PageDirectory>,
    pub captcha: Arc<CaptchaVerifier>,
    /// `None` when the Jira configuration is incomplete
    pub ticketing: Option<Arc<TicketingClient>>,
    pub policy: SubmissionPolicy,
    pub messages: Arc<MessageCatalog>,
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub ticket: Value,
    pub page_title: String,
    pub confirmation: String,
}

/// Where to send the request by hand when the submission fails
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackContact {
    pub email: String,
    pub mailto: String,
}

/// Runs one submission: Validate -> Enrich -> Submit
///
/// A handler is created per incoming request and dropped afterwards. The
/// ticket is opened at most once; there are no retries.
pub struct SubmissionHandler<'a> {
    pipeline: &'a Pipeline,
    submission_successful: bool,
    page_title: Option<String>,
}

impl<'a> SubmissionHandler<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self {
            pipeline,
            submission_successful: false,
            page_title: None,
        }
    }

    pub fn submission_successful(&self) -> bool {
        self.submission_successful
    }

    pub async fn handle(
        &mut self,
        input: SubmissionInput,
        client_ip: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let span = tracing::info_span!(
            "submission",
            id = %uuid::Uuid::new_v4(),
            article_id = ?input.article_id,
        );
        let result = self.run(input, client_ip).instrument(span).await;
        self.submission_successful = result.is_ok();
        result
    }

    async fn run(
        &mut self,
        input: SubmissionInput,
        client_ip: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        // Validate
        if input.request_text.trim().is_empty() {
            tracing::info!("Rejected submission without request text");
            return Err(SubmissionError::MissingRequestText);
        }

        let page = self.resolve_page(input.article_id).await?;
        self.page_title = Some(page.title.clone());

        let ticketing = self.pipeline.ticketing.as_deref().ok_or_else(|| {
            tracing::error!("Submission for article {} dropped: Jira is not configured", page.article_id);
            SubmissionError::Configuration
        })?;

        // Enrich
        let contact_email = Some(input.contact_email.trim())
            .filter(|email| is_valid_email(email))
            .map(str::to_string);
        if contact_email.is_none() && !input.contact_email.trim().is_empty() {
            tracing::info!("Ignoring invalid contact email");
        }

        let mut request = ChangeRequest {
            article_id: page.article_id,
            page_title: page.title.clone(),
            request_text: input.request_text,
            contact_name: input.contact_name.trim().to_string(),
            contact_email,
            categories: page.categories.iter().cloned().collect(),
            translated_languages: page.language_links.keys().cloned().collect(),
            content_area: page.content_area.clone(),
            content_language_name: language_name(&self.pipeline.policy.content_language).to_string(),
            recaptcha_score: UNKNOWN_SCORE,
            source_link: self
                .pipeline
                .policy
                .short_link_format
                .as_deref()
                .filter(|format| !format.is_empty())
                .map(|format| short_link(format, page.article_id, &self.pipeline.policy.content_language)),
        };

        // Submit
        request.recaptcha_score = match self
            .pipeline
            .captcha
            .verify(&input.recaptcha_token, client_ip)
            .await
        {
            Ok(score) => score,
            Err(e) => match self.pipeline.policy.captcha_policy {
                CaptchaPolicy::FailOpen => {
                    tracing::warn!("CAPTCHA unverified ({}), continuing with unknown score", e);
                    UNKNOWN_SCORE
                }
                CaptchaPolicy::FailClosed => {
                    tracing::info!("Rejected submission: {}", e);
                    return Err(SubmissionError::Captcha(e));
                }
            },
        };

        let customer = match request.contact_email.as_deref() {
            Some(email) => {
                let found = ticketing.find_customer(email).await?;
                match found {
                    None if self.pipeline.policy.create_missing_customers => {
                        let display_name = if request.contact_name.is_empty() {
                            email
                        } else {
                            request.contact_name.as_str()
                        };
                        Some(ticketing.create_customer(email, display_name).await?)
                    }
                    found => found,
                }
            }
            None => None,
        };

        let page_title = request.page_title.clone();
        let issue = request.into_issue(ticketing.service_desk_id(), ticketing.request_type_id(), customer);
        let ticket = ticketing.open_ticket(&issue).await?;

        tracing::info!("Change request for \"{}\" submitted", page_title);

        Ok(SubmissionReceipt {
            ticket,
            page_title,
            confirmation: self.pipeline.messages.confirmation.clone(),
        })
    }

    async fn resolve_page(&self, article_id: Option<u64>) -> Result<PageInfo, SubmissionError> {
        let Some(id) = article_id else {
            tracing::info!("Rejected submission without article id");
            return Err(SubmissionError::UnknownArticle(None));
        };

        match self.pipeline.pages.page_info(id).await {
            Ok(Some(page)) => Ok(page),
            Ok(None) => {
                tracing::info!("Rejected submission for unknown article {}", id);
                Err(SubmissionError::UnknownArticle(Some(id)))
            }
            Err(e) => {
                tracing::error!("Page lookup for article {} failed: {}", id, e);
                Err(SubmissionError::PageLookup(e))
            }
        }
    }

    /// Fallback email contact, offered for every failure except an empty
    /// request
    pub fn fallback(&self, error: &SubmissionError, input: &SubmissionInput) -> Option<FallbackContact> {
        let email = self
            .pipeline
            .policy
            .fallback_email
            .as_deref()
            .filter(|email| !email.is_empty())?;
        if matches!(error, SubmissionError::MissingRequestText) {
            return None;
        }

        let messages = &self.pipeline.messages;
        let page_title = self.page_title.as_deref().unwrap_or(&input.page_title);
        let subject = messages.fallback_email_title.replace("$1", page_title);

        Some(FallbackContact {
            email: email.to_string(),
            mailto: fallback_mailto(
                email,
                &subject,
                &messages.fallback_email_body,
                &input.request_text,
                &input.contact_name,
            ),
        })
    }

    /// User-facing failure text, with the `mailto:` fallback appended when
    /// configured
    pub fn failure_message(&self, error: &SubmissionError, input: &SubmissionInput) -> String {
        let messages = &self.pipeline.messages;
        let message = error.user_message(messages);

        match self.fallback(error, input) {
            Some(fallback) => format!("{} {} {}", message, messages.fallback_email, fallback.mailto),
            None => message.to_string(),
        }
    }
}

/// English name for the wiki's content language
pub fn language_name(code: &str) -> &'static str {
    match code {
        "ar" => "Arabic",
        "en" => "English",
        "he" => "Hebrew",
        "ru" => "Russian",
        _ => "Other",
    }
}

/// Substitute `$articleId` and `$lang` into the short link template
pub fn short_link(format: &str, article_id: u64, lang: &str) -> String {
    format
        .replace("$articleId", &article_id.to_string())
        .replace("$lang", lang)
}

/// `mailto:` link carrying the request so nothing typed is lost
pub fn fallback_mailto(email: &str, subject: &str, intro: &str, request_text: &str, contact_name: &str) -> String {
    let body = [intro, "", request_text, "", contact_name].join("\n");
    format!(
        "mailto:{}?subject={}&body={}",
        email,
        urlencoding::encode(subject),
        urlencoding::encode(&body)
    )
}
