use crate::models::{FormSubmission, LoadFormResponse, ModalResponse};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving the modal dialog
#[derive(Debug, Error)]
pub enum ModalError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("dialog is not showing the form")]
    NotShowingForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Loading,
    Form,
    Confirmation,
    Closed,
}

/// State of one open change request dialog
///
/// Owned by whoever opened the dialog and passed by reference to the
/// loader; closing it drops all loaded content so a re-open starts fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogSession {
    article_id: Option<u64>,
    mode: DialogMode,
    pub title: String,
    pub html: String,
    pub config: Map<String, Value>,
    pub modules: Vec<String>,
    pub bottom_scripts: String,
    pub cancel_msg: String,
    pub finish_msg: String,
    pub error: Option<String>,
}

impl DialogSession {
    pub fn new(article_id: Option<u64>) -> Self {
        Self {
            article_id,
            mode: DialogMode::Loading,
            title: String::new(),
            html: String::new(),
            config: Map::new(),
            modules: Vec::new(),
            bottom_scripts: String::new(),
            cancel_msg: String::new(),
            finish_msg: String::new(),
            error: None,
        }
    }

    pub fn article_id(&self) -> Option<u64> {
        self.article_id
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != DialogMode::Closed
    }

    /// Splice an API response into the dialog
    pub fn apply(&mut self, response: ModalResponse) {
        match response {
            ModalResponse::Form(form) => self.show_form(form),
            ModalResponse::Confirmation(done) => {
                self.mode = DialogMode::Confirmation;
                self.title = done.title;
                self.html = done.html;
                self.finish_msg = done.finish_msg;
                self.error = None;
            }
            ModalResponse::Error(err) => {
                self.error = Some(err.error);
            }
        }
    }

    fn show_form(&mut self, form: LoadFormResponse) {
        self.mode = DialogMode::Form;
        self.title = form.title;
        self.html = form.html;
        // Config vars accumulate like the host's global config would
        self.config.extend(form.config);
        self.modules = form.modules;
        self.bottom_scripts = form.bottom_scripts;
        self.cancel_msg = form.cancel_msg;
        self.error = None;
    }

    pub fn close(&mut self) {
        let article_id = self.article_id;
        *self = Self::new(article_id);
        self.mode = DialogMode::Closed;
    }
}

/// Loads the form into a dialog and submits it through the internal API
pub struct ModalLoader {
    base_url: String,
    client: Client,
}

impl ModalLoader {
    pub fn new(base_url: String) -> Result<Self, ModalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetch the blank form for the session's article
    pub async fn open(&self, session: &mut DialogSession) -> Result<(), ModalError> {
        let url = format!("{}/api/v1/change-request/form", self.base_url);
        let mut query = vec![("modal", "1".to_string())];
        if let Some(id) = session.article_id() {
            query.push(("articleId", id.to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        session.apply(Self::decode(response).await?);
        Ok(())
    }

    /// Submit the dialog's form. The article id always comes from the session.
    pub async fn submit(
        &self,
        session: &mut DialogSession,
        fields: &FormSubmission,
    ) -> Result<(), ModalError> {
        if session.mode() != DialogMode::Form {
            return Err(ModalError::NotShowingForm);
        }

        let mut fields = fields.clone();
        fields.article_id = session.article_id().map(|id| id.to_string()).unwrap_or_default();
        fields.modal = "1".to_string();

        let url = format!("{}/api/v1/change-request/modal", self.base_url);
        let response = self.client.post(&url).form(&fields).send().await?;
        session.apply(Self::decode(response).await?);
        Ok(())
    }

    // Error payloads come with 4xx/5xx statuses; the body is still meaningful
    async fn decode(response: reqwest::Response) -> Result<ModalResponse, ModalError> {
        let status = response.status();
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Modal API returned unreadable body ({}): {}", status, body);
            ModalError::InvalidResponse(e.to_string())
        })
    }
}
