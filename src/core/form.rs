use crate::config::MessageCatalog;
use crate::core::submission::FallbackContact;
use crate::models::{FormSubmission, LoadFormResponse};
use askama::Template;
use serde_json::{Map, Value};
use std::sync::Arc;

/// DOM id of the rendered form; the dialog scripts look for it
pub const FORM_ID: &str = "kzcrChangeRequestForm";

/// Client modules the form needs, beyond the extension's own
const FORM_STYLE_MODULES: [&str; 3] = [
    "mediawiki.widgets.styles",
    "oojs-ui.styles.indicators",
    "mediawiki.htmlform.ooui.styles",
];

/// One field of the change request form
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        name: &'static str,
        label: String,
        value: String,
        css_class: &'static str,
    },
    Email {
        name: &'static str,
        label: String,
        value: String,
        css_class: &'static str,
    },
    Textarea {
        name: &'static str,
        label: String,
        value: String,
        rows: u8,
        required: bool,
    },
    Hidden {
        name: &'static str,
        value: String,
    },
    /// Static text block, optionally labelled and headed
    Info {
        name: &'static str,
        label: Option<String>,
        heading: Option<String>,
        text: String,
        css_class: &'static str,
    },
}

#[derive(Template)]
#[template(
    source = r#"<div class="kzcr-field {{ css_class }}"><label for="{{ name }}">{{ label }}</label><input type="{{ input_type }}" id="{{ name }}" name="wp{{ name }}" value="{{ value }}"></div>"#,
    ext = "html"
)]
struct InputTemplate<'a> {
    input_type: &'a str,
    name: &'a str,
    label: &'a str,
    value: &'a str,
    css_class: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div class="kzcr-field"><label for="{{ name }}">{{ label }}</label><textarea id="{{ name }}" name="wp{{ name }}" rows="{{ rows }}"{% if required %} required{% endif %}>{{ value }}</textarea></div>"#,
    ext = "html"
)]
struct TextareaTemplate<'a> {
    name: &'a str,
    label: &'a str,
    value: &'a str,
    rows: u8,
    required: bool,
}

#[derive(Template)]
#[template(source = r#"<input type="hidden" name="wp{{ name }}" value="{{ value }}">"#, ext = "html")]
struct HiddenTemplate<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div class="kzcr-info {{ css_class }}">{% match label %}{% when Some with (label_text) %}<label>{{ label_text }}</label>{% when None %}{% endmatch %}{% match heading %}{% when Some with (heading_text) %}<h4>{{ heading_text }}</h4>{% when None %}{% endmatch %}<p>{{ text }}</p></div>"#,
    ext = "html"
)]
struct InfoTemplate<'a> {
    label: Option<&'a str>,
    heading: Option<&'a str>,
    text: &'a str,
    css_class: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div class="errorbox kzcr-error">{{ message }}</div>{% match fallback %}{% when Some with (contact) %}<div class="kzcr-fallback">{{ fallback_message }} <a href="{{ contact.mailto }}">{{ contact.email }}</a></div>{% when None %}{% endmatch %}"#,
    ext = "html"
)]
struct ErrorBoxTemplate<'a> {
    message: &'a str,
    fallback: Option<&'a FallbackContact>,
    fallback_message: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<form id="{{ form_id }}" method="post" action="{{ action }}" class="kzcr-form">
<input type="hidden" name="wpFormIdentifier" value="{{ form_id }}">
{{ error_box|safe }}
{% for field in fields %}{{ field|safe }}
{% endfor %}<button type="submit" id="kzcrButton">{{ submit }}</button>
</form>"#,
    ext = "html"
)]
struct FormTemplate<'a> {
    form_id: &'a str,
    action: &'a str,
    error_box: String,
    fields: Vec<String>,
    submit: &'a str,
}

#[derive(Template)]
#[template(source = r#"<p class="kzcr-confirmation">{{ message }}</p>"#, ext = "html")]
struct ConfirmationTemplate<'a> {
    message: &'a str,
}

#[derive(Template)]
#[template(source = r#"<a class="btn ranking-btn changerequest" href="{{ href }}">{{ label }}</a>"#, ext = "html")]
struct ButtonTemplate<'a> {
    href: &'a str,
    label: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<script src="https://www.google.com/recaptcha/api.js?onload=onLoadRecaptcha&amp;render={{ site_key }}" async defer></script>"#,
    ext = "html"
)]
struct RecaptchaScriptTemplate<'a> {
    site_key: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
    <script>window.kzcrConfig = {{ config|safe }};</script>
  </head>
  <body>
    <main class="kzcr-page">
      <h1>{{ title }}</h1>
      {{ body|safe }}
    </main>
    {% for script in scripts %}{{ script|safe }}
    {% endfor %}
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    title: &'a str,
    /// Serialized JSON with `</` already neutralized
    config: String,
    body: &'a str,
    scripts: &'a [String],
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Text { name, .. }
            | FormField::Email { name, .. }
            | FormField::Textarea { name, .. }
            | FormField::Hidden { name, .. }
            | FormField::Info { name, .. } => name,
        }
    }

    fn render(&self) -> askama::Result<String> {
        match self {
            FormField::Text { name, label, value, css_class } => InputTemplate {
                input_type: "text",
                name,
                label,
                value,
                css_class,
            }
            .render(),
            FormField::Email { name, label, value, css_class } => InputTemplate {
                input_type: "email",
                name,
                label,
                value,
                css_class,
            }
            .render(),
            FormField::Textarea { name, label, value, rows, required } => TextareaTemplate {
                name,
                label,
                value,
                rows: *rows,
                required: *required,
            }
            .render(),
            FormField::Hidden { name, value } => HiddenTemplate { name, value }.render(),
            FormField::Info { label, heading, text, css_class, .. } => InfoTemplate {
                label: label.as_deref(),
                heading: heading.as_deref(),
                text,
                css_class,
            }
            .render(),
        }
    }
}

/// What the form is rendered with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub article_id: Option<u64>,
    pub page_title: String,
    pub request: String,
    pub contact_name: String,
    pub contact_email: String,
    pub modal: bool,
    pub error: Option<String>,
    pub fallback: Option<FallbackContact>,
}

impl FormState {
    pub fn for_page(article_id: Option<u64>, page_title: impl Into<String>, modal: bool) -> Self {
        Self {
            article_id,
            page_title: page_title.into(),
            modal,
            ..Default::default()
        }
    }

    /// Re-display a submitted form, keeping what the user typed
    pub fn from_submission(form: &FormSubmission, error: Option<String>) -> Self {
        Self {
            article_id: form.article_id(),
            page_title: form.page_title.clone(),
            request: form.request.clone(),
            contact_name: form.contact_name.clone(),
            contact_email: form.contact_email.clone(),
            modal: form.is_modal(),
            error,
            fallback: None,
        }
    }
}

/// Client assets the host page must attach for the form to work
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetRequirements {
    pub modules: Vec<String>,
    pub config: Map<String, Value>,
    pub bottom_scripts: Vec<String>,
}

/// Rendered form markup plus its asset requirements
#[derive(Debug, Clone)]
pub struct RenderedForm {
    pub html: String,
    pub assets: AssetRequirements,
}

/// Builds and renders the change request form
#[derive(Debug, Clone)]
pub struct FormPresenter {
    messages: Arc<MessageCatalog>,
    site_key: Option<String>,
    form_path: String,
}

impl FormPresenter {
    pub fn new(messages: Arc<MessageCatalog>, site_key: Option<String>, form_path: String) -> Self {
        Self {
            messages,
            site_key: site_key.filter(|k| !k.is_empty()),
            form_path,
        }
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// Field schema, in display order
    pub fn schema(&self, state: &FormState) -> Vec<FormField> {
        let m = &self.messages;
        let mut fields = vec![
            FormField::Info {
                name: "kzcrIntro",
                label: None,
                heading: Some(m.intro_heading.clone()),
                text: m.intro_text.clone(),
                css_class: "kzcr-intro",
            },
            FormField::Info {
                name: "kzcrPageTitleInfo",
                label: Some(m.relevant_page.clone()),
                heading: None,
                text: state.page_title.clone(),
                css_class: "kzcr-page-title",
            },
            FormField::Hidden {
                name: "kzcrPageTitle",
                value: state.page_title.clone(),
            },
            FormField::Hidden {
                name: "kzcrArticleId",
                value: state.article_id.map(|id| id.to_string()).unwrap_or_default(),
            },
            FormField::Textarea {
                name: "kzcrRequest",
                label: m.request_label.clone(),
                value: state.request.clone(),
                rows: 4,
                required: true,
            },
            FormField::Info {
                name: "kzcrContactIntro",
                label: None,
                heading: Some(m.contact_intro_heading.clone()),
                text: m.contact_intro_text.clone(),
                css_class: "kzcr-contact-intro",
            },
            FormField::Text {
                name: "kzcrContactName",
                label: m.contact_name.clone(),
                value: state.contact_name.clone(),
                css_class: "kzcr-name",
            },
            FormField::Email {
                name: "kzcrContactEmail",
                label: m.contact_email.clone(),
                value: state.contact_email.clone(),
                css_class: "kzcr-email",
            },
            FormField::Info {
                name: "kzcrNotice",
                label: None,
                heading: None,
                text: m.notice.clone(),
                css_class: "kzcr-notice",
            },
        ];

        if state.modal {
            fields.push(FormField::Hidden {
                name: "kzcrModal",
                value: "1".to_string(),
            });
        }

        fields
    }

    /// Assets for the form. Without a site key the reCAPTCHA script is left
    /// out and submissions will carry no token.
    pub fn assets(&self, modal: bool) -> askama::Result<AssetRequirements> {
        let mut modules = vec!["ext.KZChangeRequest".to_string()];
        if modal {
            modules.push("ext.KZChangeRequest.modal".to_string());
        }
        modules.extend(FORM_STYLE_MODULES.iter().map(|m| m.to_string()));

        let mut config = Map::new();
        let mut bottom_scripts = Vec::new();

        match self.site_key.as_deref() {
            Some(key) => {
                config.insert("reCaptchaV3SiteKey".to_string(), Value::String(key.to_string()));
                bottom_scripts.push(RecaptchaScriptTemplate { site_key: key }.render()?);
            }
            None => tracing::warn!("Missing reCAPTCHA site key configuration"),
        }

        Ok(AssetRequirements {
            modules,
            config,
            bottom_scripts,
        })
    }

    /// Error box, followed by the fallback email link when there is one
    pub fn error_box(&self, message: &str, fallback: Option<&FallbackContact>) -> askama::Result<String> {
        ErrorBoxTemplate {
            message,
            fallback,
            fallback_message: &self.messages.fallback_email,
        }
        .render()
    }

    pub fn render(&self, state: &FormState) -> askama::Result<RenderedForm> {
        let error_box = match &state.error {
            Some(error) => self.error_box(error, state.fallback.as_ref())?,
            None => String::new(),
        };

        let fields = self
            .schema(state)
            .iter()
            .map(FormField::render)
            .collect::<askama::Result<Vec<_>>>()?;

        let html = FormTemplate {
            form_id: FORM_ID,
            action: &self.form_path,
            error_box,
            fields,
            submit: &self.messages.submit,
        }
        .render()?;

        Ok(RenderedForm {
            html,
            assets: self.assets(state.modal)?,
        })
    }

    /// Payload for the modal loader
    pub fn modal_payload(&self, state: &FormState) -> askama::Result<LoadFormResponse> {
        let rendered = self.render(state)?;
        Ok(LoadFormResponse {
            title: self.messages.title.clone(),
            html: rendered.html,
            config: rendered.assets.config,
            modules: rendered.assets.modules,
            bottom_scripts: rendered.assets.bottom_scripts.join("\n"),
            cancel_msg: self.messages.cancel.clone(),
        })
    }

    pub fn confirmation_html(&self) -> askama::Result<String> {
        ConfirmationTemplate {
            message: &self.messages.confirmation,
        }
        .render()
    }

    /// Link that opens the form for an article
    pub fn button(&self, article_id: Option<u64>) -> askama::Result<String> {
        let href = match article_id {
            Some(id) => format!("{}?articleId={}", self.form_path, id),
            None => self.form_path.clone(),
        };
        ButtonTemplate {
            href: &href,
            label: &self.messages.button_label,
        }
        .render()
    }

    /// Standalone HTML document for the full-page mode
    pub fn page(&self, body: &str, assets: &AssetRequirements) -> askama::Result<String> {
        let config = serde_json::to_string(&assets.config).unwrap_or_else(|_| "{}".to_string());
        PageTemplate {
            title: &self.messages.title,
            config: config.replace("</", "<\\/"),
            body,
            scripts: &assets.bottom_scripts,
        }
        .render()
    }
}
