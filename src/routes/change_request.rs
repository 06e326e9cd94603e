use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::core::{
    FormPresenter, FormState, Pipeline, RenderedForm, SubmissionError, SubmissionHandler, SubmissionInput,
};
use crate::models::{
    ApiErrorResponse, ConfirmationResponse, FormSubmission, HealthResponse, LoadFormQuery, ModalResponse,
    PageInfo, SubmitRequest, SubmitResponse,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub presenter: FormPresenter,
    /// Read the client address from proxy headers instead of the socket
    pub trust_proxy_headers: bool,
}

/// Internal API routes, mounted under `/api/v1`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/change-request", web::post().to(submit))
        .route("/change-request/form", web::get().to(load_form))
        .route("/change-request/modal", web::post().to(modal_submit));
}

/// Full-page form routes
pub fn configure_pages(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/change-request")
            .route(web::get().to(form_page))
            .route(web::post().to(form_page_submit)),
    );
}

/// Caller address without the port, for the CAPTCHA abuse signal
///
/// `Forwarded` / `X-Forwarded-For` are client-controlled unless a proxy
/// rewrites them, so they are only read when `trust_proxy_headers` is set.
fn client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let info = req.connection_info();
        let addr = info.realip_remote_addr().unwrap_or_default();
        return addr
            .parse::<std::net::SocketAddr>()
            .map(|a| a.ip().to_string())
            .unwrap_or_else(|_| addr.to_string());
    }

    req.peer_addr().map(|a| a.ip().to_string()).unwrap_or_default()
}

fn render_failed(state: &AppState, error: askama::Error) -> HttpResponse {
    tracing::error!("Failed to render change request markup: {}", error);
    HttpResponse::InternalServerError().json(ApiErrorResponse {
        error: state.presenter.messages().load_error.clone(),
    })
}

fn html_page(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

async fn lookup_page(state: &AppState, article_id: Option<u64>) -> Option<PageInfo> {
    let id = article_id?;
    match state.pipeline.pages.page_info(id).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to load page {} for form: {}", id, e);
            None
        }
    }
}

fn error_status(error: &SubmissionError) -> StatusCode {
    match error {
        SubmissionError::UnknownArticle(_) => StatusCode::NOT_FOUND,
        SubmissionError::MissingRequestText => StatusCode::BAD_REQUEST,
        SubmissionError::Captcha(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.pipeline.ticketing.is_some() { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Action API submission
///
/// POST /api/v1/change-request
///
/// Request body:
/// ```json
/// {
///   "articleId": 42,
///   "request": "string",
///   "contactName": "string",
///   "contactEmail": "string",
///   "g-recaptcha-response": "string"
/// }
/// ```
async fn submit(
    state: web::Data<AppState>,
    body: web::Json<SubmitRequest>,
    req: HttpRequest,
) -> impl Responder {
    let messages = state.presenter.messages();

    if let Err(errors) = body.validate() {
        tracing::info!("Validation failed for change request submission: {:?}", errors);
        let error = if errors.field_errors().contains_key("request") {
            messages.missing_request.clone()
        } else {
            messages.invalid_page.clone()
        };
        return HttpResponse::BadRequest().json(ApiErrorResponse { error });
    }

    let input = SubmissionInput::from(body.into_inner());
    let mut handler = SubmissionHandler::new(&state.pipeline);

    match handler.handle(input.clone(), &client_ip(&req, state.trust_proxy_headers)).await {
        Ok(_) => HttpResponse::Ok().json(SubmitResponse { success: 1 }),
        Err(e) => {
            tracing::info!("Change request submission failed: {}", e);
            HttpResponse::build(error_status(&e)).json(ApiErrorResponse {
                error: handler.failure_message(&e, &input),
            })
        }
    }
}

/// Load the blank form for the modal dialog
///
/// GET /api/v1/change-request/form?articleId={id}
async fn load_form(state: web::Data<AppState>, query: web::Query<LoadFormQuery>) -> impl Responder {
    let messages = state.presenter.messages();

    let Some(page) = lookup_page(&state, query.article_id).await else {
        tracing::info!("Form requested for unknown article {:?}", query.article_id);
        return HttpResponse::NotFound().json(ApiErrorResponse {
            error: messages.load_error.clone(),
        });
    };

    let form = FormState::for_page(Some(page.article_id), page.title, true);
    match state.presenter.modal_payload(&form) {
        Ok(payload) => HttpResponse::Ok().json(payload),
        Err(e) => render_failed(&state, e),
    }
}

/// Submit the form from within the modal dialog
///
/// POST /api/v1/change-request/modal
///
/// Returns the confirmation on success, or the form again with the error.
async fn modal_submit(
    state: web::Data<AppState>,
    form: web::Form<FormSubmission>,
    req: HttpRequest,
) -> impl Responder {
    let presenter = &state.presenter;
    let input = SubmissionInput::from(&*form);
    let mut handler = SubmissionHandler::new(&state.pipeline);

    let response = match handler.handle(input.clone(), &client_ip(&req, state.trust_proxy_headers)).await {
        Ok(_) => presenter.confirmation_html().map(|html| {
            ModalResponse::Confirmation(ConfirmationResponse {
                title: presenter.messages().title.clone(),
                html,
                finish_msg: presenter.messages().finish.clone(),
            })
        }),
        Err(e) => {
            tracing::info!("Modal change request submission failed: {}", e);
            let mut redisplay = redisplay_state(&handler, &e, &form, &input, presenter);
            redisplay.modal = true;
            presenter.modal_payload(&redisplay).map(ModalResponse::Form)
        }
    };

    match response {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => render_failed(&state, e),
    }
}

/// The submitted form again, with the error and the fallback contact
fn redisplay_state(
    handler: &SubmissionHandler<'_>,
    error: &SubmissionError,
    form: &FormSubmission,
    input: &SubmissionInput,
    presenter: &FormPresenter,
) -> FormState {
    let message = error.user_message(presenter.messages()).to_string();
    let mut state = FormState::from_submission(form, Some(message));
    state.fallback = handler.fallback(error, input);
    state
}

/// Full-page form
///
/// GET /change-request?articleId={id}
async fn form_page(state: web::Data<AppState>, query: web::Query<LoadFormQuery>) -> impl Responder {
    let presenter = &state.presenter;
    let page = lookup_page(&state, query.article_id).await;

    if query.article_id.is_some() && page.is_none() {
        let not_found = presenter.assets(false).and_then(|assets| {
            let body = presenter.error_box(&presenter.messages().invalid_page, None)?;
            presenter.page(&body, &assets)
        });
        return match not_found {
            Ok(html) => html_page(StatusCode::NOT_FOUND, html),
            Err(e) => render_failed(&state, e),
        };
    }

    let (article_id, title) = page
        .map(|p| (Some(p.article_id), p.title))
        .unwrap_or_default();
    let modal = query.modal.as_deref().is_some_and(|m| !m.is_empty());

    let html = presenter
        .render(&FormState::for_page(article_id, title, modal))
        .and_then(|rendered| presenter.page(&rendered.html, &rendered.assets));
    match html {
        Ok(html) => html_page(StatusCode::OK, html),
        Err(e) => render_failed(&state, e),
    }
}

/// Full-page form submission
///
/// POST /change-request
async fn form_page_submit(
    state: web::Data<AppState>,
    form: web::Form<FormSubmission>,
    req: HttpRequest,
) -> impl Responder {
    let presenter = &state.presenter;
    let input = SubmissionInput::from(&*form);
    let mut handler = SubmissionHandler::new(&state.pipeline);

    let rendered = match handler.handle(input.clone(), &client_ip(&req, state.trust_proxy_headers)).await {
        Ok(_) => presenter.confirmation_html().and_then(|html| {
            Ok(RenderedForm {
                html,
                assets: presenter.assets(false)?,
            })
        }),
        Err(e) => {
            tracing::info!("Change request form submission failed: {}", e);
            presenter.render(&redisplay_state(&handler, &e, &form, &input, presenter))
        }
    };

    match rendered.and_then(|r| presenter.page(&r.html, &r.assets)) {
        Ok(html) => html_page(StatusCode::OK, html),
        Err(e) => render_failed(&state, e),
    }
}
