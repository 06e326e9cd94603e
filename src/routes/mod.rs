// Route exports
pub mod change_request;

use actix_web::{error, web, HttpRequest, HttpResponse};

use crate::models::ErrorResponse;

pub use change_request::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_extractors(cfg);
    cfg.service(
        web::scope("/api/v1")
            .configure(change_request::configure),
    )
    .configure(change_request::configure_pages);
}

/// Malformed JSON, query or form input is answered with an `ErrorResponse`
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .app_data(web::FormConfig::default().error_handler(handle_form_payload_error));
}

fn bad_request<E>(err: E, error: &str, message: String) -> error::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    });
    error::InternalError::from_response(err, response).into()
}

fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> error::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let message = format!("Invalid JSON: {}", err);
    bad_request(err, "invalid_json", message)
}

fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> error::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    let message = format!("Invalid query: {}", err);
    bad_request(err, "invalid_query", message)
}

fn handle_form_payload_error(err: error::UrlencodedError, req: &HttpRequest) -> error::Error {
    tracing::info!("Form payload error on {}: {}", req.path(), err);
    let message = format!("Invalid form data: {}", err);
    bad_request(err, "invalid_form", message)
}
