// HTTP surface tests: action API, modal API, full-page form

mod common;

use actix_web::{http::StatusCode, test, web, App};
use change_request_desk::routes;
use common::*;
use mockito::Matcher;
use serde_json::{json, Value};

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn peer() -> std::net::SocketAddr {
    "203.0.113.7:40000".parse().unwrap()
}

#[actix_web::test]
async fn test_health_reports_missing_jira() {
    let mut settings = settings("http://127.0.0.1:9");
    settings.jira = Default::default();
    let app = app!(state(&settings));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");

    let app = app!(state(&common::settings("http://127.0.0.1:9")));
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_load_form_payload() {
    let app = app!(state(&settings("http://127.0.0.1:9")));

    let req = test::TestRequest::get()
        .uri("/api/v1/change-request/form?articleId=42")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["title"], "Change request");
    assert_eq!(body["cancelMsg"], "Cancel");
    assert_eq!(body["config"]["reCaptchaV3SiteKey"], "site-key");
    let html = body["html"].as_str().unwrap();
    assert!(html.contains("kzcrChangeRequestForm"));
    assert!(html.contains("Housing Rights"));
    assert!(html.contains(r#"name="wpkzcrModal" value="1""#));
    assert!(body["modules"]
        .as_array()
        .unwrap()
        .contains(&json!("ext.KZChangeRequest.modal")));
    assert!(body["bottomScripts"].as_str().unwrap().contains("render=site-key"));
}

#[actix_web::test]
async fn test_load_form_unknown_article() {
    let app = app!(state(&settings("http://127.0.0.1:9")));

    let req = test::TestRequest::get()
        .uri("/api/v1/change-request/form?articleId=999")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_action_api_submit_success() {
    let mut server = mockito::Server::new_async().await;
    let captcha = captcha_ok(&mut server, 0.9).await;
    let _lookup = no_customer(&mut server).await;
    let (ticket, _captured) = ticket_capture(&mut server).await;

    let app = app!(state(&settings(&server.url())));
    let req = test::TestRequest::post()
        .uri("/api/v1/change-request")
        .peer_addr(peer())
        .set_json(json!({
            "articleId": 42,
            "request": "Please update the eligibility section",
            "contactName": "Dana",
            "contactEmail": "user@example.com",
            "g-recaptcha-response": "token-abc"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "success": 1 }));
    captcha.assert_async().await;
    ticket.assert_async().await;
}

#[actix_web::test]
async fn test_action_api_rejects_empty_request() {
    let mut server = mockito::Server::new_async().await;
    let guards = no_calls(&mut server).await;

    let app = app!(state(&settings(&server.url())));
    let req = test::TestRequest::post()
        .uri("/api/v1/change-request")
        .set_json(json!({
            "articleId": 42,
            "request": "",
            "g-recaptcha-response": "token-abc"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Please describe the change you are requesting.");

    for guard in guards {
        guard.assert_async().await;
    }
}

#[actix_web::test]
async fn test_action_api_unknown_article() {
    let app = app!(state(&settings("http://127.0.0.1:9")));
    let req = test::TestRequest::post()
        .uri("/api/v1/change-request")
        .set_json(json!({
            "articleId": 999,
            "request": "Fix it",
            "g-recaptcha-response": "token-abc"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_modal_submit_confirmation() {
    let mut server = mockito::Server::new_async().await;
    let _captcha = captcha_ok(&mut server, 0.9).await;
    let _lookup = no_customer(&mut server).await;
    let (ticket, _captured) = ticket_capture(&mut server).await;

    let app = app!(state(&settings(&server.url())));
    let req = test::TestRequest::post()
        .uri("/api/v1/change-request/modal")
        .peer_addr(peer())
        .set_form([
            ("wpkzcrArticleId", "42"),
            ("wpkzcrPageTitle", "Housing Rights"),
            ("wpkzcrRequest", "Please update the eligibility section"),
            ("wpkzcrContactName", "Dana"),
            ("wpkzcrContactEmail", "user@example.com"),
            ("wpkzcrModal", "1"),
            ("g-recaptcha-response", "token-abc"),
        ])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["finishMsg"], "Close");
    assert!(body["html"].as_str().unwrap().contains("kzcr-confirmation"));
    ticket.assert_async().await;
}

#[actix_web::test]
async fn test_modal_submit_failure_redisplays_form() {
    let mut settings = settings("http://127.0.0.1:9");
    settings.jira = Default::default();
    let app = app!(state(&settings));

    let req = test::TestRequest::post()
        .uri("/api/v1/change-request/modal")
        .set_form([
            ("wpkzcrArticleId", "42"),
            ("wpkzcrPageTitle", "Housing Rights"),
            ("wpkzcrRequest", "Keep <this> text"),
            ("wpkzcrModal", "1"),
        ])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["cancelMsg"], "Cancel");
    let html = body["html"].as_str().unwrap();
    assert!(html.contains("errorbox"));
    assert!(html.contains("Your request could not be sent."));
    assert!(html.contains("Keep &lt;this&gt; text"));
}

#[actix_web::test]
async fn test_full_page_form_roundtrip() {
    let mut server = mockito::Server::new_async().await;
    let _captcha = captcha_ok(&mut server, 0.9).await;
    let _lookup = no_customer(&mut server).await;
    let (_ticket, captured) = ticket_capture(&mut server).await;

    let app = app!(state(&settings(&server.url())));

    let req = test::TestRequest::get().uri("/change-request?articleId=42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Housing Rights"));
    assert!(!html.contains("wpkzcrModal"));

    let req = test::TestRequest::post()
        .uri("/change-request")
        .peer_addr(peer())
        .set_form([
            ("wpkzcrArticleId", "42"),
            ("wpkzcrPageTitle", "Housing Rights"),
            ("wpkzcrRequest", "Please update the eligibility section"),
            ("wpkzcrContactEmail", "user@example.com"),
            ("g-recaptcha-response", "token-abc"),
        ])
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("kzcr-confirmation"));
    assert!(!html.contains("kzcrChangeRequestForm"));
    assert!(captured.lock().unwrap().is_some());
}

#[actix_web::test]
async fn test_full_page_unknown_article() {
    let app = app!(state(&settings("http://127.0.0.1:9")));
    let req = test::TestRequest::get().uri("/change-request?articleId=999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_health_reports_missing_project_key() {
    let mut settings = settings("http://127.0.0.1:9");
    settings.jira.project = None;
    let app = app!(state(&settings));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");
}

#[actix_web::test]
async fn test_malformed_json_gets_error_body() {
    let app = app!(state(&settings("http://127.0.0.1:9")));
    let req = test::TestRequest::post()
        .uri("/api/v1/change-request")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
    assert_eq!(body["status_code"], 400);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[actix_web::test]
async fn test_modal_failure_offers_fallback_email() {
    let mut settings = settings("http://127.0.0.1:9");
    settings.jira = Default::default();
    settings.submission.fallback_email = Some("desk@kz.test".to_string());
    let app = app!(state(&settings));

    let req = test::TestRequest::post()
        .uri("/api/v1/change-request/modal")
        .set_form([
            ("wpkzcrArticleId", "42"),
            ("wpkzcrPageTitle", "Housing Rights"),
            ("wpkzcrRequest", "Fix the table"),
            ("wpkzcrModal", "1"),
        ])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let html = body["html"].as_str().unwrap();
    assert!(html.contains(r#"<div class="errorbox kzcr-error">Your request could not be sent. Please try again later.</div>"#));
    assert!(html.contains("kzcr-fallback"));
    assert!(html.contains(r#"href="mailto:desk@kz.test?subject=Change%20request%3A%20Housing%20Rights&amp;body="#));
    assert!(html.contains(">desk@kz.test</a>"));
}

#[actix_web::test]
async fn test_forwarded_for_is_not_trusted_by_default() {
    let mut server = mockito::Server::new_async().await;
    let captcha = server
        .mock("POST", VERIFY_PATH)
        .match_body(Matcher::UrlEncoded("remoteip".into(), "203.0.113.7".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"score":0.9}"#)
        .expect(1)
        .create_async()
        .await;
    let _lookup = no_customer(&mut server).await;
    let (_ticket, _captured) = ticket_capture(&mut server).await;

    let app = app!(state(&settings(&server.url())));
    let req = test::TestRequest::post()
        .uri("/api/v1/change-request")
        .peer_addr(peer())
        .insert_header(("x-forwarded-for", "198.51.100.1"))
        .set_json(json!({
            "articleId": 42,
            "request": "Please update the eligibility section",
            "contactEmail": "user@example.com",
            "g-recaptcha-response": "token-abc"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "success": 1 }));
    captcha.assert_async().await;
}
