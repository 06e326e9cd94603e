// Shared fixtures for integration tests
#![allow(dead_code)]

use change_request_desk::config::{JiraSettings, Settings};
use change_request_desk::core::Pipeline;
use change_request_desk::models::PageInfo;
use change_request_desk::routes::AppState;
use change_request_desk::services::StaticPageDirectory;
use change_request_desk::{build_state, SubmissionInput};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const CLIENT_IP: &str = "203.0.113.7";
pub const CUSTOMER_PATH: &str = "/rest/servicedeskapi/servicedesk/projectKey:KZ/customer";
pub const CREATE_CUSTOMER_PATH: &str = "/rest/servicedeskapi/customer";
pub const REQUEST_PATH: &str = "/rest/servicedeskapi/request";
pub const VERIFY_PATH: &str = "/siteverify";
pub const WIKI_API_PATH: &str = "/w/api.php";
/// `bot:hunter2`
pub const BASIC_AUTH: &str = "Basic Ym90Omh1bnRlcjI=";

pub fn housing_rights() -> PageInfo {
    let mut language_links = BTreeMap::new();
    language_links.insert("ar".to_string(), "حقوق السكن".to_string());
    PageInfo {
        article_id: 42,
        title: "Housing Rights".to_string(),
        categories: vec!["Benefits".to_string(), "Housing".to_string()],
        language_links,
        content_area: None,
    }
}

pub fn pages() -> StaticPageDirectory {
    StaticPageDirectory::new(vec![housing_rights()])
}

/// Settings with every remote endpoint pointed at the mock server
pub fn settings(server_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.recaptcha.verify_url = format!("{}{}", server_url, VERIFY_PATH);
    settings.recaptcha.secret = Some("s3cret".to_string());
    settings.recaptcha.site_key = Some("site-key".to_string());
    settings.jira = JiraSettings {
        server: Some(server_url.to_string()),
        user: Some("bot".to_string()),
        password: Some("hunter2".to_string()),
        service_desk_id: Some("4".to_string()),
        request_type_id: Some("47".to_string()),
        project: Some("KZ".to_string()),
        short_link_format: None,
    };
    settings
}

pub fn state(settings: &Settings) -> AppState {
    build_state(settings, Arc::new(pages())).unwrap()
}

pub fn pipeline(settings: &Settings) -> Pipeline {
    state(settings).pipeline
}

pub fn input(article_id: u64, email: &str) -> SubmissionInput {
    SubmissionInput {
        article_id: Some(article_id),
        page_title: String::new(),
        request_text: "Please update the eligibility section".to_string(),
        contact_name: "Dana".to_string(),
        contact_email: email.to_string(),
        recaptcha_token: "token-abc".to_string(),
    }
}

pub async fn captcha_ok(server: &mut ServerGuard, score: f64) -> Mock {
    server
        .mock("POST", VERIFY_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("response".into(), "token-abc".into()),
            Matcher::UrlEncoded("secret".into(), "s3cret".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"success":true,"score":{}}}"#, score))
        .create_async()
        .await
}

pub async fn no_customer(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", CUSTOMER_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "1".into()),
            Matcher::UrlEncoded("query".into(), "user@example.com".into()),
        ]))
        .match_header("x-experimentalapi", "opt-in")
        .match_header("authorization", BASIC_AUTH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"size":0,"start":0,"limit":1,"isLastPage":true,"values":[]}"#)
        .create_async()
        .await
}

/// Ticket endpoint that records the JSON body it received
pub async fn ticket_capture(server: &mut ServerGuard) -> (Mock, Arc<Mutex<Option<Value>>>) {
    let captured = Arc::new(Mutex::new(None));
    let sink = captured.clone();
    let mock = server
        .mock("POST", REQUEST_PATH)
        .match_header("authorization", BASIC_AUTH)
        .match_header("content-type", "application/json")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body_from_request(move |req| {
            let body: Value = serde_json::from_slice(req.body().unwrap()).unwrap();
            *sink.lock().unwrap() = Some(body);
            br#"{"issueId":"10010","issueKey":"KZ-101"}"#.to_vec()
        })
        .create_async()
        .await;
    (mock, captured)
}

/// Fails the test if anything reaches the server
pub async fn no_calls(server: &mut ServerGuard) -> Vec<Mock> {
    let mut mocks = Vec::new();
    for method in ["GET", "POST"] {
        mocks.push(
            server
                .mock(method, Matcher::Any)
                .expect(0)
                .create_async()
                .await,
        );
    }
    mocks
}
