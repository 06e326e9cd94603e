// Modal loader driving a dialog session against a mocked internal API

use change_request_desk::core::{DialogMode, DialogSession, ModalLoader};
use change_request_desk::models::FormSubmission;
use mockito::Matcher;
use serde_json::json;

fn form_body() -> String {
    json!({
        "title": "Change request",
        "html": "<form id=\"kzcrChangeRequestForm\"></form>",
        "config": { "reCaptchaV3SiteKey": "site-key" },
        "modules": ["ext.KZChangeRequest", "ext.KZChangeRequest.modal"],
        "bottomScripts": "<script src=\"https://www.google.com/recaptcha/api.js\"></script>",
        "cancelMsg": "Cancel"
    })
    .to_string()
}

#[tokio::test]
async fn test_open_and_submit() {
    let mut server = mockito::Server::new_async().await;
    let load = server
        .mock("GET", "/api/v1/change-request/form")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("articleId".into(), "42".into()),
            Matcher::UrlEncoded("modal".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(form_body())
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/api/v1/change-request/modal")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("wpkzcrArticleId".into(), "42".into()),
            Matcher::UrlEncoded("wpkzcrModal".into(), "1".into()),
            Matcher::UrlEncoded("wpkzcrRequest".into(), "Fix the table".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"title":"Change request","html":"<p class=\"kzcr-confirmation\">Thanks</p>","finishMsg":"Close"}"#)
        .create_async()
        .await;

    let loader = ModalLoader::new(format!("{}/", server.url())).unwrap();
    let mut session = DialogSession::new(Some(42));

    loader.open(&mut session).await.unwrap();
    assert_eq!(session.mode(), DialogMode::Form);
    assert_eq!(session.config["reCaptchaV3SiteKey"], "site-key");
    assert_eq!(session.cancel_msg, "Cancel");

    let fields = FormSubmission {
        // Overridden by the session's article
        article_id: "7".to_string(),
        request: "Fix the table".to_string(),
        ..Default::default()
    };
    loader.submit(&mut session, &fields).await.unwrap();

    assert_eq!(session.mode(), DialogMode::Confirmation);
    assert_eq!(session.finish_msg, "Close");
    load.assert_async().await;
    submit.assert_async().await;

    // Confirmation cannot be submitted again
    assert!(loader.submit(&mut session, &fields).await.is_err());
}

#[tokio::test]
async fn test_open_error_keeps_loading() {
    let mut server = mockito::Server::new_async().await;
    let _load = server
        .mock("GET", "/api/v1/change-request/form")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"The change request form could not be loaded."}"#)
        .create_async()
        .await;

    let loader = ModalLoader::new(server.url()).unwrap();
    let mut session = DialogSession::new(Some(999));
    loader.open(&mut session).await.unwrap();

    assert_eq!(session.mode(), DialogMode::Loading);
    assert_eq!(
        session.error.as_deref(),
        Some("The change request form could not be loaded.")
    );
}
