use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when verifying a reCAPTCHA token
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("reCAPTCHA secret is not configured")]
    MissingSecret,

    #[error("client did not send a reCAPTCHA token")]
    MissingToken,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("verification endpoint returned status {0}")]
    Status(u16),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("verification rejected with error codes: {0}")]
    Rejected(String),
}

/// reCAPTCHA v3 verifier
///
/// Posts the client token to the siteverify endpoint and returns the
/// trust score. Every failure is returned as a value; none is fatal.
pub struct CaptchaVerifier {
    verify_url: String,
    secret: Option<String>,
    client: Client,
}

impl CaptchaVerifier {
    pub fn new(verify_url: String, secret: Option<String>) -> Result<Self, CaptchaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            verify_url,
            secret: secret.filter(|s| !s.is_empty()),
            client,
        })
    }

    /// Verify a token and return its score
    pub async fn verify(&self, token: &str, client_ip: &str) -> Result<f64, CaptchaError> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("Missing reCAPTCHA secret configuration");
            return Err(CaptchaError::MissingSecret);
        };

        if token.is_empty() {
            tracing::error!("reCAPTCHA token missing from client submission");
            return Err(CaptchaError::MissingToken);
        }

        let form = [("response", token), ("secret", secret), ("remoteip", client_ip)];

        let response = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("reCAPTCHA validation callout failed: {}", e);
                CaptchaError::RequestError(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("reCAPTCHA validation callout returned {}", status);
            return Err(CaptchaError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("reCAPTCHA validation failed to parse JSON: {}", body);
            CaptchaError::InvalidResponse(e.to_string())
        })?;

        if let Some(codes) = json.get("error-codes") {
            let codes = match codes {
                Value::Array(items) => items
                    .iter()
                    .map(|c| c.as_str().map(str::to_string).unwrap_or_else(|| c.to_string()))
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
            };
            tracing::error!("reCAPTCHA validation failed with error: {}", codes);
            return Err(CaptchaError::Rejected(codes));
        }

        let score = json
            .get("score")
            .and_then(|s| s.as_f64())
            .ok_or_else(|| CaptchaError::InvalidResponse("Missing score field".into()))?;

        tracing::debug!("reCAPTCHA score {} for {}", score, client_ip);

        Ok(score)
    }
}
