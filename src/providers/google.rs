use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::errors::BackendError;
use crate::language_utils;
use crate::providers::{non_empty, BackendRequest, RetryPolicy, TranslationBackend};

/// Client for the public web translation endpoint
///
/// No credentials are needed. The endpoint answers with nested arrays whose
/// first element lists translated segments.
#[derive(Debug)]
pub struct GoogleBackend {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl GoogleBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            retry,
        }
    }

    fn request_url(&self, request: &BackendRequest) -> Result<Url, BackendError> {
        let base = format!("{}/translate_a/single", self.endpoint.trim_end_matches('/'));
        let source = language_utils::web_code(&request.source);
        let target = language_utils::web_code(&request.target);
        Url::parse_with_params(
            &base,
            &[
                ("client", "gtx"),
                ("sl", source.as_str()),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ],
        )
        .map_err(|e| BackendError::Network(format!("Invalid endpoint {}: {}", base, e)))
    }

    async fn send(&self, url: &Url) -> Result<String, BackendError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Google translate error ({}): {}", status, error_text);
            return Err(BackendError::from_status(status.as_u16(), error_text));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        extract_text(&body)
    }
}

/// Concatenate the translated segments of a response body
pub fn extract_text(body: &Value) -> Result<String, BackendError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::MalformedResponse("missing segment list".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    non_empty(text)
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let url = self.request_url(request)?;
        let url = &url;
        self.retry.run("Google", move || self.send(url)).await
    }
}
