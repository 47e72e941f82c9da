use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::BackendError;
use crate::language_utils;
use crate::providers::{non_empty, BackendRequest, RetryPolicy, TranslationBackend};

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    pub translations: Vec<DeepLTranslation>,
}

/// One translated text
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    #[serde(default)]
    pub detected_source_language: Option<String>,
    pub text: String,
}

/// Terminology-aware translation backend (DeepL REST API)
#[derive(Debug)]
pub struct DeepLBackend {
    client: Client,
    api_key: String,
    endpoint: String,
    /// Server-side glossary applied to every request
    glossary_id: Option<String>,
    retry: RetryPolicy,
}

impl DeepLBackend {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            glossary_id: None,
            retry,
        }
    }

    pub fn with_glossary(mut self, glossary_id: Option<String>) -> Self {
        self.glossary_id = glossary_id;
        self
    }

    fn form(&self, request: &BackendRequest) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("text", request.text.clone()),
            ("source_lang", language_utils::deepl_code(&request.source)),
            ("target_lang", target_code(&request.target)),
        ];
        if let Some(glossary_id) = &self.glossary_id {
            form.push(("glossary_id", glossary_id.clone()));
        }
        form
    }

    async fn send(&self, form: &[(&'static str, String)]) -> Result<String, BackendError> {
        let url = format!("{}/v2/translate", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepL API error ({}): {}", status, error_text);
            return Err(BackendError::from_status(status.as_u16(), error_text));
        }

        let body: DeepLResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("Failed to parse DeepL response: {}", e)))?;
        extract_text(body)
    }
}

/// English targets need a regional variant
fn target_code(code: &str) -> String {
    match language_utils::deepl_code(code).as_str() {
        "EN" => "EN-US".to_string(),
        other => other.to_string(),
    }
}

/// First translation of a response
pub fn extract_text(body: DeepLResponse) -> Result<String, BackendError> {
    let first = body
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::MalformedResponse("no translations in response".to_string()))?;
    non_empty(first.text)
}

#[async_trait]
impl TranslationBackend for DeepLBackend {
    fn name(&self) -> &str {
        "deepl"
    }

    async fn translate(&self, request: &BackendRequest) -> Result<String, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::MissingCredentials("DeepL API key is not configured".to_string()));
        }
        let form = self.form(request);
        let form = form.as_slice();
        self.retry.run("DeepL", move || self.send(form)).await
    }
}
