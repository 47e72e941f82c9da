use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::BackendError;
use crate::providers::{non_empty, system_prompt, user_prompt, BackendRequest, RetryPolicy, TranslationBackend};

/// OpenAI client for the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

impl OpenAIRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Complete a chat request
    pub async fn complete(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, BackendError> {
        let api_url = if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
        };

        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(BackendError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("Failed to parse OpenAI API response: {}", e)))
    }

    /// Extract text from an OpenAI response
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Result<String, BackendError> {
        let text = response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| BackendError::MalformedResponse("no choices in response".to_string()))?;
        non_empty(text)
    }
}

/// Prompt-based backend over the chat completions API
#[derive(Debug)]
pub struct OpenAIBackend {
    client: OpenAI,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAIBackend {
    pub fn new(client: OpenAI, model: impl Into<String>, temperature: f32, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            retry,
        }
    }

    /// Request sent for one string
    pub fn build_request(&self, request: &BackendRequest) -> OpenAIRequest {
        OpenAIRequest::new(&self.model)
            .add_message("system", system_prompt(&request.source, &request.target))
            .add_message("user", user_prompt(request))
            .temperature(self.temperature)
    }
}

#[async_trait]
impl TranslationBackend for OpenAIBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn uses_prompt(&self) -> bool {
        true
    }

    async fn translate(&self, request: &BackendRequest) -> Result<String, BackendError> {
        if !self.client.has_api_key() {
            return Err(BackendError::MissingCredentials("OpenAI API key is not configured".to_string()));
        }
        let chat = self.build_request(request);
        let chat = &chat;
        let client = &self.client;
        let response = self.retry.run("OpenAI", move || client.complete(chat)).await?;
        OpenAI::extract_text_from_response(&response)
    }
}
