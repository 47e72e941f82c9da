/*!
 * Translation backends.
 *
 * This module contains client implementations for the supported services:
 * - Google: public web translation endpoint
 * - DeepL: terminology-aware translation API
 * - OpenAI / Anthropic: prompt-based LLM services
 * - Mock: scripted in-process backend for tests and dry runs
 *
 * The document translation service (`document_service`) works on whole
 * files and sits outside the per-string `TranslationBackend` seam.
 */

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::warn;

use crate::app_config::{Config, TranslationBackendKind};
use crate::errors::BackendError;
use crate::translation::glossary::SOURCE_LABEL;

pub mod anthropic;
pub mod deepl;
pub mod document_service;
pub mod google;
pub mod mock;
pub mod openai;

/// One string to translate
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Text after cleaning and glossary preprocessing
    pub text: String,
    /// ISO 639-1 source code
    pub source: String,
    /// ISO 639-1 target code
    pub target: String,
    /// Context hint; only prompt-based backends receive it
    pub hint: Option<String>,
}

impl BackendRequest {
    pub fn new(text: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            target: target.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

/// Common trait for all translation backends
///
/// Implementations never return an empty string to signal failure; a missing
/// result is always a `BackendError`.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether the backend is driven by a prompt and can use a context hint
    fn uses_prompt(&self) -> bool {
        false
    }

    /// Translate one string
    async fn translate(&self, request: &BackendRequest) -> Result<String, BackendError>;
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self { max_retries, backoff_base_ms }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the retries are used up
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} request failed: {} - attempt {}/{}",
                        label,
                        e,
                        attempt,
                        self.max_retries + 1
                    );
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

/// Reject blank output
pub fn non_empty(text: String) -> Result<String, BackendError> {
    if text.trim().is_empty() {
        Err(BackendError::EmptyResult)
    } else {
        Ok(text)
    }
}

/// System prompt shared by the prompt-based backends
pub fn system_prompt(source: &str, target: &str) -> String {
    let name = |code: &str| crate::language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
    format!(
        "You are a professional translator for architectural and interior design drawings. \
         Translate the text from {} to {}. Reply with the translation only, without explanation.",
        name(source),
        name(target)
    )
}

/// User message for prompt-based backends; the hint, when present, precedes
/// the labelled source text
pub fn user_prompt(request: &BackendRequest) -> String {
    match &request.hint {
        Some(hint) => format!("{}\n{}: {}", hint, SOURCE_LABEL, request.text),
        None => request.text.clone(),
    }
}

/// Build the backend selected by the configuration
pub fn build_backend(config: &Config) -> Result<Box<dyn TranslationBackend>> {
    let translation = &config.translation;
    let retry = RetryPolicy::new(translation.common.retry_count, translation.common.retry_backoff_ms);
    let timeout = Duration::from_secs(translation.get_timeout_secs());

    let backend: Box<dyn TranslationBackend> = match translation.backend {
        TranslationBackendKind::Google => Box::new(google::GoogleBackend::new(
            translation.get_endpoint(),
            timeout,
            retry,
        )),
        TranslationBackendKind::DeepL => Box::new(
            deepl::DeepLBackend::new(translation.get_api_key(), translation.get_endpoint(), timeout, retry)
                .with_glossary(translation.get_glossary_id()),
        ),
        TranslationBackendKind::OpenAI => Box::new(openai::OpenAIBackend::new(
            openai::OpenAI::new(translation.get_api_key(), translation.get_endpoint(), timeout),
            translation.get_model(),
            translation.common.temperature,
            retry,
        )),
        TranslationBackendKind::Anthropic => Box::new(anthropic::AnthropicBackend::new(
            anthropic::Anthropic::new(translation.get_api_key(), translation.get_endpoint(), timeout),
            translation.get_model(),
            translation.common.temperature,
            retry,
        )),
        TranslationBackendKind::Mock => Box::new(mock::MockBackend::echo()),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_shouldDoubleEachAttempt() {
        let policy = RetryPolicy::new(3, 100);
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_run_withRetryableErrors_shouldRetryUntilSuccess() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::new(3, 1)
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::Network("reset".to_string()))
                } else {
                    Ok("ok")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_withPermanentError_shouldNotRetry() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), BackendError> = RetryPolicy::new(3, 1)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Quota("exhausted".to_string()))
            })
            .await;
        assert!(matches!(result, Err(BackendError::Quota(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_userPrompt_withHint_shouldLabelSource() {
        let request = BackendRequest::new("吊顶", "zh", "fr").with_hint(Some("建筑术语: 吊顶=faux plafond.".to_string()));
        assert_eq!(user_prompt(&request), "建筑术语: 吊顶=faux plafond.\n原文: 吊顶");
        assert!(non_empty("  ".to_string()).is_err());
    }
}
