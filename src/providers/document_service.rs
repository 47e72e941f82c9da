/*!
 * Whole-document translation service.
 *
 * Slide decks are not walked element by element. The file is uploaded to a
 * document translation service, which hands back a query key. The key is
 * polled on a fixed interval until the job reports success (with a download
 * URL) or failure (with a reason), or until the poll budget is used up.
 */

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::app_config::DocumentServiceConfig;
use crate::errors::BackendError;
use crate::file_utils::FileManager;

/// Extension used when the result URL carries none
const DEFAULT_EXTENSION: &str = "pptx";

/// Envelope wrapping every service answer
#[derive(Debug, Deserialize)]
pub struct ServiceEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of a submission answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitData {
    pub translate_query_key: String,
}

/// Payload of a status answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub translate_rate: Option<Value>,
    #[serde(default)]
    pub target_file_url: Option<String>,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

/// Interpreted job state
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Still running; progress as reported by the service
    Pending(String),
    /// Finished with a result file
    Done(String),
    /// Finished with an error
    Failed(String),
}

impl StatusData {
    pub fn state(&self) -> JobState {
        match (self.status, &self.target_file_url) {
            (1, Some(url)) if !url.is_empty() => JobState::Done(url.clone()),
            (2, _) => JobState::Failed(
                self.fail_reason
                    .clone()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            _ => {
                let progress = match &self.translate_rate {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => "-".to_string(),
                };
                JobState::Pending(progress)
            }
        }
    }
}

/// Options for one document job
#[derive(Debug, Clone)]
pub struct DocumentJob {
    /// File to upload
    pub input: PathBuf,
    /// Service language code of the result
    pub target_lang: String,
    /// Service language code of the input, if known
    pub source_lang: Option<String>,
}

/// Client for the document translation service
#[derive(Debug)]
pub struct DocumentService {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    ocr: bool,
    poll_interval: Duration,
    max_polls: u32,
}

impl DocumentService {
    pub fn new(config: &DocumentServiceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.get_api_key(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            ocr: config.ocr,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
        }
    }

    /// Upload the file and return the query key
    pub async fn submit(&self, job: &DocumentJob) -> Result<String, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::MissingCredentials(
                "document service API key is not configured".to_string(),
            ));
        }

        let bytes = tokio::fs::read(&job.input)
            .await
            .map_err(|e| BackendError::Network(format!("Failed to read {}: {}", job.input.display(), e)))?;
        let file_name = job
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("targetLang", job.target_lang.clone())
            .text("model", self.model.clone())
            .text("ocrFlag", if self.ocr { "1" } else { "0" })
            .text("mathFlag", "1");
        if let Some(source) = &job.source_lang {
            form = form.text("sourceLang", source.clone());
        }

        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let envelope: ServiceEnvelope<SubmitData> = read_envelope(response).await?;
        unwrap_envelope(envelope).map(|data| data.translate_query_key)
    }

    /// Query the state of a submitted job
    pub async fn status(&self, query_key: &str) -> Result<StatusData, BackendError> {
        let url = Url::parse_with_params(
            &format!("{}/trans/query", self.endpoint),
            &[("translateQueryKey", query_key)],
        )
        .map_err(|e| BackendError::Network(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;

        let response = self.client.get(url).bearer_auth(&self.api_key).send().await?;
        let envelope: ServiceEnvelope<StatusData> = read_envelope(response).await?;
        unwrap_envelope(envelope)
    }

    /// Poll until the job reaches a terminal state; returns the result URL
    pub async fn wait_for_result(&self, query_key: &str) -> Result<String, BackendError> {
        poll_job(query_key, self.max_polls, self.poll_interval, || self.status(query_key)).await
    }

    /// Download the result next to the input file
    pub async fn download(&self, job: &DocumentJob, result_url: &str) -> Result<PathBuf, BackendError> {
        let extension = result_extension(result_url);
        let output = FileManager::timestamped_output_path(&job.input, &job.target_lang, &extension, Local::now());

        let response = self.client.get(result_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), format!("download of {} failed", result_url)));
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(&output, &bytes)
            .await
            .map_err(|e| BackendError::Network(format!("Failed to write {}: {}", output.display(), e)))?;
        debug!("Downloaded {} bytes to {}", bytes.len(), output.display());
        Ok(output)
    }

    /// Submit, poll and download
    pub async fn run(&self, job: &DocumentJob) -> Result<PathBuf, BackendError> {
        info!("Uploading {} for translation to {}", job.input.display(), job.target_lang);
        let query_key = self.submit(job).await?;
        debug!("Document job accepted with key {}", query_key);
        let url = self.wait_for_result(&query_key).await?;
        let output = self.download(job, &url).await?;
        info!("Translated document saved to {}", output.display());
        Ok(output)
    }
}

/// Call `fetch` every `interval` until the job is done or failed, at most
/// `max_polls` times
pub async fn poll_job<F, Fut>(
    query_key: &str,
    max_polls: u32,
    interval: Duration,
    mut fetch: F,
) -> Result<String, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusData, BackendError>>,
{
    for poll in 1..=max_polls {
        match fetch().await?.state() {
            JobState::Done(url) => return Ok(url),
            JobState::Failed(reason) => {
                error!("Document job {} failed: {}", query_key, reason);
                return Err(BackendError::JobFailed(reason));
            }
            JobState::Pending(progress) => {
                info!("Document job in progress ({}), poll {}/{}", progress, poll, max_polls);
            }
        }
        if poll < max_polls {
            tokio::time::sleep(interval).await;
        }
    }
    Err(BackendError::Timeout { polls: max_polls })
}

async fn read_envelope<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<ServiceEnvelope<T>, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("Document service error ({}): {}", status, error_text);
        return Err(BackendError::from_status(status.as_u16(), error_text));
    }
    response
        .json()
        .await
        .map_err(|e| BackendError::MalformedResponse(format!("Failed to parse document service response: {}", e)))
}

/// Payload of a successful envelope
pub fn unwrap_envelope<T>(envelope: ServiceEnvelope<T>) -> Result<T, BackendError> {
    match envelope {
        ServiceEnvelope { success: true, data: Some(data), .. } => Ok(data),
        ServiceEnvelope { message, .. } => Err(BackendError::MalformedResponse(
            message.unwrap_or_else(|| "unsuccessful response without data".to_string()),
        )),
    }
}

/// File extension of the result URL, without the dot
pub fn result_extension(result_url: &str) -> String {
    Url::parse(result_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
        })
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
