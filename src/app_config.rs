use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::translation::language::Direction;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Translation direction (e.g. "zh_to_fr")
    #[serde(default)]
    pub direction: Direction,

    /// Translation backend settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Glossary file locations
    #[serde(default)]
    pub glossary: GlossaryConfig,

    /// Document reading and write-back settings
    #[serde(default)]
    pub document: DocumentConfig,

    /// Whole-document translation service
    #[serde(default)]
    pub document_service: DocumentServiceConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackendKind {
    // @backend: public web translation endpoint, no key
    #[default]
    Google,
    // @backend: DeepL REST API, glossary aware
    DeepL,
    // @backend: OpenAI chat completions
    OpenAI,
    // @backend: Anthropic messages
    Anthropic,
    // @backend: in-process scripted backend
    Mock,
}

impl TranslationBackendKind {
    pub const ALL: [TranslationBackendKind; 5] = [
        Self::Google,
        Self::DeepL,
        Self::OpenAI,
        Self::Anthropic,
        Self::Mock,
    ];

    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google",
            Self::DeepL => "DeepL",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::DeepL => "deepl".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }

    /// Whether the backend cannot work without an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::DeepL | Self::OpenAI | Self::Anthropic)
    }

    /// Environment variable consulted when the configured key is empty
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::DeepL => Some("DEEPL_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Google | Self::Mock => None,
        }
    }
}

impl std::fmt::Display for TranslationBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "deepl" => Ok(Self::DeepL),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// Backend configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    // @field: Backend type identifier
    #[serde(rename = "type")]
    pub backend_type: String,

    // @field: Model name (prompt-based backends)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Server-side glossary (DeepL)
    #[serde(default)]
    pub glossary_id: Option<String>,
}

impl BackendConfig {
    // @param kind: Backend enum
    // @returns: Backend config with defaults
    pub fn new(kind: TranslationBackendKind) -> Self {
        Self {
            backend_type: kind.to_lowercase_string(),
            model: default_model(kind),
            api_key: String::new(),
            endpoint: default_endpoint(kind),
            timeout_secs: match kind {
                TranslationBackendKind::Anthropic => default_anthropic_timeout_secs(),
                _ => default_timeout_secs(),
            },
            glossary_id: None,
        }
    }
}

/// Translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: TranslationBackendKind,

    /// Available translation backends
    #[serde(default)]
    pub available_backends: Vec<BackendConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all backends
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Fixed pause after every successful backend call, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for prompt-based backends (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Log the sanitizer pass trace for every changed string
    #[serde(default)]
    pub debug_clean: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            debug_clean: false,
        }
    }
}

/// Glossary file locations
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlossaryConfig {
    /// Directory holding the JSON tables
    #[serde(default = "default_glossary_dir")]
    pub directory: String,

    /// Abbreviation map file name
    #[serde(default = "default_abbreviations_file")]
    pub abbreviations_file: String,

    /// Multi-language term map file name
    #[serde(default = "default_term_map_file")]
    pub term_map_file: String,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            directory: default_glossary_dir(),
            abbreviations_file: default_abbreviations_file(),
            term_map_file: default_term_map_file(),
        }
    }
}

/// Document handling settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentConfig {
    /// Also translate text inside named block definitions
    #[serde(default)]
    pub include_blocks: bool,

    /// Font written around translated rich text
    #[serde(default = "default_font")]
    pub font: String,

    /// Candidate encodings, tried in order
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            include_blocks: false,
            font: default_font(),
            encodings: default_encodings(),
        }
    }
}

/// Whole-document translation service settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentServiceConfig {
    /// Base URL of the service API
    #[serde(default = "default_document_service_endpoint")]
    pub endpoint: String,

    /// Bearer token
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model identifier sent with each job
    #[serde(default = "default_document_service_model")]
    pub model: String,

    /// Ask the service to OCR embedded images
    #[serde(default)]
    pub ocr: bool,

    /// Seconds between two status checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Status checks before the job is declared timed out
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Request timeout in seconds (upload and download)
    #[serde(default = "default_document_service_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DocumentServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_document_service_endpoint(),
            api_key: String::new(),
            model: default_document_service_model(),
            ocr: false,
            poll_interval_secs: default_poll_interval_secs(),
            max_polls: default_max_polls(),
            timeout_secs: default_document_service_timeout_secs(),
        }
    }
}

impl DocumentServiceConfig {
    /// API key from the configuration, or from `DOCLINGO_API_KEY`
    pub fn get_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("DOCLINGO_API_KEY").unwrap_or_default()
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

pub fn default_cooldown_ms() -> u64 {
    500
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_temperature() -> f32 {
    0.2
}

fn default_glossary_dir() -> String {
    "glossary".to_string()
}

fn default_abbreviations_file() -> String {
    "abbreviations.json".to_string()
}

fn default_term_map_file() -> String {
    "term_dict.json".to_string()
}

fn default_font() -> String {
    "SimSun".to_string()
}

fn default_encodings() -> Vec<String> {
    ["utf-8", "gbk", "gb2312", "windows-1252"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_document_service_endpoint() -> String {
    "https://api.doclingo.cn/api/core/external".to_string()
}

fn default_document_service_model() -> String {
    "chatgpt-4omini".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_polls() -> u32 {
    60
}

fn default_document_service_timeout_secs() -> u64 {
    120
}

fn default_endpoint(kind: TranslationBackendKind) -> String {
    match kind {
        TranslationBackendKind::Google => "https://translate.googleapis.com".to_string(),
        TranslationBackendKind::DeepL => "https://api-free.deepl.com".to_string(),
        TranslationBackendKind::OpenAI => "https://api.openai.com/v1".to_string(),
        TranslationBackendKind::Anthropic => "https://api.anthropic.com".to_string(),
        TranslationBackendKind::Mock => String::new(),
    }
}

fn default_model(kind: TranslationBackendKind) -> String {
    match kind {
        TranslationBackendKind::OpenAI => "gpt-3.5-turbo".to_string(),
        TranslationBackendKind::Anthropic => "claude-3-haiku-20240307".to_string(),
        _ => String::new(),
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load a configuration file, writing the defaults first if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }
        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let backend = self.translation.backend;
        if backend.requires_api_key() && self.translation.get_api_key().is_empty() {
            let env_hint = backend
                .api_key_env_var()
                .map(|v| format!(" (or set {})", v))
                .unwrap_or_default();
            return Err(anyhow!(
                "Translation API key is required for {} backend{}",
                backend.display_name(),
                env_hint
            ));
        }

        if self.translation.common.temperature < 0.0 || self.translation.common.temperature > 1.0 {
            return Err(anyhow!(
                "Temperature must be between 0.0 and 1.0, got {}",
                self.translation.common.temperature
            ));
        }

        if self.document.encodings.is_empty() {
            return Err(anyhow!("At least one candidate encoding is required"));
        }
        for label in &self.document.encodings {
            if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
                return Err(anyhow!("Unknown encoding label: {}", label));
            }
        }

        if self.document.font.trim().is_empty() {
            return Err(anyhow!("Write-back font must not be empty"));
        }

        if self.document_service.max_polls == 0 {
            return Err(anyhow!("document_service.max_polls must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            direction: Direction::default(),
            translation: TranslationConfig::default(),
            glossary: GlossaryConfig::default(),
            document: DocumentConfig::default(),
            document_service: DocumentServiceConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active backend configuration from the available_backends array
    pub fn get_active_backend_config(&self) -> Option<&BackendConfig> {
        self.get_backend_config(&self.backend)
    }

    /// Get a specific backend configuration by type
    pub fn get_backend_config(&self, kind: &TranslationBackendKind) -> Option<&BackendConfig> {
        let kind_str = kind.to_lowercase_string();
        self.available_backends
            .iter()
            .find(|b| b.backend_type == kind_str)
    }

    /// Get the model for the active backend
    pub fn get_model(&self) -> String {
        if let Some(backend_config) = self.get_active_backend_config() {
            if !backend_config.model.is_empty() {
                return backend_config.model.clone();
            }
        }
        default_model(self.backend)
    }

    /// Get the API key for the active backend, falling back to its environment variable
    pub fn get_api_key(&self) -> String {
        if let Some(backend_config) = self.get_active_backend_config() {
            if !backend_config.api_key.is_empty() {
                return backend_config.api_key.clone();
            }
        }
        self.backend
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active backend
    pub fn get_endpoint(&self) -> String {
        if let Some(backend_config) = self.get_active_backend_config() {
            if !backend_config.endpoint.is_empty() {
                return backend_config.endpoint.clone();
            }
        }
        default_endpoint(self.backend)
    }

    /// Get the request timeout for the active backend
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_backend_config() {
            Some(backend_config) if backend_config.timeout_secs > 0 => backend_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }

    /// Get the server-side glossary id, if any
    pub fn get_glossary_id(&self) -> Option<String> {
        self.get_active_backend_config()
            .and_then(|b| b.glossary_id.clone())
            .filter(|id| !id.is_empty())
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackendKind::default(),
            available_backends: TranslationBackendKind::ALL
                .iter()
                .filter(|k| **k != TranslationBackendKind::Mock)
                .map(|k| BackendConfig::new(*k))
                .collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
