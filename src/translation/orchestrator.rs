/*!
 * Per-string translation pipeline.
 *
 * The orchestrator owns everything one run needs to translate a string:
 * the sanitizer, the glossary tables, the cache and the backend chosen by the
 * configuration. It is built once per run and never shared between runs.
 *
 * Backend failures are absorbed here: the caller always gets a clean string
 * back, either translated or the cleaned original.
 */

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};

use crate::app_config::Config;
use crate::errors::BackendError;
use crate::providers::{self, BackendRequest, TranslationBackend};
use crate::text::{clean_for_log, CleanText, RawText, Sanitizer};
use crate::translation::cache::{truncate_text, TranslationCache};
use crate::translation::eligibility::{self, SkipReason, Verdict};
use crate::translation::glossary::GlossaryStore;
use crate::translation::language::{Direction, LanguageConfig};

/// Longest excerpt of a string written to a log line
const LOG_EXCERPT_CHARS: usize = 80;

/// How a single string was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The backend answered
    Translated,
    /// Answer taken from the cache
    Cached,
    /// Nothing worth sending; the cleaned text is the result
    Skipped(SkipReason),
    /// The backend failed; the cleaned original is the result
    Fallback(BackendError),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translated => write!(f, "translated"),
            Self::Cached => write!(f, "cached"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Fallback(error) => write!(f, "fallback ({})", error),
        }
    }
}

/// Result of translating one string
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub text: CleanText,
    pub outcome: Outcome,
}

/// Sanitizer + glossary + cache + backend
#[derive(Debug)]
pub struct Orchestrator {
    sanitizer: Sanitizer,
    glossary: GlossaryStore,
    cache: TranslationCache,
    backend: Box<dyn TranslationBackend>,
    language: LanguageConfig,
    /// Pause after every successful backend call
    cooldown: Duration,
}

impl Orchestrator {
    pub fn new(backend: Box<dyn TranslationBackend>, glossary: GlossaryStore, direction: Direction) -> Self {
        let language = LanguageConfig::new(direction, glossary.context_terms(direction));
        Self {
            sanitizer: Sanitizer::new(),
            glossary,
            cache: TranslationCache::new(),
            backend,
            language,
            cooldown: Duration::from_millis(crate::app_config::default_cooldown_ms()),
        }
    }

    /// Build the orchestrator described by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = providers::build_backend(config)?;
        let glossary = GlossaryStore::load(&config.glossary);
        let orchestrator = Self::new(backend, glossary, config.direction)
            .with_cooldown(Duration::from_millis(config.translation.common.cooldown_ms))
            .with_sanitizer(Sanitizer::with_debug(config.translation.common.debug_clean));
        info!(
            "Translating {} with the {} backend",
            orchestrator.language.display_name,
            orchestrator.backend.name()
        );
        Ok(orchestrator)
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn language(&self) -> &LanguageConfig {
        &self.language
    }

    pub fn direction(&self) -> Direction {
        self.language.direction
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Cache hits, misses and hit rate
    pub fn cache_stats(&self) -> (usize, usize, f64) {
        self.cache.stats()
    }

    /// Translate in the configured direction
    pub async fn translate(&mut self, original: &RawText) -> Translated {
        let direction = self.direction();
        self.translate_item(original, direction).await
    }

    /// Translate one string; never fails
    pub async fn translate_one(&mut self, original: &RawText, direction: Direction) -> CleanText {
        self.translate_item(original, direction).await.text
    }

    /// Translate one string and report how it was resolved
    pub async fn translate_item(&mut self, original: &RawText, direction: Direction) -> Translated {
        let cleaned = self.sanitizer.clean(original);

        if let Some(hit) = self.cache.get(original) {
            return Translated { text: hit, outcome: Outcome::Cached };
        }

        if let Verdict::Skip(reason) = eligibility::check(&cleaned, direction) {
            debug!("Skipping '{}': {}", excerpt(&cleaned), reason);
            if reason != SkipReason::Empty {
                self.cache.put(original.clone(), cleaned.clone());
            }
            return Translated { text: cleaned, outcome: Outcome::Skipped(reason) };
        }

        let prepared = self.glossary.preprocess(&cleaned, direction);
        if prepared != cleaned.as_str() {
            debug!("Glossary rewrote '{}' to '{}'", excerpt(&cleaned), excerpt(&prepared));
        }

        let hint = self.glossary.context_hint(&cleaned, direction);
        if let Some(hint) = &hint {
            info!("Context for '{}': {}", excerpt(&cleaned), clean_for_log(hint));
        }

        let mut request = BackendRequest::new(prepared, direction.source(), direction.target());
        if self.backend.uses_prompt() {
            request = request.with_hint(hint);
        }

        let answer = match self.backend.translate(&request).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(
                    "{} failed for '{}', keeping original: {}",
                    self.backend.name(),
                    excerpt(&cleaned),
                    e
                );
                return Translated { text: cleaned, outcome: Outcome::Fallback(e) };
            }
        };
        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }

        let recleaned = self.sanitizer.clean_str(&answer);
        let corrected = self.glossary.postprocess(&recleaned, direction);
        let text = self.sanitizer.clean_str(&corrected);

        // Nothing left after cleaning counts as a missing result
        if text.is_empty() {
            warn!(
                "{} answer for '{}' is empty after cleaning, keeping original",
                self.backend.name(),
                excerpt(&cleaned)
            );
            return Translated { text: cleaned, outcome: Outcome::Fallback(BackendError::EmptyResult) };
        }
        debug!("'{}' -> '{}'", excerpt(&cleaned), excerpt(&text));

        self.cache.put(original.clone(), text.clone());
        Translated { text, outcome: Outcome::Translated }
    }
}

fn excerpt(text: &str) -> String {
    truncate_text(&clean_for_log(text), LOG_EXCERPT_CHARS)
}
