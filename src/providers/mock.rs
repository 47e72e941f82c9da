/*!
 * Mock backend implementations for testing and dry runs.
 *
 * - `MockBackend::echo()` - Always succeeds, tagging the text with the target code
 * - `MockBackend::scripted()` - Replays a fixed sequence of results
 * - `MockBackend::failing()` - Always fails with a backend error
 */

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::BackendError;
use crate::providers::{BackendRequest, TranslationBackend};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Returns `[target] text`
    Echo,
    /// Pops the next scripted result; echoes once the script is exhausted
    Scripted,
    /// Always fails with the given error
    Failing(BackendError),
}

/// In-process backend with observable call count
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    script: Arc<Mutex<VecDeque<Result<String, BackendError>>>>,
    /// Requests seen so far, shared between clones
    calls: Arc<AtomicUsize>,
    /// Last request received, shared between clones
    last_request: Arc<Mutex<Option<BackendRequest>>>,
    prompt_based: bool,
}

impl MockBackend {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            prompt_based: false,
        }
    }

    /// Create a mock backend that always succeeds
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock backend replaying `results` in order
    pub fn scripted(results: Vec<Result<String, BackendError>>) -> Self {
        let backend = Self::new(MockBehavior::Scripted);
        backend.script.lock().extend(results);
        backend
    }

    /// Create a mock backend that always fails with a network error
    pub fn failing() -> Self {
        Self::failing_with(BackendError::Network("mock backend unavailable".to_string()))
    }

    pub fn failing_with(error: BackendError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    /// Act as a prompt-based backend so context hints are attached
    pub fn prompt_based(mut self) -> Self {
        self.prompt_based = true;
        self
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn uses_prompt(&self) -> bool {
        self.prompt_based
    }

    async fn translate(&self, request: &BackendRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        let echo = || format!("[{}] {}", request.target, request.text);
        match &self.behavior {
            MockBehavior::Echo => Ok(echo()),
            MockBehavior::Scripted => self.script.lock().pop_front().unwrap_or_else(|| Ok(echo())),
            MockBehavior::Failing(error) => Err(error.clone()),
        }
    }
}
