//! Shared test helpers for session and prompt tests.

use ragchat_core::error::ProviderError;
use ragchat_core::provider::{GenerationRequest, Provider};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `generate` returns the next reply in the queue and records
/// the request it was given. Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    replies: Vec<Result<String, ProviderError>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Every call fails with a connection error.
    pub fn unreachable(times: usize) -> Self {
        Self::new(
            (0..times)
                .map(|_| Err(ProviderError::Connection("connection refused".into())))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests.lock().unwrap().last().map(|r| r.prompt.clone())
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        if call >= self.replies.len() {
            panic!(
                "SequentialMockProvider: no more replies (call #{}, have {})",
                call,
                self.replies.len()
            );
        }
        requests.push(request);
        self.replies[call].clone()
    }
}
