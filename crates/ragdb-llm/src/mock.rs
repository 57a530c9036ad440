//! In-process chat model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{LlmError, Result};
use crate::ChatModel;

/// Replies from a script, then with `default_response`. Records every prompt.
#[derive(Debug, Clone)]
pub struct MockChat {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
}

impl Default for MockChat {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
        }
    }
}

impl MockChat {
    #[must_use]
    pub fn with_responses(responses: Vec<Result<String>>) -> Self {
        Self { responses: Arc::new(Mutex::new(responses.into())), ..Self::default() }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ChatModel for MockChat {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self
            .responses
            .lock()
            .map_err(|_| LlmError::Other("mock response queue poisoned".into()))?
            .pop_front();
        next.unwrap_or_else(|| Ok(self.default_response.clone()))
    }
}
