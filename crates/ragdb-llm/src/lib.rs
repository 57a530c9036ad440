pub mod claude;
pub mod error;
pub mod mock;
pub mod prompt;

pub use claude::ClaudeClient;
pub use error::{LlmError, Result};
pub use prompt::{PromptTemplate, R_EXPERT_TEMPLATE};

/// A hosted chat model answering one self-contained prompt at a time.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}
