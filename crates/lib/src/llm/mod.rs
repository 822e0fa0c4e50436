//! Text-generation backends used by the summarizer.
//!
//! One prompt in, generated text out. Ollama (native /api/generate) and any
//! OpenAI-compatible server (/chat/completions) are supported.

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiCompatClient;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
}

/// Prompt-in, text-out generation with a token budget.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}
