//! LLM collaborator boundary. The pipeline depends on one operation: send a
//! system prompt plus a single user message, get the full response text back
//! with usage counters. Errors are classified so the web layer can tell a
//! dead backend (fall back to the demo simulator) from a live backend that
//! returned a bad answer (hard failure, surfaced to the client).

mod ollama;

pub use ollama::OllamaClient;

use async_trait::async_trait;

use crate::core::events::InferenceStats;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Backend could not be reached at all (connect-level failure).
    #[error("llm backend unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    /// Backend was reached but returned a non-success status.
    #[error("llm api error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Request failed in flight or the response envelope did not parse.
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl LlmError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, LlmError::Unreachable(_))
    }

    pub(crate) fn classify(err: reqwest::Error) -> Self {
        if err.is_connect() {
            LlmError::Unreachable(err)
        } else {
            LlmError::Request(err)
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub stats: InferenceStats,
}

/// Chat-completion style collaborator: one call per agent step, full
/// (non-token-streamed) response.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Cheap reachability probe, used before a run to decide live vs demo.
    async fn ping(&self) -> Result<(), LlmError>;

    async fn chat(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: Option<u32>,
    ) -> Result<LlmResponse, LlmError>;
}

/// Tokens per second rounded to one decimal; 0 when the duration is 0 so the
/// figure is never NaN or infinite.
pub fn tokens_per_second(output_tokens: u64, duration_ns: u64) -> f64 {
    if duration_ns == 0 {
        return 0.0;
    }
    let per_second = output_tokens as f64 / (duration_ns as f64 / 1e9);
    (per_second * 10.0).round() / 10.0
}
