use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LlmClient, LlmError, LlmResponse, tokens_per_second};
use crate::core::events::InferenceStats;

const DEFAULT_MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.3;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    message: ChatResponseMessage,
    // Durations are reported in nanoseconds.
    total_duration: Option<u64>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
    eval_duration: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Ollama chat-completion client. One blocking (non-token-streamed) call per
/// agent step; usage counters come back in the same envelope.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn ping(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(LlmError::classify)?;
        Ok(())
    }

    async fn chat(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: Option<u32>,
    ) -> Result<LlmResponse, LlmError> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatRequestMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: TEMPERATURE,
                num_predict: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(LlmError::classify)?;

        if !res.status().is_success() {
            return Err(LlmError::Api {
                status: res.status(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = res.json().await?;
        let output_tokens = parsed.eval_count.unwrap_or(0);
        let total_duration_ns = parsed.total_duration.unwrap_or(0);

        let stats = InferenceStats {
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
            input_tokens: parsed.prompt_eval_count.unwrap_or(0),
            output_tokens,
            total_duration_ms: total_duration_ns / 1_000_000,
            tokens_per_second: tokens_per_second(
                output_tokens,
                parsed.eval_duration.unwrap_or(0),
            ),
        };

        Ok(LlmResponse {
            content: parsed.message.content,
            stats,
        })
    }
}
