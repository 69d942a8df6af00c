//! Minimal client for OpenAI-compatible `/chat/completions` endpoints (Groq by default).

use anyhow::{anyhow, Context, Result};
use docsage_core::config::LlmConfig;
use docsage_pipeline::prompt::Prompt;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatAnswer {
    pub content: String,
    pub tokens_used: u64,
    pub model: String,
}

pub struct ChatClient {
    http: Client,
    config: LlmConfig,
    api_key: String,
}

impl ChatClient {
    /// The key comes from `llm.api_key`, falling back to `GROQ_API_KEY`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| anyhow!("no API key: set llm.api_key or {API_KEY_ENV}"))?;
        let http = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self { http, config: config.clone(), api_key })
    }

    pub fn complete(&self, prompt: &Prompt) -> Result<ChatAnswer> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!(%url, model = %self.config.model, code_mode = prompt.code_mode, "chat completion");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&build_request(&self.config, prompt))
            .send()
            .with_context(|| format!("POST {url}"))?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(anyhow!("chat completion failed ({status}): {body}"));
        }
        parse_response(&body, &self.config.model)
    }
}

pub fn build_request<'a>(config: &'a LlmConfig, prompt: &'a Prompt) -> ChatRequest<'a> {
    ChatRequest {
        model: &config.model,
        messages: vec![
            ChatMessage { role: "system", content: &prompt.system },
            ChatMessage { role: "user", content: &prompt.user },
        ],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

pub fn parse_response(body: &str, requested_model: &str) -> Result<ChatAnswer> {
    let parsed: ChatResponse = serde_json::from_str(body).context("decoding chat completion")?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("chat completion returned no message"))?;
    Ok(ChatAnswer {
        content,
        tokens_used: parsed.usage.map_or(0, |u| u.total_tokens),
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
    })
}
