//! Clients for OpenAI-compatible `/embeddings` and `/chat/completions`.
//!
//! Every upstream failure surfaces as [`RcaBotError::Generation`]. Requests
//! are not retried.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{RcaBotError, Result};
use crate::ports::{ChatMessage, ChatModel, ChatRequest, EmbeddingGenerator};

fn build_client(api_key: &str, timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let auth = format!("Bearer {}", api_key.trim());
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&auth)
            .map_err(|_| RcaBotError::Config("invalid OpenAI API key".to_string()))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()?)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

async fn post_json<B, R>(client: &reqwest::Client, url: &str, body: &B) -> Result<R>
where
    B: Serialize + Sync,
    R: for<'de> Deserialize<'de>,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| RcaBotError::Generation(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(RcaBotError::Generation(format!(
            "{url} returned {status}: {text}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| RcaBotError::Generation(format!("failed to parse response from {url}: {e}")))
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: OnceLock<usize>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: String, timeout: Duration) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(RcaBotError::Config("missing embedding model name".to_string()));
        }

        Ok(Self {
            client: build_client(api_key, timeout)?,
            endpoint: endpoint(base_url, "embeddings"),
            model,
            dimension: OnceLock::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.require_api_key()?,
            &config.provider.base_url,
            config.embedding.model.clone(),
            Duration::from_secs(config.provider.timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingGenerator for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| RcaBotError::Generation("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let mut parsed: EmbeddingResponse =
            post_json(&self.client, &self.endpoint, &request).await?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(RcaBotError::Generation(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|e| e.embedding).collect();
        if let Some(first) = vectors.first() {
            let _ = self.dimension.set(first.len());
        }
        Ok(vectors)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: &str, base_url: &str, model: String, timeout: Duration) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(RcaBotError::Config("missing chat model name".to_string()));
        }

        Ok(Self {
            client: build_client(api_key, timeout)?,
            endpoint: endpoint(base_url, "chat/completions"),
            model,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.require_api_key()?,
            &config.provider.base_url,
            config.chat.model.clone(),
            Duration::from_secs(config.provider.timeout_secs),
        )
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            temperature: request.temperature,
            messages: &request.messages,
        };
        let parsed: CompletionResponse = post_json(&self.client, &self.endpoint, &body).await?;

        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| RcaBotError::Generation("completion contained no message".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::ports::ChatRole;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            endpoint("http://localhost:8080/v1", "chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn completion_request_uses_wire_roles() {
        let messages = vec![
            ChatMessage::system("ctx"),
            ChatMessage {
                role: ChatRole::Assistant,
                content: "hi".to_string(),
            },
            ChatMessage::user("why?"),
        ];
        let body = CompletionRequest {
            model: "gpt-3.5-turbo",
            temperature: 0.5,
            messages: &messages,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.5,
                "messages": [
                    {"role": "system", "content": "ctx"},
                    {"role": "assistant", "content": "hi"},
                    {"role": "user", "content": "why?"},
                ]
            })
        );
    }

    #[test]
    fn embedding_response_is_reordered_by_index() {
        let mut parsed: EmbeddingResponse = serde_json::from_value(json!({
            "data": [
                {"embedding": [0.0, 1.0], "index": 1},
                {"embedding": [1.0, 0.0], "index": 0},
            ]
        }))
        .unwrap();
        parsed.data.sort_by_key(|entry| entry.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let config = Config::default();
        assert!(matches!(
            OpenAiChat::from_config(&config),
            Err(RcaBotError::Config(_))
        ));
    }
}
