//! LLM client for API communication

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Anything that can turn a prompt into a completion.
///
/// The reviewer depends on this seam instead of the concrete client so
/// tests can substitute [`MockLlmClient`].
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse>;
}

/// Response from LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated content
    pub content: String,
    /// Number of tokens used
    pub tokens_used: Option<usize>,
}

/// Configuration for LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Maximum tokens for response
    pub max_tokens: usize,
    /// Temperature for generation
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            max_tokens: 1024,
            // Reviews should be deterministic, not creative
            temperature: 0.1,
        }
    }
}

/// Client for the review endpoint
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create with Ollama defaults
    pub fn ollama(model: &str) -> Self {
        Self::new(LlmConfig {
            model: model.to_string(),
            ..Default::default()
        })
    }

    /// Create with OpenAI-compatible endpoint
    pub fn openai_compatible(endpoint: &str, model: &str, api_key: Option<&str>) -> Self {
        Self::new(LlmConfig {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.map(|s| s.to_string()),
            ..Default::default()
        })
    }

    /// Check if the LLM service is available
    pub async fn is_available(&self) -> bool {
        let url = if self.config.endpoint.contains("11434") {
            // Ollama
            format!("{}/api/tags", self.config.endpoint)
        } else {
            // OpenAI-compatible
            format!("{}/v1/models", self.config.endpoint)
        };

        self.client.get(&url).send().await.is_ok()
    }

    /// Generate a completion.
    ///
    /// Any transport failure, non-success status, or undecodable body is
    /// an error; the caller decides how to recover. There is no retry
    /// here — a failed review is reclaimed by the startup scanner.
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        if self.config.endpoint.contains("11434") {
            self.complete_ollama(prompt).await
        } else {
            self.complete_openai(prompt).await
        }
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let request = OllamaGenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens as i32,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama request failed: {} - {}", status, body);
        }

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(LlmResponse {
            content: result.response,
            tokens_used: Some(result.eval_count.unwrap_or(0) as usize),
        })
    }

    async fn complete_openai(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let request = OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let mut req_builder = self.client.post(&url).json(&request);

        if let Some(ref key) = self.config.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = req_builder
            .send()
            .await
            .context("Failed to send request to OpenAI-compatible API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI request failed: {} - {}", status, body);
        }

        let result: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        let tokens_used = result.usage.map(|u| u.total_tokens as usize);

        Ok(LlmResponse {
            content,
            tokens_used,
        })
    }
}

#[async_trait]
impl Completer for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        LlmClient::complete(self, prompt).await
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    eval_count: Option<i32>,
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: i32,
}

/// Mock LLM client for testing
pub struct MockLlmClient {
    responses: std::collections::HashMap<String, String>,
    failure: Option<String>,
}

impl MockLlmClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            failure: None,
        }
    }

    /// Create a mock whose every call fails with the given message
    pub fn failing(message: &str) -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            failure: Some(message.to_string()),
        }
    }

    /// Add a mock response
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Generate a mock completion
    pub fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        if let Some(ref message) = self.failure {
            anyhow::bail!("mock LLM failure: {message}");
        }

        for (key, response) in &self.responses {
            if prompt.contains(key) {
                return Ok(LlmResponse {
                    content: response.clone(),
                    tokens_used: Some(100),
                });
            }
        }

        // Default verdict
        Ok(LlmResponse {
            content: r#"{"is_correct": true, "confidence": 0.9, "explanation": "Mock review"}"#
                .to_string(),
            tokens_used: Some(50),
        })
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Completer for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        MockLlmClient::complete(self, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_client() {
        let mut client = MockLlmClient::new();
        client.add_response("FizzBuzz", r#"{"is_correct": false, "confidence": 0.8}"#);

        let response = client.complete("review this FizzBuzz attempt").unwrap();
        assert!(response.content.contains("false"));
    }

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert!(config.endpoint.contains("11434"));
        assert!(config.temperature < 0.5);
    }
}
