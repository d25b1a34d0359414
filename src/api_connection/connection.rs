use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OllamaChatRequest,
    OllamaChatResponse, Provider, DEFAULT_OLLAMA_URL,
    OPENROUTER_CHAT_URL, OPENROUTER_MODELS,
};
use crate::generation::TextGenerator;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("Response contained no choices")]
    EmptyResponse,
    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ApiConnectionError>,
    },
}

impl ApiConnectionError {
    /// Failures worth another attempt: transport errors, rate limiting and
    /// server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiConnectionError::NetworkError(_) | ApiConnectionError::EmptyResponse => true,
            ApiConnectionError::ApiError { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            available_models: OPENROUTER_MODELS.to_vec(),
        }
    }

    /// Local Ollama server; `OLLAMA_HOST` overrides the default address.
    pub fn ollama() -> Self {
        dotenv().ok();
        let base_url = env::var("OLLAMA_HOST")
            .ok()
            .filter(|host| !host.trim().is_empty())
            .map(|host| {
                if host.starts_with("http://") || host.starts_with("https://") {
                    host
                } else {
                    format!("http://{}", host)
                }
            })
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        Self::ollama_at(base_url)
    }

    pub fn ollama_at(base_url: impl Into<String>) -> Self {
        Self::Ollama {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenRouter { .. } => "openrouter",
            Provider::Ollama { .. } => "ollama",
        }
    }
}

/// HTTP chat client shared by every example of a run. Each request is bounded
/// by the client timeout; `generate` retries transient failures with capped
/// exponential back-off.
#[derive(Clone, Debug)]
pub struct ChatClient {
    provider: Provider,
    http: Client,
    max_attempts: u32,
    backoff: Duration,
}

impl ChatClient {
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self, ApiConnectionError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            provider,
            http,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        })
    }

    pub fn with_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// One request, no retry. Empty text is returned as is.
    pub async fn chat(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String, ApiConnectionError> {
        let content = match &self.provider {
            Provider::OpenRouter { .. } => {
                let request = ChatCompletionRequest {
                    model: model.to_string(),
                    messages,
                    temperature: None,
                    max_tokens: None,
                };
                let response = self.call_chat_completion(request).await?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or(ApiConnectionError::EmptyResponse)?
            }
            Provider::Ollama { base_url } => {
                let request = OllamaChatRequest {
                    model: model.to_string(),
                    messages,
                    stream: false,
                };
                self.call_ollama_chat(base_url, &request).await?.message.content
            }
        };
        Ok(content)
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let Provider::OpenRouter {
            api_key: api_key_env_var_name,
            available_models,
        } = &self.provider
        else {
            return Err(ApiConnectionError::UnsupportedProvider(
                self.provider.name().to_string(),
            ));
        };

        dotenv().ok();
        let actual_api_key = env::var(api_key_env_var_name)
            .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

        let mut request_payload = serde_json::to_value(&request)?;
        let source = available_models
            .iter()
            .find(|m| m.model_name == request.model)
            .map(|m| m.model_source);
        if let (Some(source), Some(obj)) = (source, request_payload.as_object_mut()) {
            obj.insert("provider".to_string(), json!({ "only": [source] }));
        }

        let site_url = env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "RecipeGrounding".to_string());

        let response = self
            .http
            .post(OPENROUTER_CHAT_URL)
            .bearer_auth(actual_api_key)
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", site_url)
            .header("X-Title", app_name)
            .json(&request_payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<ChatCompletionResponse>().await?)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }

    async fn call_ollama_chat(
        &self,
        base_url: &str,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChatResponse, ApiConnectionError> {
        let url = format!("{}/api/chat", base_url);
        let response = self.http.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(ApiConnectionError::ApiError { status, error_body });
        }
        Ok(response.json::<OllamaChatResponse>().await?)
    }
}

impl TextGenerator for ChatClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ApiConnectionError> {
        let mut delay = self.backoff;
        let mut attempt = 1;
        loop {
            match self.chat(model, vec![ChatMessage::user(prompt)]).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "generation request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                    attempt += 1;
                }
                Err(err) if attempt > 1 => {
                    debug!(attempt, error = %err, "generation request failed for good");
                    return Err(ApiConnectionError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiConnectionError::EmptyResponse.is_transient());
        assert!(ApiConnectionError::ApiError {
            status: StatusCode::BAD_GATEWAY,
            error_body: String::new(),
        }
        .is_transient());
        assert!(ApiConnectionError::ApiError {
            status: StatusCode::TOO_MANY_REQUESTS,
            error_body: String::new(),
        }
        .is_transient());
        assert!(!ApiConnectionError::ApiError {
            status: StatusCode::UNAUTHORIZED,
            error_body: String::new(),
        }
        .is_transient());
        assert!(!ApiConnectionError::MissingApiKey("K".to_string()).is_transient());
    }

    #[test]
    fn test_ollama_url_is_trimmed() {
        match Provider::ollama_at("http://localhost:11434/") {
            Provider::Ollama { base_url } => assert_eq!(base_url, "http://localhost:11434"),
            other => panic!("unexpected provider {:?}", other),
        }
    }

    #[test]
    fn test_retries_exhausted_message() {
        let err = ApiConnectionError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ApiConnectionError::EmptyResponse),
        };
        assert_eq!(
            err.to_string(),
            "Giving up after 3 attempts: Response contained no choices"
        );
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_retried_then_reported() -> anyhow::Result<()> {
        // Port 9 (discard) is not served locally, so every attempt fails fast.
        let client = ChatClient::new(Provider::ollama_at("http://127.0.0.1:9"), Duration::from_secs(2))?
            .with_retries(2, Duration::from_millis(1));
        let result = client.generate("llama3.2:3b", "hello").await;
        match result {
            Err(ApiConnectionError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ApiConnectionError::NetworkError(_)));
            }
            other => panic!("expected exhausted retries, got {:?}", other),
        }
        Ok(())
    }
}
