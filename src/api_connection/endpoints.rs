use serde::{Deserialize, Serialize};

pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenRouterAvailableModel {
    pub model_name: &'static str,
    pub model_source: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub enum Provider {
    OpenRouter {
        /// Name of the environment variable holding the key, not the key itself.
        api_key: String,
        available_models: Vec<OpenRouterAvailableModel>,
    },
    Ollama {
        base_url: String,
    },
}

pub const OPENROUTER_MODELS: &[OpenRouterAvailableModel] = &[
    OpenRouterAvailableModel {
        model_name: "qwen/qwen3-32b",
        model_source: "cerebras",
    },
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

/// Body of `POST {base_url}/api/chat`.
#[derive(Debug, Serialize, Clone)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaChatResponse {
    pub model: String,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_request_is_non_streaming() -> anyhow::Result<()> {
        let request = OllamaChatRequest {
            model: "llama3.2:3b".to_string(),
            messages: vec![ChatMessage::user("hi")],
            stream: false,
        };
        let json = serde_json::to_value(&request)?;
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        Ok(())
    }

    #[test]
    fn test_parse_ollama_response() -> anyhow::Result<()> {
        let body = r#"{"model":"llama3.2:3b","created_at":"2024-01-01T00:00:00Z","message":{"role":"assistant","content":"Ingredients:\n- tofu"},"done":true}"#;
        let response: OllamaChatResponse = serde_json::from_str(body)?;
        assert_eq!(response.message.content, "Ingredients:\n- tofu");
        assert!(response.done);
        Ok(())
    }

    #[test]
    fn test_parse_openrouter_response_without_optional_fields() -> anyhow::Result<()> {
        let body = r#"{"id":"gen-1","created":1,"model":"qwen/qwen3-32b","choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body)?;
        assert_eq!(response.choices[0].message.content, "ok");
        assert!(response.usage.is_none());
        Ok(())
    }
}
