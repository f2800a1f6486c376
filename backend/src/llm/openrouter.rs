use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// System instruction sent with every question. Caps response style and
/// length so answers from very different models stay comparable.
const SYSTEM_PROMPT: &str = "You must respond in plain text only (no markdown, \
    no formatting, no special characters). Keep your response to a maximum of \
    140 characters. Be concise and direct.";

/// Answer substituted when a 2xx response carries no message content.
const EMPTY_ANSWER: &str = "No response received";

const MAX_TOKENS: u32 = 1024;

/// Client for communicating with the OpenRouter API.
pub struct OpenRouterClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    referer: String,
}

/// Chat completion request format.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completion response format. Only the first choice's message text is
/// consumed.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error body shape returned by OpenRouter on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Model listing response from the frontend find endpoint.
#[derive(Debug, Deserialize)]
struct ModelListResponse {
    data: ModelListData,
}

#[derive(Debug, Deserialize)]
struct ModelListData {
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    slug: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenRouterError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Upstream(String),
}

impl OpenRouterClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        request_timeout: Duration,
        referer: &str,
    ) -> Self {
        // Same failure mode as reqwest::Client::new: construction only fails
        // if the TLS backend cannot initialize.
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            referer: referer.to_string(),
        }
    }

    /// Whether a credential is configured for completion requests.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the current free-tier model listing. Only the slug of each
    /// entry is retained.
    pub async fn list_free_models(&self) -> Result<Vec<String>, OpenRouterError> {
        let url = format!("{}/api/frontend/models/find?q=free", self.base_url);

        tracing::debug!("Fetching free model list from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| OpenRouterError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OpenRouterError::Upstream(format!(
                "Failed to fetch models: HTTP {}",
                response.status()
            )));
        }

        let listing: ModelListResponse = response
            .json()
            .await
            .map_err(|e| OpenRouterError::InvalidResponse(e.to_string()))?;

        Ok(listing.data.models.into_iter().map(|m| m.slug).collect())
    }

    /// Send one question to one model and return its answer text.
    ///
    /// Non-2xx responses become `Upstream` errors carrying the body's
    /// `error.message` when present, else the HTTP status line.
    pub async fn ask(&self, model: &str, question: &str) -> Result<String, OpenRouterError> {
        let url = format!("{}/api/v1/chat/completions", self.base_url);
        let request = CompletionRequest {
            model,
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: question,
                },
            ],
        };

        let mut builder = self
            .http_client
            .post(&url)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", "Hivemind")
            .json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OpenRouterError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(OpenRouterError::Upstream(message));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenRouterError::InvalidResponse(e.to_string()))?;

        let answer = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| EMPTY_ANSWER.to_string());

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> OpenRouterClient {
        OpenRouterClient::new(
            base_url,
            Some("test-key".to_string()),
            Duration::from_secs(5),
            "http://localhost:3000",
        )
    }

    #[test]
    fn test_has_api_key() {
        assert!(test_client("http://localhost:1").has_api_key());
        let keyless = OpenRouterClient::new(
            "http://localhost:1",
            None,
            Duration::from_secs(5),
            "http://localhost:3000",
        );
        assert!(!keyless.has_api_key());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = test_client("http://localhost:9999/");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_completion_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"42"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_completion_response_without_choices() {
        let parsed: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_error_body_parsing() {
        let json = r#"{"error":{"message":"Rate limit exceeded","code":429}}"#;
        let parsed: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.message, "Rate limit exceeded");
    }

    #[test]
    fn test_model_list_parsing() {
        let json = r#"{"data":{"models":[
            {"slug":"vendor/model-a","name":"Model A"},
            {"slug":"vendor/model-b","name":"Model B"}
        ]}}"#;
        let parsed: ModelListResponse = serde_json::from_str(json).unwrap();
        let slugs: Vec<String> = parsed.data.models.into_iter().map(|m| m.slug).collect();
        assert_eq!(slugs, vec!["vendor/model-a", "vendor/model-b"]);
    }

    #[tokio::test]
    async fn test_ask_transport_error() {
        // Nothing listens on port 1; the call must settle as RequestFailed.
        let client = test_client("http://127.0.0.1:1");
        let result = client.ask("vendor/model-a", "hello?").await;
        assert!(matches!(result, Err(OpenRouterError::RequestFailed(_))));
    }
}
