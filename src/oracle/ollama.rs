use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::oracle::Oracle;

/// Client for an Ollama server's non-streaming generate endpoint.
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Oracle for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Oracle(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body = response.json::<GenerateResponse>().await?;
        if !body.done {
            return Err(AppError::Oracle(
                "Ollama response marked incomplete".to_string(),
            ));
        }
        Ok(body.response)
    }
}

// --- Request/response types ---

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_generate_response_deserializes() {
        let body = r#"{
            "model": "llama3.1",
            "created_at": "2025-04-01T08:00:00Z",
            "response": "SELECT 1;",
            "done": true,
            "total_duration": 12345
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response, "SELECT 1;");
        assert!(parsed.done);
    }
}
