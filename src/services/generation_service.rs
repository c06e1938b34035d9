use crate::{
    config::AIConfig,
    error::{ApiError, Result},
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub struct GenerationService {
    config: AIConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl GenerationService {
    pub fn new(config: &AIConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            config: config.clone(),
            http_client,
        }
    }

    /// Generate content for a template from the user's title and brief.
    /// Retries transient provider failures (5xx / 429) with linear backoff.
    #[instrument(skip(self, brief))]
    pub async fn generate_content(
        &self,
        template: &str,
        title: &str,
        brief: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: format!(
                        "You are a content writer. Produce {} content for the given title and brief. Respond with the content only.",
                        template
                    ),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Title: {}\n\nBrief: {}", title, brief),
                },
            ],
            max_tokens: 2000,
            temperature: 0.7,
        };

        let mut attempts = 0;
        let mut last_err = None;
        while attempts <= self.config.retry_attempts {
            let response = self
                .http_client
                .post(format!("{}/chat/completions", self.config.api_base))
                .header("Authorization", format!("Bearer {}", self.config.api_key))
                .json(&request)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        let status = resp.status();
                        let text = resp.text().await.unwrap_or_default();
                        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                            attempts += 1;
                            last_err =
                                Some(format!("Provider error {}: {}", status.as_u16(), text));
                            tokio::time::sleep(std::time::Duration::from_millis(
                                200 * attempts as u64,
                            ))
                            .await;
                            continue;
                        }
                        return Err(ApiError::Provider(format!(
                            "Provider error {}: {}",
                            status.as_u16(),
                            text
                        )));
                    }

                    let chat_response: ChatResponse = resp.json().await.map_err(|e| {
                        ApiError::Provider(format!("Failed to parse provider response: {}", e))
                    })?;

                    let content = chat_response
                        .choices
                        .into_iter()
                        .next()
                        .map(|choice| choice.message.content)
                        .ok_or_else(|| {
                            ApiError::Provider("Provider returned no choices".to_string())
                        })?;

                    info!(
                        "Generated content: template={}, chars={}, attempts={}",
                        template,
                        content.chars().count(),
                        attempts
                    );

                    return Ok(content);
                }
                Err(e) => {
                    attempts += 1;
                    last_err = Some(format!("Provider request failed: {}", e));
                    tokio::time::sleep(std::time::Duration::from_millis(200 * attempts as u64))
                        .await;
                }
            }
        }

        Err(ApiError::Provider(last_err.unwrap_or_else(|| {
            "Provider request failed".to_string()
        })))
    }
}
