use crate::{
    config::TranscriptionConfig,
    error::{ApiError, Result},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub struct TranscriptionService {
    config: TranscriptionConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_language: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranscriptCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptStatus {
    status: String,
    text: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
}

impl TranscriptionService {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            config: config.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Submit a transcription job and poll until the provider finishes.
    /// `target_language` requests a translated transcript.
    #[instrument(skip(self))]
    pub async fn transcribe(
        &self,
        audio_url: &str,
        language: Option<&str>,
        target_language: Option<&str>,
    ) -> Result<Transcript> {
        let request = TranscriptRequest {
            audio_url,
            language_code: language,
            target_language,
        };

        let created: TranscriptCreated = self
            .http_client
            .post(format!("{}/transcript", self.config.api_base))
            .header("Authorization", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("Transcription submit failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ApiError::Provider(format!("Transcription submit rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| ApiError::Provider(format!("Invalid transcript response: {}", e)))?;

        info!("Submitted transcription job: {}", created.id);

        let mut attempts = 0;
        while attempts < self.config.max_poll_attempts {
            let status: TranscriptStatus = self
                .http_client
                .get(format!("{}/transcript/{}", self.config.api_base, created.id))
                .header("Authorization", &self.config.api_key)
                .send()
                .await
                .map_err(|e| ApiError::Provider(format!("Transcription poll failed: {}", e)))?
                .json()
                .await
                .map_err(|e| ApiError::Provider(format!("Invalid poll response: {}", e)))?;

            match status.status.as_str() {
                "completed" => {
                    let text = status.text.unwrap_or_default();
                    info!(
                        "Transcription {} completed ({} chars)",
                        created.id,
                        text.chars().count()
                    );
                    return Ok(Transcript { text });
                }
                "error" => {
                    return Err(ApiError::Provider(
                        status
                            .error
                            .unwrap_or_else(|| "Transcription processing failed".to_string()),
                    ));
                }
                _ => {
                    tokio::time::sleep(std::time::Duration::from_millis(
                        self.config.poll_interval_ms,
                    ))
                    .await;
                    attempts += 1;
                }
            }
        }

        Err(ApiError::Provider("Transcription timed out".to_string()))
    }
}
