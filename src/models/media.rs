use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::SuccessResponse;

/// Request to transcribe (and optionally translate) an uploaded recording
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    #[validate(url)]
    pub audio_url: String,

    /// Source language hint, provider-specific code
    #[validate(length(min = 2, max = 16))]
    pub language: Option<String>,

    /// When set, the provider returns a translated transcript
    #[validate(length(min = 2, max = 16))]
    pub target_language: Option<String>,
}

pub type TranscribeResponse = SuccessResponse<TranscribeData>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeData {
    pub text: String,
    pub charged: i32,
    pub credits_remaining: i32,
}
