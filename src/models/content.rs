use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::SuccessResponse;

/// Request to generate content from a template
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    /// User brief fed to the AI provider
    #[validate(length(min = 1, max = 10000))]
    pub description: String,

    #[validate(length(min = 1, max = 100))]
    pub template_used: String,
}

pub type GenerateContentResponse = SuccessResponse<GenerateContentData>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentData {
    pub output: entity::ai_outputs::Model,
    /// Credits charged for this generation (character count of the stored text)
    pub charged: i32,
    /// True when the balance only covered a prefix of the generated text
    pub truncated: bool,
    pub credits_remaining: i32,
}
