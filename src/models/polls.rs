use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::poll_service::PollWithVotes;

use super::common::SuccessResponse;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(min = 2, max = 4))]
    pub options: Vec<PollOptionInput>,
}

// Serialize is required by the length validation on the options vector,
// which embeds the rejected value in the validation error params.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionInput {
    pub text: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPollsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_id: Uuid,
}

pub type PollResponse = SuccessResponse<PollData>;
pub type PollListResponse = SuccessResponse<Vec<PollData>>;
pub type VoteResponse = SuccessResponse<entity::votes::Model>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollData {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: time::OffsetDateTime,
    pub options: Vec<PollOptionData>,
    pub total_votes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionData {
    pub id: Uuid,
    pub text: String,
    pub image_url: Option<String>,
    pub votes: u64,
}

impl From<PollWithVotes> for PollData {
    fn from(poll: PollWithVotes) -> Self {
        Self {
            id: poll.poll.id,
            user_id: poll.poll.user_id,
            title: poll.poll.title,
            description: poll.poll.description,
            created_at: poll.poll.created_at,
            options: poll
                .options
                .into_iter()
                .map(|o| PollOptionData {
                    id: o.option.id,
                    text: o.option.text,
                    image_url: o.option.image_url,
                    votes: o.votes,
                })
                .collect(),
            total_votes: poll.total_votes,
        }
    }
}
