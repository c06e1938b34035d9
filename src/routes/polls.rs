use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::entity::*;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::{
        common::SuccessResponse,
        polls::{
            CreatePollRequest, ListPollsQuery, PollData, PollListResponse, PollResponse,
            VoteRequest, VoteResponse,
        },
    },
};

/// POST /api/v1/polls
///
/// Flat fee per poll created; vote counting itself is free.
#[instrument(skip(state, identity, request))]
pub async fn create_poll(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<CreatePollRequest>,
) -> Result<Json<PollResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let fee = state.ledger_service.poll_fee();
    state.ledger_service.deduct(&identity.user_id, fee, ()).await?;

    let options = request
        .options
        .into_iter()
        .map(|o| (o.text, o.image_url))
        .collect();

    let poll = state
        .poll_service
        .create_poll(
            &identity.user_id,
            &request.title,
            request.description.as_deref(),
            options,
        )
        .await?;

    log_activity(
        &state,
        &identity.user_id,
        &request.title,
        &format!("Created poll: {}", request.title),
        "poll_creation",
    )
    .await?;

    Ok(Json(SuccessResponse::new(PollData::from(poll))))
}

/// GET /api/v1/polls
#[instrument(skip(state))]
pub async fn list_polls(
    State(state): State<AppState>,
    Query(query): Query<ListPollsQuery>,
) -> Result<Json<PollListResponse>> {
    let polls = state
        .poll_service
        .list_polls(
            query.user_id.as_deref(),
            query.limit.unwrap_or(10),
            query.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(SuccessResponse::new(
        polls.into_iter().map(PollData::from).collect(),
    )))
}

/// GET /api/v1/polls/{pollId}
#[instrument(skip(state))]
pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
) -> Result<Json<PollResponse>> {
    let poll = state.poll_service.get_poll(poll_id).await?;
    Ok(Json(SuccessResponse::new(PollData::from(poll))))
}

/// POST /api/v1/polls/{pollId}/vote
///
/// Zero-cost, logged only.
#[instrument(skip(state, identity, request))]
pub async fn vote(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(poll_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    let vote = state
        .poll_service
        .vote(poll_id, request.option_id, &identity.user_id)
        .await?;

    log_activity(
        &state,
        &identity.user_id,
        "Poll Vote",
        &format!("Voted on poll: {}", poll_id),
        "poll_vote",
    )
    .await?;

    Ok(Json(SuccessResponse::new(vote)))
}

/// Activity log entry in ai_outputs, matching the content-generation log.
async fn log_activity(
    state: &AppState,
    user_id: &str,
    title: &str,
    description: &str,
    template_used: &str,
) -> Result<()> {
    entity::ai_outputs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_string()),
        title: Set(title.to_string()),
        description: Set(description.to_string()),
        template_used: Set(template_used.to_string()),
        created_at: Set(time::OffsetDateTime::now_utc()),
    }
    .insert(&state.db)
    .await?;

    Ok(())
}
