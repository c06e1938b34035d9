use axum::{extract::State, Json};
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
        content::{GenerateContentData, GenerateContentRequest, GenerateContentResponse},
    },
};

/// POST /api/v1/content/generate
///
/// Cost is the character count of the generated text; when the balance only
/// covers part of it, the stored and returned text is the affordable prefix.
#[instrument(skip(state, identity, request))]
pub async fn generate_content(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<GenerateContentRequest>,
) -> Result<Json<GenerateContentResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    // Cheap gate before paying the provider; the deduct below still enforces
    let check = state.ledger_service.can_spend(&identity.user_id).await?;
    if !check.can_make_request {
        return Err(ApiError::NoCreditsAvailable);
    }

    let generated = state
        .generation_service
        .generate_content(&request.template_used, &request.title, &request.description)
        .await?;

    let cost = generated.chars().count() as i32;
    let deduction = state
        .ledger_service
        .deduct(&identity.user_id, cost, generated)
        .await?;

    let now = time::OffsetDateTime::now_utc();
    let output = entity::ai_outputs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(identity.user_id.clone()),
        title: Set(request.title),
        description: Set(deduction.payload),
        template_used: Set(request.template_used),
        created_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok(Json(SuccessResponse::new(GenerateContentData {
        output,
        charged: deduction.charged,
        truncated: deduction.truncated,
        credits_remaining: deduction.balance_after,
    })))
}
