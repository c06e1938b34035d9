use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::{
        common::SuccessResponse,
        media::{TranscribeData, TranscribeRequest, TranscribeResponse},
    },
};

/// POST /api/v1/media/transcribe
///
/// Flat fee per request, charged only once the transcript is back; a failed
/// provider call costs nothing.
#[instrument(skip(state, identity, request))]
pub async fn transcribe(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    // Cheap gate before paying the provider; the deduct below still enforces
    let check = state.ledger_service.can_spend(&identity.user_id).await?;
    if !check.can_make_request {
        return Err(ApiError::NoCreditsAvailable);
    }

    let transcript = state
        .transcription_service
        .transcribe(
            &request.audio_url,
            request.language.as_deref(),
            request.target_language.as_deref(),
        )
        .await?;

    let fee = state.ledger_service.transcription_fee();
    let deduction = state
        .ledger_service
        .deduct(&identity.user_id, fee, ())
        .await?;

    Ok(Json(SuccessResponse::new(TranscribeData {
        text: transcript.text,
        charged: deduction.charged,
        credits_remaining: deduction.balance_after,
    })))
}
