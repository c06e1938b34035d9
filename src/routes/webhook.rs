use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::Result,
    models::common::MessageResponse,
    services::topup_service::TopupOutcome,
};

/// POST /api/v1/webhooks/payment
///
/// Unauthenticated; trust is established by the HMAC signature over the raw
/// body. Non-capture events are acknowledged so the gateway stops retrying.
#[instrument(skip(state, headers, body))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let signature = headers
        .get("x-payment-signature")
        .and_then(|v| v.to_str().ok());

    let outcome = state.topup_service.process_event(&body, signature).await?;

    let message = match outcome {
        TopupOutcome::Credited { .. } => MessageResponse::new("Success"),
        TopupOutcome::Ignored { event } => MessageResponse::new(format!("Ignored event: {}", event)),
    };

    Ok((StatusCode::OK, Json(message)))
}
