use axum::{extract::State, Json};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::Result,
    middleware::UserIdentity,
    models::{
        common::SuccessResponse,
        credits::{AccountData, AccountResponse, CreditCheckData, CreditCheckResponse},
    },
};

/// GET /api/v1/credits/check
///
/// Affordability check used by the UI to gate paid actions.
#[instrument(skip(state, identity))]
pub async fn check_credits(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<CreditCheckResponse>> {
    let check = state.ledger_service.can_spend(&identity.user_id).await?;

    Ok(Json(SuccessResponse::new(CreditCheckData {
        credits: check.balance,
        can_make_request: check.can_make_request,
    })))
}

/// POST /api/v1/account
///
/// Idempotent first-visit bootstrap: creates the account with the signup
/// grant if it does not exist yet.
#[instrument(skip(state, identity))]
pub async fn bootstrap_account(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<AccountResponse>> {
    let account = state.ledger_service.ensure_account(&identity.user_id).await?;

    Ok(Json(SuccessResponse::new(AccountData {
        user_id: account.user_id,
        total_credit: account.total_credit,
    })))
}
