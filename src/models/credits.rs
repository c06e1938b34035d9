use serde::Serialize;

use super::common::SuccessResponse;

/// Response for GET /credits/check
pub type CreditCheckResponse = SuccessResponse<CreditCheckData>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCheckData {
    pub credits: i32,
    pub can_make_request: bool,
}

/// Response for POST /account (idempotent bootstrap)
pub type AccountResponse = SuccessResponse<AccountData>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub user_id: String,
    pub total_credit: i32,
}
