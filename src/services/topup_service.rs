use crate::{
    config::PaymentsConfig,
    error::{ApiError, Result},
    services::ledger_service::LedgerService,
};
use hmac::{Hmac, Mac};
use sea_orm::{entity::*, DatabaseConnection};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Payment-gateway webhook event, as delivered on the wire.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    pub event: String,
    pub payload: PaymentPayload,
}

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub payment: PaymentWrapper,
}

#[derive(Debug, Deserialize)]
pub struct PaymentWrapper {
    pub entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub notes: PaymentNotes,
}

/// Metadata attached to the order at checkout time by the storefront.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotes {
    pub user_id: String,
    pub credits: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopupOutcome {
    /// Capture verified and credited; carries the new balance
    Credited { user_id: String, new_balance: i32 },
    /// Authentic event of a type we do not act on
    Ignored { event: String },
}

/// Applies verified payment events to the ledger. The only component that
/// calls `Ledger::credit`.
pub struct TopupService {
    db: DatabaseConnection,
    ledger: Arc<LedgerService>,
    config: PaymentsConfig,
}

impl TopupService {
    pub fn new(db: DatabaseConnection, ledger: Arc<LedgerService>, config: &PaymentsConfig) -> Self {
        Self {
            db,
            ledger,
            config: config.clone(),
        }
    }

    /// Verify and process a raw webhook delivery.
    ///
    /// The signature is HMAC-SHA256 over the raw body, hex-encoded, compared
    /// in constant time. Anything that fails verification is dropped before
    /// the ledger is touched.
    #[instrument(skip(self, body, signature))]
    pub async fn process_event(&self, body: &[u8], signature: Option<&str>) -> Result<TopupOutcome> {
        let signature = signature.ok_or_else(|| {
            warn!("Webhook rejected: missing signature header");
            ApiError::InvalidSignature
        })?;

        if !verify_signature(self.config.webhook_secret.as_bytes(), body, signature) {
            warn!("Webhook rejected: signature mismatch");
            return Err(ApiError::InvalidSignature);
        }

        let event: PaymentEvent = serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Malformed payment event: {}", e)))?;

        if event.event != "payment.captured" {
            info!("Ignoring payment event type: {}", event.event);
            return Ok(TopupOutcome::Ignored { event: event.event });
        }

        let notes = event.payload.payment.entity.notes;
        if notes.credits < 0 {
            return Err(ApiError::BadRequest(
                "Captured credit amount must be non-negative".to_string(),
            ));
        }

        // Balance first; a failed credit must not leave an audit row behind,
        // or the gateway's retry would record the purchase twice.
        let new_balance = self.ledger.credit(&notes.user_id, notes.credits).await?;

        let now = time::OffsetDateTime::now_utc();
        let purchase = entity::purchases::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(notes.user_id.clone()),
            credits: Set(notes.credits),
            created_at: Set(now),
        };
        purchase.insert(&self.db).await?;

        info!(
            "Processed payment capture: user={}, credits={}, new_balance={}",
            notes.user_id, notes.credits, new_balance
        );

        Ok(TopupOutcome::Credited {
            user_id: notes.user_id,
            new_balance,
        })
    }
}

/// Constant-time comparison of the hex-encoded HMAC-SHA256 of `body` against
/// the supplied signature.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = hex_encode(&mac.finalize().into_bytes());

    if expected.len() != signature.len() {
        return false;
    }

    expected
        .bytes()
        .zip(signature.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        out.push(HEX_CHARS[(byte >> 4) as usize] as char);
        out.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    out
}
