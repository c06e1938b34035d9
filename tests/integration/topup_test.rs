/// Webhook top-up flow against a real database: verified captures credit the
/// ledger and leave an audit trail, everything else is dropped or ignored.
use contentforge::config::PaymentsConfig;
use contentforge::services::{topup_service::verify_signature, LedgerService, TopupOutcome, TopupService};
use contentforge::ApiError;
use hmac::{Hmac, Mac};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sha2::Sha256;
use std::sync::Arc;

use super::{seed_account, setup_test_db, test_ledger_config, unique_user};

const WEBHOOK_SECRET: &str = "test-webhook-secret";

fn test_topup_service(db: sea_orm::DatabaseConnection) -> TopupService {
    let ledger = Arc::new(LedgerService::new(db.clone(), &test_ledger_config()));
    let config = PaymentsConfig {
        webhook_secret: WEBHOOK_SECRET.to_string(),
    };
    TopupService::new(db, ledger, &config)
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body);
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn captured_event(user_id: &str, credits: i32) -> String {
    format!(
        r#"{{"event":"payment.captured","payload":{{"payment":{{"entity":{{"notes":{{"userId":"{}","credits":{}}}}}}}}}}}"#,
        user_id, credits
    )
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn verified_capture_credits_existing_account() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    seed_account(&db, &user_id, 300).await;

    let body = captured_event(&user_id, 10_000);
    let signature = sign(body.as_bytes());

    let outcome = service
        .process_event(body.as_bytes(), Some(&signature))
        .await
        .expect("capture failed");

    assert_eq!(
        outcome,
        TopupOutcome::Credited {
            user_id: user_id.clone(),
            new_balance: 10_300,
        }
    );
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn first_capture_creates_account_with_grant() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    let body = captured_event(&user_id, 5_000);
    let signature = sign(body.as_bytes());

    let outcome = service
        .process_event(body.as_bytes(), Some(&signature))
        .await
        .expect("capture failed");

    // Signup grant plus the purchased amount
    assert_eq!(
        outcome,
        TopupOutcome::Credited {
            user_id: user_id.clone(),
            new_balance: 15_000,
        }
    );
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn capture_writes_purchase_audit_row() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    let body = captured_event(&user_id, 2_500);
    let signature = sign(body.as_bytes());

    service
        .process_event(body.as_bytes(), Some(&signature))
        .await
        .expect("capture failed");

    let purchases = entity::purchases::Entity::find()
        .filter(entity::purchases::Column::UserId.eq(user_id.as_str()))
        .all(&db)
        .await
        .unwrap();

    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].credits, 2_500);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn non_capture_event_is_ignored() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    seed_account(&db, &user_id, 100).await;

    let body = format!(
        r#"{{"event":"payment.failed","payload":{{"payment":{{"entity":{{"notes":{{"userId":"{}","credits":9999}}}}}}}}}}"#,
        user_id
    );
    let signature = sign(body.as_bytes());

    let outcome = service
        .process_event(body.as_bytes(), Some(&signature))
        .await
        .expect("ignored event must not error");

    assert_eq!(
        outcome,
        TopupOutcome::Ignored {
            event: "payment.failed".to_string(),
        }
    );

    let ledger = LedgerService::new(db, &test_ledger_config());
    assert_eq!(ledger.can_spend(&user_id).await.unwrap().balance, 100);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn missing_signature_is_rejected_before_any_write() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    let body = captured_event(&user_id, 1_000);

    let result = service.process_event(body.as_bytes(), None).await;
    assert!(matches!(result, Err(ApiError::InvalidSignature)));

    let ledger = LedgerService::new(db, &test_ledger_config());
    assert!(matches!(
        ledger.can_spend(&user_id).await,
        Err(ApiError::AccountNotFound(_))
    ));
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn forged_signature_is_rejected() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    let body = captured_event(&user_id, 1_000);

    // Sanity check the forgery actually differs from the real signature
    let forged = sign(b"different body");
    assert!(!verify_signature(
        WEBHOOK_SECRET.as_bytes(),
        body.as_bytes(),
        &forged
    ));

    let result = service.process_event(body.as_bytes(), Some(&forged)).await;
    assert!(matches!(result, Err(ApiError::InvalidSignature)));
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn rejected_capture_leaves_no_audit_row() {
    let db = setup_test_db().await;
    let service = test_topup_service(db.clone());

    let user_id = unique_user();
    let body = captured_event(&user_id, -500);
    let signature = sign(body.as_bytes());

    let result = service.process_event(body.as_bytes(), Some(&signature)).await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    // No credit happened, so no purchase may be on record either
    let purchases = entity::purchases::Entity::find()
        .filter(entity::purchases::Column::UserId.eq(user_id.as_str()))
        .all(&db)
        .await
        .unwrap();
    assert!(purchases.is_empty());

    let ledger = LedgerService::new(db, &test_ledger_config());
    assert!(matches!(
        ledger.can_spend(&user_id).await,
        Err(ApiError::AccountNotFound(_))
    ));
}
