/// Ledger deduction semantics against a real database: conservation,
/// truncation, the zero-balance hard stop, and the account-creation grant.
use contentforge::services::LedgerService;
use contentforge::ApiError;

use super::{seed_account, setup_test_db, test_ledger_config, unique_user};

#[tokio::test]
#[ignore] // Run only when database is available
async fn deduct_exact_cost_conserves_balance() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();
    seed_account(&db, &user_id, 1_000).await;

    let deduction = ledger
        .deduct(&user_id, 400, "some generated text".to_string())
        .await
        .expect("deduct failed");

    assert_eq!(deduction.charged, 400);
    assert!(!deduction.truncated);
    assert_eq!(deduction.balance_after, 600);
    assert_eq!(deduction.payload, "some generated text");

    let check = ledger.can_spend(&user_id).await.unwrap();
    assert_eq!(check.balance, 600);
    assert!(check.can_make_request);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn deduct_does_not_touch_other_accounts() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let spender = unique_user();
    let bystander = unique_user();
    seed_account(&db, &spender, 500).await;
    seed_account(&db, &bystander, 500).await;

    ledger.deduct(&spender, 200, ()).await.unwrap();

    assert_eq!(ledger.can_spend(&spender).await.unwrap().balance, 300);
    assert_eq!(ledger.can_spend(&bystander).await.unwrap().balance, 500);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn partial_fulfillment_truncates_payload_and_zeroes_balance() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();
    seed_account(&db, &user_id, 7).await;

    let deduction = ledger
        .deduct(&user_id, 20, "twenty characters!!!".to_string())
        .await
        .expect("partial fulfillment must succeed");

    assert_eq!(deduction.charged, 7);
    assert!(deduction.truncated);
    assert_eq!(deduction.balance_after, 0);
    assert_eq!(deduction.payload, "twenty ");

    let check = ledger.can_spend(&user_id).await.unwrap();
    assert_eq!(check.balance, 0);
    assert!(!check.can_make_request);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn zero_balance_is_a_hard_stop() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();
    seed_account(&db, &user_id, 0).await;

    let result = ledger.deduct(&user_id, 1, ()).await;
    assert!(matches!(result, Err(ApiError::NoCreditsAvailable)));

    // Balance unchanged, regardless of the requested cost
    let result = ledger.deduct(&user_id, 1_000_000, ()).await;
    assert!(matches!(result, Err(ApiError::NoCreditsAvailable)));
    assert_eq!(ledger.can_spend(&user_id).await.unwrap().balance, 0);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn unknown_account_is_rejected() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();

    let check = ledger.can_spend(&user_id).await;
    assert!(matches!(check, Err(ApiError::AccountNotFound(_))));

    let result = ledger.deduct(&user_id, 10, ()).await;
    assert!(matches!(result, Err(ApiError::AccountNotFound(_))));
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn ensure_account_applies_signup_grant_once() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();

    let account = ledger.ensure_account(&user_id).await.unwrap();
    assert_eq!(account.total_credit, 10_000);

    // Second visit is a no-op
    let account = ledger.ensure_account(&user_id).await.unwrap();
    assert_eq!(account.total_credit, 10_000);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn credit_increments_existing_account() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();
    seed_account(&db, &user_id, 250).await;

    let new_balance = ledger.credit(&user_id, 10_000).await.unwrap();
    assert_eq!(new_balance, 10_250);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn credit_creates_missing_account_with_grant() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();

    // First payment before first visit: signup grant + payment amount
    let new_balance = ledger.credit(&user_id, 10_000).await.unwrap();
    assert_eq!(new_balance, 20_000);
}

/// End to end: a 10_000-credit account generating 12_000 characters pays its
/// whole balance, keeps the affordable prefix, and is then hard-stopped.
#[tokio::test]
#[ignore] // Run only when database is available
async fn generation_over_balance_truncates_then_blocks() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();
    seed_account(&db, &user_id, 10_000).await;

    let description: String = "x".repeat(12_000);
    let deduction = ledger
        .deduct(&user_id, 12_000, description)
        .await
        .expect("truncating deduct must succeed");

    assert_eq!(deduction.charged, 10_000);
    assert!(deduction.truncated);
    assert_eq!(deduction.payload.chars().count(), 10_000);
    assert_eq!(deduction.balance_after, 0);

    let second = ledger.deduct(&user_id, 100, "more".to_string()).await;
    assert!(matches!(second, Err(ApiError::NoCreditsAvailable)));
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn credit_overflow_is_rejected() {
    let db = setup_test_db().await;
    let ledger = LedgerService::new(db.clone(), &test_ledger_config());

    let user_id = unique_user();
    seed_account(&db, &user_id, i32::MAX - 10).await;

    let result = ledger.credit(&user_id, 100).await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    // Balance untouched by the rejected top-up
    assert_eq!(
        ledger.can_spend(&user_id).await.unwrap().balance,
        i32::MAX - 10
    );
}
