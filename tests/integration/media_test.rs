/// Transcription endpoint charging behavior: the flat fee is only taken once
/// the provider delivers, so a failed provider call costs the user nothing.
use axum::{extract::State, Json};
use contentforge::{
    app_state::AppState,
    config::{
        AIConfig, AuthConfig, Config, DatabaseConfig, PaymentsConfig, RedisConfig, ServerConfig,
        TranscriptionConfig,
    },
    middleware::UserIdentity,
    models::media::TranscribeRequest,
    routes,
    services::{GenerationService, LedgerService, PollService, TopupService, TranscriptionService},
    ApiError,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::{seed_account, setup_test_db, test_ledger_config, unique_user};

// Providers point at a closed local port so every call fails fast.
fn test_state(db: DatabaseConnection) -> AppState {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
        },
        redis: RedisConfig {
            url: "redis://127.0.0.1".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
        },
        payments: PaymentsConfig {
            webhook_secret: "test-secret".to_string(),
        },
        ledger: test_ledger_config(),
        ai: AIConfig {
            api_key: "test".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            model: "test".to_string(),
            request_timeout_ms: 1_000,
            retry_attempts: 0,
        },
        transcription: TranscriptionConfig {
            api_key: "test".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            poll_interval_ms: 10,
            max_poll_attempts: 1,
        },
    };

    let ledger_service = Arc::new(LedgerService::new(db.clone(), &config.ledger));
    let topup_service = Arc::new(TopupService::new(
        db.clone(),
        ledger_service.clone(),
        &config.payments,
    ));
    let generation_service = Arc::new(GenerationService::new(&config.ai));
    let transcription_service = Arc::new(TranscriptionService::new(&config.transcription));
    let poll_service = Arc::new(PollService::new(db.clone()));

    AppState {
        db,
        redis: Arc::new(redis::Client::open("redis://127.0.0.1").unwrap()),
        ledger_service,
        topup_service,
        generation_service,
        transcription_service,
        poll_service,
        config: Arc::new(config),
    }
}

fn transcribe_request() -> TranscribeRequest {
    TranscribeRequest {
        audio_url: "https://example.com/audio.mp3".to_string(),
        language: None,
        target_language: None,
    }
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn failed_transcription_charges_nothing() {
    let db = setup_test_db().await;
    let state = test_state(db.clone());

    let user_id = unique_user();
    seed_account(&db, &user_id, 5_000).await;

    let result = routes::media::transcribe(
        State(state),
        UserIdentity {
            user_id: user_id.clone(),
        },
        Json(transcribe_request()),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Provider(_))));

    let ledger = LedgerService::new(db, &test_ledger_config());
    assert_eq!(ledger.can_spend(&user_id).await.unwrap().balance, 5_000);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn empty_account_is_blocked_before_the_provider_call() {
    let db = setup_test_db().await;
    let state = test_state(db.clone());

    let user_id = unique_user();
    seed_account(&db, &user_id, 0).await;

    let result = routes::media::transcribe(
        State(state),
        UserIdentity {
            user_id: user_id.clone(),
        },
        Json(transcribe_request()),
    )
    .await;

    // The affordability gate answers before the (failing) provider is called
    assert!(matches!(result, Err(ApiError::NoCreditsAvailable)));
}
