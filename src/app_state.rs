use crate::{
    config::Config,
    services::{GenerationService, LedgerService, PollService, TopupService, TranscriptionService},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: Arc<redis::Client>,
    pub ledger_service: Arc<LedgerService>,
    pub topup_service: Arc<TopupService>,
    pub generation_service: Arc<GenerationService>,
    pub transcription_service: Arc<TranscriptionService>,
    pub poll_service: Arc<PollService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let db = sea_orm::Database::connect(&config.database.url).await?;

        // Connect to Redis
        let redis = Arc::new(redis::Client::open(config.redis.url.as_str())?);

        // Initialize services; the ledger is the only component with write
        // access to account balances
        let ledger_service = Arc::new(LedgerService::new(db.clone(), &config.ledger));
        let topup_service = Arc::new(TopupService::new(
            db.clone(),
            ledger_service.clone(),
            &config.payments,
        ));
        let generation_service = Arc::new(GenerationService::new(&config.ai));
        let transcription_service = Arc::new(TranscriptionService::new(&config.transcription));
        let poll_service = Arc::new(PollService::new(db.clone()));

        Ok(Self {
            db,
            redis,
            ledger_service,
            topup_service,
            generation_service,
            transcription_service,
            poll_service,
            config: Arc::new(config),
        })
    }
}
