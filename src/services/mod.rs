// Service modules
pub mod generation_service;
pub mod ledger_service;
pub mod poll_service;
pub mod topup_service;
pub mod transcription_service;

pub use generation_service::GenerationService;
pub use ledger_service::LedgerService;
pub use poll_service::PollService;
pub use topup_service::{TopupOutcome, TopupService};
pub use transcription_service::TranscriptionService;
