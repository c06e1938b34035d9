pub use super::accounts::Entity as Accounts;
pub use super::ai_outputs::Entity as AiOutputs;
pub use super::poll_options::Entity as PollOptions;
pub use super::polls::Entity as Polls;
pub use super::purchases::Entity as Purchases;
pub use super::votes::Entity as Votes;
