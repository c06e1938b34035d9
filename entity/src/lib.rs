pub mod prelude;

pub mod accounts;
pub mod ai_outputs;
pub mod poll_options;
pub mod polls;
pub mod purchases;
pub mod votes;
