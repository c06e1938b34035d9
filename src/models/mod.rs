// Request/Response models
pub mod common;
pub mod content;
pub mod credits;
pub mod media;
pub mod polls;
