// Middleware modules
pub mod auth;
pub mod logging;
pub mod rate_limit;

// Export auth middleware components
pub use auth::{auth_middleware, UserIdentity};

// Export rate limit middleware components
pub use rate_limit::create_rate_limiter;

// Export logging middleware
pub use logging::logging_middleware;
