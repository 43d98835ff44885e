pub mod auth;
pub mod rate_limit;

pub use auth::{require_admin, require_user, Claims, Role};
pub use rate_limit::rate_limit_middleware;
