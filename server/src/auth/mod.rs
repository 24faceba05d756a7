mod middleware;
mod tokens;

pub use middleware::require_auth;
pub use tokens::ApiTokens;
