//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting on `POST /login` only (governor)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! public routes never touch the token store.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::RequireAuth;
pub use rate_limit::{json_rate_limit_response, login_rate_limiter};
pub use request_id::request_id_middleware;
