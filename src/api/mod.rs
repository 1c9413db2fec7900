//! HTTP JSON API.
//!
//! Routes are nested under `/api/` and protected by a middleware stack:
//! Audit → Rate Limit (credential routes) → Session → Admin gate → Handler.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{api_router, api_router_with_context};
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;
