//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Audit logger (whole router, fallbacks included)
//! 2. Rate limiter (credential routes only)
//! 3. Session resolver, then the admin role gate on `/api/admin`

pub mod audit;
pub mod auth;
pub mod rate;
