//! Role gate for administrator endpoints.
//!
//! Default-deny: an identity is admitted only when a role row tagged
//! `admin` exists for its account. No identity at all is a separate
//! outcome so the HTTP layer can answer 401 instead of 403.

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::models::enums::AppRole;
use crate::navigation::Route;
use crate::session::Identity;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Why access was granted (or denied), for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// Role row `admin` present.
    AdminRole,
    /// Signed in, but no admin role.
    MissingRole,
    /// No session.
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
    /// Where a denied client should be sent.
    pub redirect: Option<Route>,
}

impl AccessDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: AccessReason::AdminRole,
            redirect: None,
        }
    }

    fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
            redirect: Some(Route::Login),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Gate
// ═══════════════════════════════════════════════════════════

/// Decide whether `identity` may use administrator functions.
pub fn check_admin(
    conn: &Connection,
    identity: Option<&Identity>,
) -> Result<AccessDecision, DatabaseError> {
    let Some(identity) = identity else {
        return Ok(AccessDecision::deny(AccessReason::Unauthenticated));
    };

    if db::has_role(conn, &identity.account_id, AppRole::Admin)? {
        Ok(AccessDecision::allow())
    } else {
        tracing::warn!(account_id = %identity.account_id, "Admin access denied");
        Ok(AccessDecision::deny(AccessReason::MissingRole))
    }
}

pub fn is_admin(conn: &Connection, identity: &Identity) -> Result<bool, DatabaseError> {
    Ok(check_admin(conn, Some(identity))?.allowed)
}
