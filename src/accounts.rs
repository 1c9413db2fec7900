//! Sign-up, sign-in and sign-out.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization;
use crate::core_state::CoreState;
use crate::crypto::{self, CryptoError, PasswordHash, SALT_LENGTH};
use crate::db;
use crate::error::ServiceError;
use crate::models::enums::AppRole;
use crate::models::{Account, AccountCredentials};
use crate::navigation::{landing_route, Route};
use crate::session::Identity;
use crate::validation::{non_blank, validate_email, RequiredFields};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    /// Admin sign-in flavour: only accounts holding the admin role pass.
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInOutcome {
    pub token: String,
    pub identity: Identity,
    pub is_admin: bool,
    pub redirect: Route,
}

/// Validated sign-up with the password already derived.
pub struct PendingAccount {
    email: String,
    full_name: Option<String>,
    hash: PasswordHash,
}

/// Validate a sign-up form and derive its password hash. Touches no shared
/// state, so callers run it before locking the store.
pub fn prepare_sign_up(form: SignUpForm) -> Result<PendingAccount, ServiceError> {
    RequiredFields::new()
        .check("email", &form.email)
        .check("password", &form.password)
        .finish()?;
    let email = form.email.trim().to_string();
    validate_email(&email)?;

    Ok(PendingAccount {
        hash: PasswordHash::create(&form.password)?,
        full_name: non_blank(form.full_name),
        email,
    })
}

/// Create an account. Does not start a session.
///
/// The store lock is held only for the insert.
pub fn sign_up(core: &CoreState, form: SignUpForm) -> Result<Account, ServiceError> {
    let pending = prepare_sign_up(form)?;
    let conn = core.db()?;
    create_account(&conn, pending)
}

fn create_account(conn: &Connection, pending: PendingAccount) -> Result<Account, ServiceError> {
    let account = db::insert_account(
        conn,
        &Uuid::new_v4(),
        &pending.email,
        pending.full_name.as_deref(),
        pending.hash.hash_bytes(),
        pending.hash.salt(),
    )
    .map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::Conflict("An account with this email already exists".into())
        } else {
            e.into()
        }
    })?;

    tracing::info!(account_id = %account.id, "Account created");
    Ok(account)
}

/// Check a password against stored credentials. Unknown accounts burn the
/// same derivation cost as a real check and fail with the same error.
pub fn check_password(
    password: &str,
    found: Option<(Account, AccountCredentials)>,
) -> Result<Account, ServiceError> {
    let Some((account, credentials)) = found else {
        let _ = PasswordHash::derive(password, &[0u8; SALT_LENGTH]);
        return Err(CryptoError::WrongPassword.into());
    };
    crypto::verify_password(password, &credentials.password_hash, &credentials.password_salt)?;
    Ok(account)
}

/// Verify credentials and issue a bearer token.
///
/// The store is locked to fetch credentials, released while the password is
/// derived, then locked again for the role and profile lookups. With
/// `form.admin` set, a session is issued first and then revoked if the
/// account lacks the admin role.
pub fn sign_in(core: &CoreState, form: SignInForm) -> Result<SignInOutcome, ServiceError> {
    let found = db::get_credentials_by_email(&*core.db()?, form.email.trim())?;
    let account = check_password(&form.password, found)?;

    let identity = Identity {
        account_id: account.id,
        email: account.email,
    };
    let (is_admin, has_profile) = {
        let conn = core.db()?;
        (
            authorization::is_admin(&conn, &identity)?,
            db::get_donor_by_user(&conn, &identity.account_id)?.is_some(),
        )
    };

    let token = core.start_session(identity.clone())?;

    if form.admin && !is_admin {
        core.end_session(&token)?;
        tracing::warn!(account_id = %identity.account_id, "Admin sign-in refused");
        return Err(ServiceError::Forbidden("Not authorized as admin".into()));
    }

    tracing::info!(account_id = %identity.account_id, admin = form.admin, "Signed in");
    Ok(SignInOutcome {
        token,
        redirect: landing_route(form.admin, has_profile),
        identity,
        is_admin,
    })
}

/// Revoke a bearer token. Returns whether it was live.
pub fn sign_out(core: &CoreState, token: &str) -> Result<bool, ServiceError> {
    let revoked = core.end_session(token)?;
    tracing::info!(revoked, "Signed out");
    Ok(revoked)
}

/// Grant the admin role to an existing account (operator command).
pub fn promote_to_admin(conn: &Connection, email: &str) -> Result<Account, ServiceError> {
    let (account, _) = db::get_credentials_by_email(conn, email.trim())?
        .ok_or_else(|| ServiceError::NotFound(format!("No account for {email}")))?;
    db::grant_role(conn, &account.id, AppRole::Admin)?;
    tracing::info!(account_id = %account.id, "Admin role granted");
    Ok(account)
}
