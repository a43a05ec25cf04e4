use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest};
use super::password::{hash_password, verify_against_dummy, verify_password};
use super::repo_types::User;
use crate::db::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
const EMAIL_TAKEN: &str = "Email already registered";
const MISSING_CREDENTIALS: &str = "Email and password required";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Present and non-empty, otherwise treated as missing.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

fn credentials(email: Option<String>, password: Option<String>) -> AppResult<(String, String)> {
    match (present(email), present(password)) {
        (Some(e), Some(p)) => Ok((e, p)),
        _ => Err(AppError::validation(MISSING_CREDENTIALS)),
    }
}

fn issue(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let token = state
        .jwt
        .sign(user.id, &user.email)
        .context("sign token")?;
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

/// Registers a new user and returns it with a fresh token.
pub async fn signup(state: &AppState, req: SignupRequest) -> AppResult<AuthResponse> {
    let (email, password) = credentials(req.email, req.password)?;

    if !is_valid_email(&email) {
        warn!("signup: invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!("signup: email already registered");
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("join hash task")??;

    let name = present(req.name.map(|n| n.trim().to_owned()));
    let user = match User::create(&state.db, name.as_deref(), &email, &hash).await {
        Ok(u) => u,
        // lost a race with a concurrent signup for the same email
        Err(e) if is_unique_violation(&e) => {
            warn!("signup: email taken during insert");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "user registered");
    issue(state, user)
}

/// A stored hash that cannot be parsed counts as a mismatch, so the caller
/// sees the same 401 as for a wrong password.
fn password_matches(plain: &str, stored: &str, user_id: Uuid) -> bool {
    verify_password(plain, stored).unwrap_or_else(|e| {
        error!(%user_id, error = %e, "login: stored password hash is unreadable");
        false
    })
}

/// Verifies credentials. Unknown email and wrong password are indistinguishable to the caller.
pub async fn authenticate(state: &AppState, req: LoginRequest) -> AppResult<AuthResponse> {
    let (email, password) = credentials(req.email, req.password)?;

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        tokio::task::spawn_blocking(move || verify_against_dummy(&password))
            .await
            .context("join verify task")?;
        warn!("login: unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    let stored = user.password_hash.clone();
    let user_id = user.id;
    let ok = tokio::task::spawn_blocking(move || password_matches(&password, &stored, user_id))
        .await
        .context("join verify task")?;

    if !ok {
        warn!(user_id = %user.id, "login: invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, "user logged in");
    issue(state, user)
}

/// Loads the caller's own record; the only place the store is asked whether the token's user still exists.
pub async fn current_user(state: &AppState, user_id: Uuid) -> AppResult<PublicUser> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "me: user no longer exists");
            AppError::not_found("User not found")
        })?;
    Ok(user.into())
}
