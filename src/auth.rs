//! Password hashing, token issuance and token validation.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::storage::{Storage, StorageRead, StorageTx, StorageWrite};
use crate::types::{Token, TokenKind, User, UserForm};

pub const TOKEN_HEADER: &str = "X-Medialog-Token";
pub const SESSION_COOKIE: &str = "medialog-session";
pub const TOKEN_LIFETIME_HOURS: i64 = 3;

const SALT_LEN: usize = 16;
const TOKEN_SEED_LEN: usize = 24;
const RUNES: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890!@#$%^&*()_+{}[]:;<>,.?/";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token provided")]
    MissingToken,
    #[error("token not found")]
    UnknownToken,
    #[error("token is expired")]
    ExpiredToken,
    #[error("token is not a {0} token")]
    WrongKind(TokenKind),
    #[error("user is not active")]
    InactiveUser,
    #[error("password is required")]
    MissingPassword,
    #[error("email is required")]
    MissingEmail,
    #[error("invalid email or password")]
    BadCredentials,
    #[error("user is not allowed to access the api")]
    NoApiAccess,
    #[error("user is not an administrator")]
    NotAdmin,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn random_runes(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| *RUNES.choose(&mut rng).unwrap_or(&b'x') as char)
        .collect()
}

pub fn generate_salt() -> String {
    random_runes(SALT_LEN)
}

/// hex(SHA-512(password ‖ salt))
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares digests in constant time.
pub fn verify_password(user: &User, password: &str) -> bool {
    let candidate = hash_password(password, &user.salt);
    candidate
        .as_bytes()
        .ct_eq(user.encrypted_password.as_bytes())
        .into()
}

/// hex(SHA-512(seed))
fn token_from_seed(seed: &str) -> String {
    hex::encode(Sha512::digest(seed.as_bytes()))
}

pub fn generate_token() -> String {
    token_from_seed(&random_runes(TOKEN_SEED_LEN))
}

/// Build an unsaved user with a fresh salt and hashed password.
pub fn new_user(form: &UserForm, creator_id: i64, now: DateTime<Utc>) -> Result<User, AuthError> {
    if form.email.trim().is_empty() {
        return Err(AuthError::MissingEmail);
    }
    if form.password.is_empty() {
        return Err(AuthError::MissingPassword);
    }
    let salt = generate_salt();
    let hash = hash_password(&form.password, &salt);
    Ok(User::new(form, salt, hash, creator_id, now))
}

pub fn set_password(
    user: &mut User,
    password: &str,
    by: i64,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::MissingPassword);
    }
    user.salt = generate_salt();
    user.encrypted_password = hash_password(password, &user.salt);
    user.updated_at = now;
    user.updated_by = by;
    Ok(())
}

/// Invalidate the user's other tokens of `kind` and store a new one, in one
/// transaction.
pub fn issue_token<S: Storage>(
    storage: &S,
    user_id: i64,
    kind: TokenKind,
    now: DateTime<Utc>,
) -> anyhow::Result<Token> {
    let mut token = Token {
        id: 0,
        token: generate_token(),
        user_id,
        is_valid: true,
        expires: now + Duration::hours(TOKEN_LIFETIME_HOURS),
        kind,
    };
    let tx = storage.begin_tx()?;
    let expired = tx.expire_user_tokens(user_id, kind)?;
    token.id = tx.insert_token(&token)?;
    tx.commit()?;
    log::debug!(
        "issued {} token for user {} ({} previous invalidated)",
        kind,
        user_id,
        expired
    );
    Ok(token)
}

/// Check credentials, record the sign-in and issue a token of `kind`.
pub fn login<S: Storage>(
    storage: &S,
    email: &str,
    password: Option<&str>,
    kind: TokenKind,
    ip: &str,
    now: DateTime<Utc>,
) -> Result<(User, Token), AuthError> {
    let password = match password {
        Some(p) if !p.is_empty() => p,
        _ => return Err(AuthError::MissingPassword),
    };
    let mut user = storage
        .load_user_by_email(email.trim())?
        .ok_or(AuthError::BadCredentials)?;
    if !verify_password(&user, password) {
        return Err(AuthError::BadCredentials);
    }
    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }
    if kind == TokenKind::Api && !user.can_access_api {
        return Err(AuthError::NoApiAccess);
    }
    user.record_sign_in(ip, now);
    storage.update_user(&user)?;
    let token = issue_token(storage, user.id, kind, now)?;
    log::info!("🔑 {} signed in ({})", user.email, kind);
    Ok((user, token))
}

/// Resolve a presented token to its user. Stale tokens are swept first so
/// an expired token is never accepted.
pub fn authenticate<S: StorageRead + StorageWrite>(
    storage: &S,
    presented: Option<&str>,
    kind: TokenKind,
    now: DateTime<Utc>,
) -> Result<(User, Token), AuthError> {
    let swept = storage.expire_stale_tokens(now)?;
    if swept > 0 {
        log::debug!("expired {} stale tokens", swept);
    }
    let presented = match presented.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AuthError::MissingToken),
    };
    let token = storage
        .load_token(presented)?
        .ok_or(AuthError::UnknownToken)?;
    if !token.is_valid || token.is_expired(now) {
        return Err(AuthError::ExpiredToken);
    }
    if token.kind != kind {
        return Err(AuthError::WrongKind(kind));
    }
    let user = storage
        .load_user(token.user_id)?
        .ok_or(AuthError::UnknownToken)?;
    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }
    Ok((user, token))
}
