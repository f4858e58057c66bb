use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{Role, User},
    repository::RepositoryState,
};

/// Name of the cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "session";

// --- Password Hashing ---

/// hash_password
///
/// Produces an Argon2id PHC string (`$argon2id$v=19$...`) with a fresh random salt.
/// The plaintext is never stored or logged.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// check_password
///
/// True only when `candidate` is the exact password `hash` was produced from.
/// A malformed hash verifies nothing.
pub fn check_password(hash: &str, candidate: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    })
}

// --- Session Tokens ---

/// Claims
///
/// Payload of the session token stored in the `session` cookie, signed with
/// `AppConfig::session_secret`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a string per the JWT convention.
    pub sub: String,
    /// Expiration time (seconds since epoch). Expired tokens are rejected.
    pub exp: usize,
    /// Issued-at time (seconds since epoch).
    pub iat: usize,
}

/// issue_session
///
/// Signs a session token for `user_id` that expires after `config.session_ttl`.
pub fn issue_session(user_id: i64, config: &AppConfig) -> AppResult<String> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now.saturating_add(config.session_ttl.as_secs() as usize),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("session signing failed: {e}")))
}

/// verify_session
///
/// Checks signature and expiry and returns the user id the token was issued for.
/// Any failure (bad signature, expired, malformed) means "not logged in".
pub fn verify_session(token: &str, secret: &str) -> AppResult<i64> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("session rejected: {e}");
        AppError::Unauthenticated
    })?;

    data.claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthenticated)
}

/// The `Set-Cookie` value that establishes a session. `Secure` is only set in production
/// so plain-HTTP local development keeps working.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.env == Env::Production)
        .build()
}

/// Removes the session cookie from the client.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

// --- Current Identity ---

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers take it as an argument
/// instead of reading any ambient "current user".
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Reads the `session` cookie.
/// 2. Verifies the token signature and expiry.
/// 3. Loads the user from the repository, so a deleted user loses access immediately.
///
/// Rejection: `AppError::Unauthenticated`, which redirects to `/login` with a notice.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let user_id = verify_session(&token, &config.session_secret)?;

        let user = repo
            .get_user(user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(AuthUser::from(&user))
    }
}
