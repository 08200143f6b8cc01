use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use rand::{thread_rng, RngCore};
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::Account;
use crate::repositories::RepositoryError;
use crate::AppState;

// --- Session storage ---

const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7); // 7 days
const RESET_TOKEN_TTL: Duration = Duration::from_secs(60 * 30); // 30 minutes
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);
const TOKEN_LENGTH: usize = 32; // bytes of entropy per token

// TODO: move sessions and reset tokens into the database so they survive
// restarts when running more than one instance.

/// The session's view of a signed-in user, as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl SessionUser {
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            photo_url: account.photo_url.clone(),
        }
    }

    /// Display name with the email-prefix fallback used everywhere identity
    /// is stamped onto stored documents.
    pub fn name_or_email_prefix(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.email.split('@').next().unwrap_or("").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
struct ResetEntry {
    account_id: Uuid,
    expires_at: Instant,
}

/// Opaque bearer tokens mapped to signed-in users, plus outstanding
/// password-reset tokens. Concurrent access via DashMap.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionEntry>>,
    reset_tokens: Arc<DashMap<String, ResetEntry>>,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttls(SESSION_TTL, RESET_TOKEN_TTL)
    }

    pub fn with_ttls(session_ttl: Duration, reset_ttl: Duration) -> Self {
        let store = Self {
            sessions: Arc::new(DashMap::new()),
            reset_tokens: Arc::new(DashMap::new()),
            session_ttl,
            reset_ttl,
        };
        // Background task to drop expired entries periodically.
        let store_clone = store.clone();
        tokio::spawn(async move {
            store_clone.purge_expired_periodically().await;
        });
        store
    }

    fn generate_token() -> String {
        let mut bytes = vec![0u8; TOKEN_LENGTH];
        thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Start a session for `user` and return its bearer token.
    pub fn create_session(&self, user: SessionUser) -> String {
        let token = Self::generate_token();
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                user,
                expires_at: Instant::now() + self.session_ttl,
            },
        );
        token
    }

    /// Look up the user behind a token. Expired sessions are dropped on
    /// contact and resolve to None.
    pub fn resolve(&self, token: &str) -> Option<SessionUser> {
        // Clone out before any removal; holding a map guard across a remove
        // on the same shard would deadlock.
        let entry = self.sessions.get(token).map(|e| e.value().clone())?;
        if entry.expires_at > Instant::now() {
            Some(entry.user)
        } else {
            self.sessions.remove(token);
            None
        }
    }

    /// Returns true when the token named a live session.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every session belonging to `account_id`.
    pub fn revoke_sessions_for(&self, account_id: Uuid) {
        self.sessions.retain(|_, entry| entry.user.id != account_id);
    }

    /// Issue a single-use password-reset token for `account_id`.
    pub fn issue_reset_token(&self, account_id: Uuid) -> String {
        let token = Self::generate_token();
        self.reset_tokens.insert(
            token.clone(),
            ResetEntry {
                account_id,
                expires_at: Instant::now() + self.reset_ttl,
            },
        );
        token
    }

    /// Atomically consume a reset token, yielding its account when the token
    /// is live. A consumed or expired token yields None.
    pub fn consume_reset_token(&self, token: &str) -> Option<Uuid> {
        self.reset_tokens
            .remove_if(token, |_, entry| entry.expires_at > Instant::now())
            .map(|(_token, entry)| entry.account_id)
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        self.reset_tokens.retain(|_, entry| entry.expires_at > now);
    }

    async fn purge_expired_periodically(&self) {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            self.purge_expired();
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// --- Password hashing ---

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

// --- Error types ---

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Missing or invalid authorization header")]
    MissingOrInvalidHeader,

    #[error("Invalid or expired session")]
    InvalidOrExpiredSession,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

// --- Authenticated user extractor ---

/// Extracted when the request carries a live session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub SessionUser);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingOrInvalidHeader)?;
        let user = app_state
            .sessions
            .resolve(token)
            .ok_or(AuthError::InvalidOrExpiredSession)?;
        Ok(AuthenticatedUser(user))
    }
}

// --- Auth endpoints ---

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetRequestPayload {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmPayload {
    pub token: String,
    pub password: String,
}

/// Handler to register a new account with email, password and display name.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Response {
    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return (StatusCode::BAD_REQUEST, "Please enter a valid email address").into_response();
    }
    if payload.password.chars().count() < 6 {
        return (StatusCode::BAD_REQUEST, "Password must be at least 6 characters").into_response();
    }
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Please enter your name").into_response();
    }

    match state.accounts.find_by_email(&email).await {
        Ok(Some(_)) => {
            return (StatusCode::CONFLICT, "An account with this email already exists")
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing account");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account").into_response();
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account").into_response();
        }
    };

    let account = match state.accounts.create(&email, &password_hash).await {
        Ok(account) => account,
        Err(RepositoryError::Conflict(_)) => {
            return (StatusCode::CONFLICT, "An account with this email already exists")
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to create account");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account").into_response();
        }
    };

    // Display name is applied after creation, matching the identity
    // provider's create-then-update-profile contract.
    let account = match state.accounts.update_display_name(account.id, &name).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            warn!(account_id = %account.id, "Account vanished while setting display name");
            account
        }
        Err(e) => {
            error!(error = %e, account_id = %account.id, "Failed to set display name");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account").into_response();
        }
    };

    let user = SessionUser::from_account(&account);
    let token = state.sessions.create_session(user.clone());
    info!(user_id = %user.id, "Registered new account");
    (StatusCode::CREATED, Json(AuthResponse { token, user })).into_response()
}

/// Handler to sign in with email and password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let email = payload.email.trim().to_lowercase();

    let account = match state.accounts.find_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, "Invalid email or password").into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to look up account during login");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to sign in").into_response();
        }
    };

    if !verify_password(&payload.password, &account.password_hash) {
        return (StatusCode::UNAUTHORIZED, "Invalid email or password").into_response();
    }

    let user = SessionUser::from_account(&account);
    let token = state.sessions.create_session(user.clone());
    info!(user_id = %user.id, "User signed in");
    (StatusCode::OK, Json(AuthResponse { token, user })).into_response()
}

/// Handler to end the current session.
pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) if state.sessions.revoke(token) => {
            (StatusCode::OK, "Signed out successfully").into_response()
        }
        _ => AuthError::InvalidOrExpiredSession.into_response(),
    }
}

/// Handler returning the signed-in user, so pages can update their
/// navigation state.
pub async fn me_handler(user: AuthenticatedUser) -> Json<SessionUser> {
    Json(user.0)
}

/// Handler to request a password reset. The response never reveals whether
/// an account exists; when it does, a single-use token is issued and handed
/// to the delivery channel via the log.
pub async fn reset_request_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequestPayload>,
) -> Response {
    let email = payload.email.trim().to_lowercase();
    match state.accounts.find_by_email(&email).await {
        Ok(Some(account)) => {
            let token = state.sessions.issue_reset_token(account.id);
            info!(account_id = %account.id, reset_token = %token, "Issued password reset token");
        }
        Ok(None) => {
            debug!("Password reset requested for unknown email");
        }
        Err(e) => {
            error!(error = %e, "Failed to look up account for password reset");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request")
                .into_response();
        }
    }
    (
        StatusCode::OK,
        "If an account exists for that address, a reset link has been issued",
    )
        .into_response()
}

/// Handler to complete a password reset with a previously issued token.
pub async fn reset_confirm_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetConfirmPayload>,
) -> Response {
    if payload.password.chars().count() < 6 {
        return (StatusCode::BAD_REQUEST, "Password must be at least 6 characters").into_response();
    }

    let account_id = match state.sessions.consume_reset_token(&payload.token) {
        Some(account_id) => account_id,
        None => {
            return (StatusCode::BAD_REQUEST, "Invalid or expired reset token").into_response();
        }
    };

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash new password");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to reset password")
                .into_response();
        }
    };

    match state.accounts.update_password(account_id, &password_hash).await {
        Ok(true) => {
            // Any open sessions belong to the old credentials.
            state.sessions.revoke_sessions_for(account_id);
            info!(account_id = %account_id, "Password reset completed");
            (StatusCode::OK, "Password updated").into_response()
        }
        Ok(false) => (StatusCode::NOT_FOUND, "Account not found").into_response(),
        Err(e) => {
            error!(error = %e, account_id = %account_id, "Failed to update password");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to reset password").into_response()
        }
    }
}
