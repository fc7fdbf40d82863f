use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::{AppData, Credentials, LoginResponse, RegisterResponse, User, UserSummary};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const BCRYPT_COST: u32 = 10;

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: u64,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid or expired token")]
    UnknownUser,
    #[error("Invalid username or password")]
    BadCredentials,
    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if matches!(err, AuthError::Hash(_)) {
            AppError::internal(err)
        } else {
            AppError::unauthorized(err.to_string())
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Stored values that are not bcrypt hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

pub fn encode_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// A token only names a caller while the user it was issued to still exists
/// under the same id and username.
pub fn resolve_user(data: &AppData, claims: &Claims) -> Result<CurrentUser, AuthError> {
    data.user_by_id(claims.sub)
        .filter(|user| user.username == claims.username)
        .map(|user| CurrentUser { id: user.id })
        .ok_or(AuthError::UnknownUser)
}

/// Rejects requests without a valid bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims = decode_token(token.trim(), &state.config.jwt_secret)?;
    let current = resolve_user(&*state.data.lock().await, &claims)?;
    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(AppError::internal)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<RegisterResponse>, AppError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let password = payload.password;
    let password_hash = blocking(move || hash_password(&password)).await??;

    let summary = state
        .update(|data| {
            if data.find_user(&username).is_some() {
                return Err(AppError::bad_request("Username already exists"));
            }
            let user = User {
                id: data.allocate_user_id(),
                username,
                password_hash,
            };
            let summary = UserSummary::from(&user);
            data.users.push(user);
            Ok(summary)
        })
        .await?;

    info!(user_id = summary.id, "registered user {}", summary.username);
    Ok(Json(RegisterResponse {
        message: "User created successfully".to_string(),
        user: summary,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let user = state.data.lock().await.find_user(&username).cloned();
    let verified = match user {
        Some(user) => {
            let password = payload.password;
            let stored = user.password_hash.clone();
            blocking(move || verify_password(&password, &stored))
                .await?
                .then_some(user)
        }
        None => None,
    };
    let Some(user) = verified else {
        warn!("failed login for {username}");
        return Err(AuthError::BadCredentials.into());
    };

    let token = encode_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)
        .map_err(AppError::internal)?;

    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}
