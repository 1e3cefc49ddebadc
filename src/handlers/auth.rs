//! Authentication handlers

use axum::{extract::State, http::HeaderMap, Form, Json};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::{client_ip, UserContext};
use crate::models::{
    AuditLog, CreateUser, RegisterRequest, TokenRequest, TokenResponse, User, UserResponse,
    UserRole, ACTION_LOGIN, ACTION_REGISTER,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // User ID
    pub email: String,
    pub role: String,
    pub exp: usize,       // Expiration timestamp
    pub iat: usize,       // Issued at
}

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<UserResponse>> {
    tracing::info!("Registration attempt for email={}", req.email);

    req.validate()?;
    let role = match req.role.as_deref() {
        Some(role) => role.parse::<UserRole>().map_err(AppError::ValidationError)?,
        None => UserRole::User,
    };

    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        tracing::warn!("Registration failed: email already registered ({})", req.email);
        return Err(AppError::AlreadyExists("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let user = User::create(
        &state.pool,
        CreateUser {
            name: req.name,
            email: req.email,
            role,
            is_active: req.is_active.unwrap_or(true),
        },
        password_hash,
    ).await?;

    AuditLog::record_best_effort(
        &state.pool,
        Some(user.id),
        ACTION_REGISTER,
        Some(user.id),
        client_ip(&headers).as_deref(),
    ).await;

    tracing::info!("User registered successfully: id={}, email={}", user.id, user.email);

    Ok(Json(user.to_response()))
}

/// Authenticate and receive a JWT access token
pub async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    tracing::info!("Login attempt for username={}", req.username);

    let user = User::find_by_email(&state.pool, &req.username)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login failed: unknown user {}", req.username);
            AppError::InvalidCredentials
        })?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!("Login failed: wrong password for {}", req.username);
        return Err(AppError::InvalidCredentials);
    }

    let access_token = generate_jwt(&user, &state.config.jwt_secret, state.config.access_token_expire_minutes)?;

    AuditLog::record_best_effort(
        &state.pool,
        Some(user.id),
        ACTION_LOGIN,
        None,
        client_ip(&headers).as_deref(),
    ).await;

    tracing::info!("Login successful for user={}", user.email);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Current user profile
pub async fn me(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_response()))
}

/// Argon2id PHC string for a password
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate JWT token
pub fn generate_jwt(user: &User, secret: &str, expiration_minutes: u64) -> AppResult<String> {
    let now = Utc::now();
    let exp = i64::try_from(expiration_minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AppError::InternalError(format!("Token lifetime out of range: {} minutes", expiration_minutes)))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes())
    ).map_err(|e| AppError::InternalError(e.to_string()))
}

/// Decode and validate a JWT (HS256, expiry checked)
pub fn decode_jwt(token: &str, secret: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default()
    )?;

    Ok(token_data.claims)
}
