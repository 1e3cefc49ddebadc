//! Authentication middleware

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
    http::{header::AUTHORIZATION, HeaderMap},
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::{AppState, AppError};
use crate::handlers::auth::decode_jwt;
use crate::models::{User, UserRole};

/// Authenticated user attached to the request
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub ip_address: Option<String>,
}

/// RBAC: alerts are visible to bank admins and SOC analysts only
pub fn require_alert_reviewer(user: &UserContext) -> Result<(), AppError> {
    if !user.role.can_review_alerts() {
        tracing::warn!("Alert access denied for user {} with role '{}'", user.user_id, user.role.as_str());
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Middleware: Require user JWT authentication
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(req.headers())?;

    let claims = decode_jwt(&token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!("JWT decode error: {:?}", e);
        e
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

    let user = User::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("User not found for token subject: {}", user_id);
            AppError::TokenInvalid
        })?;

    if !user.is_active {
        tracing::warn!("Inactive user attempted access: {}", user.email);
        return Err(AppError::InactiveUser);
    }

    tracing::debug!("Authenticated user: {}", user.email);

    let user_ctx = UserContext {
        user_id: user.id,
        role: user.role(),
        email: user.email,
        ip_address: client_ip(req.headers()),
    };

    req.extensions_mut().insert(user_ctx);

    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Unauthorized),
    }
}

/// First address in X-Forwarded-For, if any
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// Implement FromRequestParts for UserContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_extraction() {
        let headers = headers_with("authorization", "Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_malformed_bearer() {
        assert!(matches!(extract_bearer_token(&HeaderMap::new()), Err(AppError::Unauthorized)));
        let basic = headers_with("authorization", "Basic dXNlcjpwYXNz");
        assert!(matches!(extract_bearer_token(&basic), Err(AppError::Unauthorized)));
        let empty = headers_with("authorization", "Bearer ");
        assert!(matches!(extract_bearer_token(&empty), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let headers = headers_with("x-forwarded-for", "203.0.113.7, 10.0.0.1");
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_alert_reviewer_roles() {
        let mut user = UserContext {
            user_id: Uuid::new_v4(),
            email: "u@example.com".to_string(),
            role: UserRole::User,
            ip_address: None,
        };
        assert!(matches!(require_alert_reviewer(&user), Err(AppError::Forbidden)));

        user.role = UserRole::SocAnalyst;
        assert!(require_alert_reviewer(&user).is_ok());
    }
}
