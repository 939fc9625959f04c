use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::{AppError, AppResult},
    models::UserRole,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub phone: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_str()
    }
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role.as_str() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Admin)
}

pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    phone: &str,
    role: &str,
    ttl: Duration,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        phone: phone.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_token(secret: &str, token: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => AppError::ExpiredToken,
        _ => AppError::InvalidToken,
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        phone: decoded.claims.phone,
        role: decoded.claims.role,
    })
}

/// `Ok(None)` when no Authorization header is present; a malformed or
/// non-bearer header is an error rather than an anonymous request.
fn bearer_token(parts: &Parts) -> AppResult<Option<&str>> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AppError::InvalidToken)?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::InvalidToken)?;
    Ok(Some(token))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::MissingToken)?;
        decode_token(&state.config.jwt_secret, token)
    }
}

/// Authentication for routes that also serve anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(decode_token(
                &state.config.jwt_secret,
                token,
            )?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issued_token_round_trips_claims() {
        let id = Uuid::new_v4();
        let token = issue_token(SECRET, id, "+525512345678", "admin", Duration::hours(1)).unwrap();
        let user = decode_token(SECRET, &token).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.phone, "+525512345678");
        assert!(user.is_admin());
    }

    #[test]
    fn expired_and_forged_tokens_are_distinguished() {
        let id = Uuid::new_v4();
        let expired =
            issue_token(SECRET, id, "+525512345678", "client", Duration::hours(-2)).unwrap();
        assert!(matches!(decode_token(SECRET, &expired), Err(AppError::ExpiredToken)));

        let other = issue_token("other-secret", id, "+525512345678", "client", Duration::hours(1))
            .unwrap();
        assert!(matches!(decode_token(SECRET, &other), Err(AppError::InvalidToken)));
        assert!(matches!(decode_token(SECRET, "garbage"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn only_admins_pass_admin_guard() {
        let client = AuthUser {
            user_id: Uuid::new_v4(),
            phone: "+525512345678".into(),
            role: "client".into(),
        };
        assert!(matches!(ensure_admin(&client), Err(AppError::Forbidden)));
    }
}
