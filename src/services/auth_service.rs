use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, VerifyCodeRequest},
    entity::users::{
        ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, issue_token},
    models::{UserProfile, UserRole},
    phone,
    response::{ApiResponse, Meta},
    sms::verification_message,
    state::AppState,
    verification::{PendingVerification, generate_code},
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

pub(crate) fn profile_from_entity(model: UserModel) -> UserProfile {
    UserProfile {
        id: model.id,
        name: model.name,
        phone: model.phone,
        role: model.role,
    }
}

pub async fn start_registration(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    const ALL_REQUIRED: &str = "All fields are required";
    let name = required(payload.name, ALL_REQUIRED)?;
    let raw_phone = required(payload.phone, ALL_REQUIRED)?;
    let password = required(payload.password, ALL_REQUIRED)?;
    let password_confirm = required(payload.password_confirm, ALL_REQUIRED)?;

    if password != password_confirm {
        return Err(AppError::Validation("Passwords do not match".into()));
    }

    let phone = phone::canonicalize(&raw_phone, &state.config.phone_country_code)?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
        .bind(phone.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(
            "This phone number is already registered".into(),
        ));
    }

    let code = generate_code();
    let password_hash = hash_password(&password)?;

    // The pending record is only written once the code has actually been delivered.
    state
        .sms
        .send(&phone, &verification_message(&code))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, phone = %phone, "verification sms failed");
            AppError::Delivery(err.to_string())
        })?;

    state
        .verifications
        .put(PendingVerification {
            phone: phone.clone(),
            code,
            name: name.trim().to_string(),
            password_hash,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(phone = %phone, "registration started");

    Ok(ApiResponse::success(
        "Verification code sent",
        RegisterResponse { phone },
        Some(Meta::empty()),
    ))
}

pub async fn confirm_registration(
    state: &AppState,
    payload: VerifyCodeRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let raw_phone = required(payload.phone, "Phone and code are required")?;
    let code = required(payload.code, "Phone and code are required")?;

    // Accept either the canonical phone echoed by /registro or the local 10 digits.
    let phone = phone::canonicalize(&raw_phone, &state.config.phone_country_code)
        .unwrap_or_else(|_| raw_phone.trim().to_string());

    let pending = state
        .verifications
        .get(&phone)
        .await?
        .ok_or_else(|| AppError::NotFound("No pending verification for this phone".into()))?;

    if pending.code != code.trim() {
        return Err(AppError::InvalidCode);
    }

    let ttl = Duration::seconds(state.config.verification_ttl_secs);
    if pending.is_expired_at(Utc::now(), ttl) {
        state.verifications.remove(&phone).await?;
        return Err(AppError::ExpiredCode);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(pending.name.clone()),
        phone: Set(pending.phone.clone()),
        password_hash: Set(pending.password_hash.clone()),
        role: Set(UserRole::Client.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("This phone number is already registered".into())
        } else {
            AppError::OrmError(err)
        }
    })?;

    state.verifications.remove(&phone).await?;

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.phone,
        &user.role,
        Duration::hours(state.config.registration_token_ttl_hours),
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "registration confirmed");

    Ok(ApiResponse::success(
        "User registered",
        AuthResponse {
            token,
            user: profile_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let raw_phone = required(payload.phone, "Phone is required")?;
    let password = required(payload.password, "Password is required")?;
    let phone = phone::canonicalize(&raw_phone, &state.config.phone_country_code)?;

    let user = Users::find()
        .filter(UserCol::Phone.eq(phone.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Phone number is not registered".into()))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        &user.phone,
        &user.role,
        Duration::hours(state.config.login_token_ttl_hours),
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            token,
            user: profile_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

/// Resolve the token's subject to its current stored profile.
pub async fn current_profile(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, name, phone, role FROM users WHERE id = $1",
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("User"))?;

    Ok(ApiResponse::success("Token valid", profile, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_original() {
        let hash = hash_password("pw1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pw1", &hash).unwrap());
        assert!(!verify_password("pw2", &hash).unwrap());
    }

    #[test]
    fn blank_fields_count_as_missing() {
        assert!(matches!(
            required(Some("   ".into()), "missing"),
            Err(AppError::Validation(_))
        ));
        assert_eq!(required(Some("Ana".into()), "missing").unwrap(), "Ana");
    }
}
