use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    entity::users::{
        ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::{User, UserRole},
    phone,
    response::{ApiResponse, Meta},
    services::auth_service::hash_password,
    state::AppState,
};

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        name: model.name,
        phone: model.phone,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn phone_taken(err: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("This phone number is already registered".into())
    } else {
        AppError::OrmError(err)
    }
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let items: Vec<User> = Users::find()
        .order_by_desc(UserCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let name = payload.name.trim();
    if name.is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::Validation("name and password are required".into()));
    }
    let phone = phone::canonicalize(&payload.phone, &state.config.phone_country_code)?;
    let role: UserRole = payload.role.parse()?;

    let created = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        phone: Set(phone),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(role.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(phone_taken)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id, "role": created.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(created),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name.trim().to_string());
    }
    if let Some(raw) = payload.phone.filter(|p| !p.trim().is_empty()) {
        active.phone = Set(phone::canonicalize(&raw, &state.config.phone_country_code)?);
    }
    if let Some(role) = payload.role.filter(|r| !r.trim().is_empty()) {
        active.role = Set(role.parse::<UserRole>()?.as_str().to_string());
    }
    // blank password keeps the stored hash
    if let Some(password) = payload.password.filter(|p| !p.trim().is_empty()) {
        active.password_hash = Set(hash_password(&password)?);
    }
    let updated = active.update(&state.orm).await.map_err(phone_taken)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Removes the user together with their orders and ratings.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("User"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;
    tracing::info!(user_id = %id, "user deleted");

    Ok(ApiResponse::done("User deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_view_has_no_password_hash() {
        let model = UserModel {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            phone: "+525512345678".into(),
            password_hash: "$argon2id$secret".into(),
            role: "client".into(),
            created_at: Utc::now().into(),
        };
        let json = serde_json::to_value(user_from_entity(model)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["phone"], "+525512345678");
    }
}
