use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(list_users).post(create_user))
        .route("/usuarios/{id}", put(update_user).delete(delete_user))
}

#[utoipa::path(
    get,
    path = "/api/usuarios",
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only")
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(user_service::list_users(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/usuarios",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<User>),
        (status = 409, description = "Phone already registered")
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = user_service::create_user(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(user_service::update_user(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(user_service::delete_user(&state, &user, id).await?))
}
