use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, VerifyCodeRequest},
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    services::auth_service::{confirm_registration, current_profile, login_user, start_registration},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registro", post(register))
        .route("/verificar-codigo", post(verify_code))
        .route("/login", post(login))
        .route("/verify-token", get(verify_token))
}

#[utoipa::path(
    post,
    path = "/registro",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Verification code sent", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Missing fields, mismatched passwords or bad phone"),
        (status = 409, description = "Phone already registered"),
        (status = 502, description = "SMS could not be delivered")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<RegisterResponse>>> {
    let resp = start_registration(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/verificar-codigo",
    request_body = VerifyCodeRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid or expired code"),
        (status = 404, description = "No pending verification")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyCodeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let resp = confirm_registration(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Phone not registered")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/verify-token",
    responses(
        (status = 200, description = "Token valid", body = ApiResponse<UserProfile>),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    tag = "Auth"
)]
pub async fn verify_token(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = current_profile(&state, &user).await?;
    Ok(Json(resp))
}
