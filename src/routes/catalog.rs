use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CategoryList, CreateDishRequest, DishList, UpdateDishRequest},
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::auth::AuthUser,
    models::Dish,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

/// Public catalog, mounted at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categorias", get(list_categories))
        .route("/categorias/{id}/platillos", get(list_dishes_by_category))
        .route("/platillos", get(list_dishes))
}

/// Dish administration, mounted under `/api`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/platillos", axum::routing::post(create_dish))
        .route("/platillos/{id}", put(update_dish).delete(delete_dish))
}

#[utoipa::path(
    get,
    path = "/categorias",
    responses(
        (status = 200, description = "List categories", body = ApiResponse<CategoryList>)
    ),
    security(()),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(catalog_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/categorias/{id}/platillos",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Dishes in category", body = ApiResponse<DishList>),
        (status = 404, description = "Category not found")
    ),
    security(()),
    tag = "Catalog"
)]
pub async fn list_dishes_by_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<DishList>>> {
    Ok(Json(catalog_service::list_dishes_by_category(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/platillos",
    responses(
        (status = 200, description = "List dishes", body = ApiResponse<DishList>)
    ),
    security(()),
    tag = "Catalog"
)]
pub async fn list_dishes(State(state): State<AppState>) -> AppResult<Json<ApiResponse<DishList>>> {
    Ok(Json(catalog_service::list_dishes(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/platillos",
    request_body = CreateDishRequest,
    responses(
        (status = 201, description = "Dish created", body = ApiResponse<Dish>),
        (status = 400, description = "Invalid dish"),
        (status = 403, description = "Admin only")
    ),
    tag = "Catalog"
)]
pub async fn create_dish(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateDishRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Dish>>)> {
    let resp = catalog_service::create_dish(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/platillos/{id}",
    params(("id" = Uuid, Path, description = "Dish id")),
    request_body = UpdateDishRequest,
    responses(
        (status = 200, description = "Dish updated", body = ApiResponse<Dish>),
        (status = 404, description = "Dish not found")
    ),
    tag = "Catalog"
)]
pub async fn update_dish(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateDishRequest>,
) -> AppResult<Json<ApiResponse<Dish>>> {
    Ok(Json(catalog_service::update_dish(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/platillos/{id}",
    params(("id" = Uuid, Path, description = "Dish id")),
    responses(
        (status = 200, description = "Dish deleted"),
        (status = 404, description = "Dish not found"),
        (status = 409, description = "Dish is referenced by orders")
    ),
    tag = "Catalog"
)]
pub async fn delete_dish(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(catalog_service::delete_dish(&state, &user, id).await?))
}
