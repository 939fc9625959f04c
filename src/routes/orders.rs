use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        OrderList, OrderStatusResponse, OrderWithLines, SubmitOrderRequest, SubmitOrderResponse,
        UpdateOrderStatusRequest,
    },
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::{AuthUser, MaybeAuthUser},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new()
        .route("/pedidos", get(list_orders).post(submit_order))
        .route("/pedidos/{id}", get(get_order).delete(delete_order))
        .route("/pedidos/{id}/comprobante", get(get_receipt))
        .route(
            "/pedidos/{id}/estado",
            axum::routing::put(update_status).patch(update_status),
        )
}

#[utoipa::path(
    post,
    path = "/api/pedidos",
    request_body = SubmitOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<SubmitOrderResponse>),
        (status = 400, description = "Invalid cart, total, payment method or receipt"),
        (status = 401, description = "Bearer token present but invalid")
    ),
    security((), ("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn submit_order(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    AppJson(payload): AppJson<SubmitOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SubmitOrderResponse>>)> {
    let resp = order_service::submit_order(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/pedidos",
    params(("status" = Option<String>, Query, description = "Filter by status")),
    responses(
        (status = 200, description = "All orders, newest first", body = ApiResponse<OrderList>),
        (status = 403, description = "Admin only")
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::list_orders(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/pedidos/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with lines", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    Ok(Json(order_service::get_order(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/pedidos/{id}/comprobante",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Receipt bytes with their original content type"),
        (status = 404, description = "Order or receipt not found")
    ),
    tag = "Orders"
)]
pub async fn get_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let (mime, bytes) = order_service::get_receipt(&state, &user, id).await?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes))
}

#[utoipa::path(
    put,
    path = "/api/pedidos/{id}/estado",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderStatusResponse>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderStatusResponse>>> {
    Ok(Json(
        order_service::update_order_status(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/pedidos/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(order_service::delete_order(&state, &user, id).await?))
}
