use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::TopRatedList,
        ratings::{RatingList, SubmitRatingRequest},
    },
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthUser,
    models::Rating,
    response::ApiResponse,
    routes::params::TopRatedQuery,
    services::rating_service::{self, UpsertOutcome, clamp_limit},
    state::AppState,
};

const STOREFRONT_TOP_LIMIT: i64 = 5;
const API_TOP_LIMIT: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/platillos/mejores", get(best_dishes))
        .route(
            "/platillos/{id}/calificaciones",
            get(list_ratings).post(submit_rating),
        )
        .route("/calificaciones/{id}", delete(delete_rating))
}

/// Mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/platillos/mejores-calificados", get(top_rated))
}

#[utoipa::path(
    get,
    path = "/platillos/mejores",
    params(("limit" = Option<i64>, Query, description = "Default 5, max 50")),
    responses(
        (status = 200, description = "Best dishes", body = ApiResponse<TopRatedList>)
    ),
    security(()),
    tag = "Ratings"
)]
pub async fn best_dishes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TopRatedQuery>,
) -> AppResult<Json<ApiResponse<TopRatedList>>> {
    let limit = clamp_limit(query.limit, STOREFRONT_TOP_LIMIT);
    Ok(Json(rating_service::top_rated_dishes(&state, limit).await?))
}

#[utoipa::path(
    get,
    path = "/api/platillos/mejores-calificados",
    params(("limit" = Option<i64>, Query, description = "Default 10, max 50")),
    responses(
        (status = 200, description = "Top rated dishes", body = ApiResponse<TopRatedList>)
    ),
    security(()),
    tag = "Ratings"
)]
pub async fn top_rated(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TopRatedQuery>,
) -> AppResult<Json<ApiResponse<TopRatedList>>> {
    let limit = clamp_limit(query.limit, API_TOP_LIMIT);
    Ok(Json(rating_service::top_rated_dishes(&state, limit).await?))
}

#[utoipa::path(
    get,
    path = "/platillos/{id}/calificaciones",
    params(("id" = Uuid, Path, description = "Dish id")),
    responses(
        (status = 200, description = "Ratings for dish", body = ApiResponse<RatingList>),
        (status = 404, description = "Dish not found")
    ),
    security(()),
    tag = "Ratings"
)]
pub async fn list_ratings(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<RatingList>>> {
    Ok(Json(rating_service::list_ratings(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/platillos/{id}/calificaciones",
    params(("id" = Uuid, Path, description = "Dish id")),
    request_body = SubmitRatingRequest,
    responses(
        (status = 201, description = "Rating created", body = ApiResponse<Rating>),
        (status = 200, description = "Rating updated", body = ApiResponse<Rating>),
        (status = 400, description = "Stars missing or out of range"),
        (status = 404, description = "Dish not found")
    ),
    tag = "Ratings"
)]
pub async fn submit_rating(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<SubmitRatingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Rating>>)> {
    let (outcome, resp) = rating_service::submit_rating(&state, &user, id, payload).await?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/calificaciones/{id}",
    params(("id" = Uuid, Path, description = "Rating id")),
    responses(
        (status = 200, description = "Rating deleted"),
        (status = 403, description = "Not the owner of this rating")
    ),
    tag = "Ratings"
)]
pub async fn delete_rating(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(rating_service::delete_rating(&state, &user, id).await?))
}
