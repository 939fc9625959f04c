use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode, Uri},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{
    config::AppConfig,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod auth;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod ratings;
pub mod users;

// Routes under `/api`; state is bound by `create_router`.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(orders::route())
        .merge(users::router())
        .merge(catalog::admin_router())
        .merge(ratings::api_router())
}

/// Full application: root-level storefront routes, `/api`, docs and the JSON 404.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = RequestBodyLimitLayer::new(state.config.max_body_bytes);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(catalog::router())
        .merge(ratings::router())
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
