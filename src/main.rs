use axum::http::{HeaderName, Request, Response};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use restaurante_api::{
    config::{AppConfig, VerificationBackend},
    db::{create_pool, orm_from_pool, run_migrations},
    error,
    routes::create_router,
    sms::{LogSms, SmsSender, TwilioSms},
    state::AppState,
    verification::{InMemoryVerificationStore, PgVerificationStore, VerificationStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,restaurante_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    error::set_environment(config.environment);

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(&pool);

    let verifications: Arc<dyn VerificationStore> = match config.verification_backend {
        VerificationBackend::Memory => Arc::new(InMemoryVerificationStore::new()),
        VerificationBackend::Database => Arc::new(PgVerificationStore::new(pool.clone())),
    };
    let sms: Arc<dyn SmsSender> = match config.twilio.clone() {
        Some(twilio) => Arc::new(TwilioSms::new(twilio)),
        None => {
            tracing::warn!("TWILIO_* not set, verification codes will only be logged");
            Arc::new(LogSms)
        }
    };

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));

    let state = AppState {
        pool,
        orm,
        config: Arc::new(config),
        verifications,
        sms,
    };

    let concurrency_limit_layer = ConcurrencyLimitLayer::new(100);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "request started"
            );
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let app = create_router(state)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(concurrency_limit_layer);

    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
