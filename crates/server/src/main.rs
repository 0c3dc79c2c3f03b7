use std::net::SocketAddr;
use std::time::Duration;

use server::config::{self, ServerConfig};
use server::db::{self, StartupError};
use server::rate_limit::RateLimitState;
use server::{health, openapi, telemetry};
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    telemetry::init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed to start");
        telemetry::shutdown_telemetry();
        std::process::exit(1);
    }
    telemetry::shutdown_telemetry();
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;
    let flags = config::load_feature_flags().clone();
    health::record_start_time();

    if flags.telemetry {
        telemetry::init_telemetry()?;
    }

    let state = db::connect_state(&config, flags.clone()).await?;

    let rate_limit = flags.rate_limit.then(|| {
        RateLimitState::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        )
        .trust_forwarded(config.trust_proxy)
    });

    let router = openapi::api_router(state, rate_limit)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        backend = ?config.store_backend,
        version = env!("CARGO_PKG_VERSION"),
        "Listening"
    );

    let service = router.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
