use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procflow_api::background;
use procflow_api::config::ServerConfig;
use procflow_api::router::build_app_router;
use procflow_api::state::AppState;
use procflow_engine::{HttpRegisterKeyDirectory, PgUnitDirectory};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let pool = open_database().await;

    let event_bus = Arc::new(procflow_events::EventBus::default());
    let audit_writer = tokio::spawn(procflow_events::EventPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    let register_keys = Arc::new(HttpRegisterKeyDirectory::new(
        config.engine.register_service_url.clone(),
        config.engine.register_keys_limit,
    ));
    let units = Arc::new(PgUnitDirectory::new(pool.clone()));
    let state = AppState::new(
        pool,
        config.clone(),
        Arc::clone(&event_bus),
        register_keys,
        units,
    );

    let background = CancellationToken::new();
    let sweep = tokio::spawn(background::staged_copy_sweep::run(
        Arc::clone(&state.staged_copies),
        background.clone(),
    ));

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "Serving workflow template API");

    axum::serve(listener, build_app_router(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // The server no longer accepts requests; let background work drain.
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    background.cancel();
    if tokio::time::timeout(drain, sweep).await.is_err() {
        tracing::warn!("Staged copy sweep did not stop in time");
    }

    // The audit writer ends once the last sender is gone.
    drop(event_bus);
    if tokio::time::timeout(drain, audit_writer).await.is_err() {
        tracing::warn!("Audit writer did not drain in time");
    }

    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "procflow_api=debug,procflow_engine=debug,procflow_events=info,tower_http=debug".into()
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify and migrate. Any failure aborts startup.
async fn open_database() -> procflow_db::DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = procflow_db::create_pool(&url)
        .await
        .expect("Failed to connect to database");
    procflow_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    procflow_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");
    pool
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
