use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medialab_api::auth::token_store::{MemoryTokenStore, RedisTokenStore, TokenStore};
use medialab_api::background::session_cleanup;
use medialab_api::config::ServerConfig;
use medialab_api::notifications::NotificationRouter;
use medialab_api::router::build_app_router;
use medialab_api::state::AppState;
use medialab_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // LOG_FORMAT=json switches to one JSON object per line.
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medialab_api=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = medialab_db::create_pool(&config.database)
        .await
        .expect("Failed to connect to database");
    tracing::info!(
        max_connections = config.database.max_connections(),
        "Database connection pool created"
    );

    medialab_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    medialab_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Token store ---
    let token_store: Arc<dyn TokenStore> = match config.redis_url.as_deref() {
        Some(url) => match RedisTokenStore::connect(url).await {
            Ok(store) => {
                tracing::info!("Using Redis token store");
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, falling back to in-memory token store");
                Arc::new(MemoryTokenStore::new())
            }
        },
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory token store");
            Arc::new(MemoryTokenStore::new())
        }
    };

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(medialab_events::EventBus::default());

    let persistence_handle = tokio::spawn(medialab_events::AuditPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    let notification_router = NotificationRouter::new(
        pool.clone(),
        Arc::clone(&ws_manager),
        config.secret_encryption_key.clone(),
        config.frontend_url.clone(),
    );
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));

    // --- Session cleanup ---
    let cleanup_cancel = CancellationToken::new();
    let cleanup_handle = tokio::spawn(session_cleanup::run(pool.clone(), cleanup_cancel.clone()));

    tracing::info!("Background services started (audit, notifications, session cleanup)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        token_store,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(grace, cleanup_handle).await;

    // Dropping the last sender closes the broadcast channel, which ends
    // the audit and notification loops.
    drop(event_bus);
    let _ = tokio::time::timeout(grace, persistence_handle).await;
    let _ = tokio::time::timeout(grace, router_handle).await;
    tracing::info!("Event services shut down");

    ws_manager.shutdown_all().await;
    heartbeat_handle.abort();

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
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
