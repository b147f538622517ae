use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use image_optimizer::config::AppConfig;
use image_optimizer::gate::FixedWindowLimiter;
use image_optimizer::state::AppState;
use image_optimizer::store::TempStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up API_KEY, PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_optimizer=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(AppConfig::from_env());

    let store = TempStore::open(&config.temp_store.dir)
        .await
        .unwrap_or_else(|e| {
            panic!(
                "failed to create temp dir {}: {}",
                config.temp_store.dir.display(),
                e
            )
        });
    let store = Arc::new(store);
    if config.temp_store.ttl_secs > 0 {
        store.spawn_sweeper(Duration::from_secs(config.temp_store.ttl_secs));
    }

    let limiter = Arc::new(FixedWindowLimiter::new(
        config.limits.rate_limit_max_requests,
        Duration::from_secs(config.limits.rate_limit_window_secs),
    ));

    let state = AppState {
        config: config.clone(),
        limiter,
        store,
    };
    let app = image_optimizer::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!(
        "Image optimization server running on port {}",
        config.server.port
    );
    tracing::info!("Health check: http://localhost:{}/health", config.server.port);
    tracing::info!(
        "Optimization endpoint: http://localhost:{}/optimize",
        config.server.port
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server");
}
