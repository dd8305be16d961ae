// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use quiz_engine::config::{self, Config};
use quiz_engine::routes;
use quiz_engine::services::HttpQuizService;
use quiz_engine::session::SessionRegistry;
use quiz_engine::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let file_appender = tracing_appender::rolling::daily("logs", "engine.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(config::log_filter());
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Load configuration from environment
    let config = Config::from_env();

    let service = match HttpQuizService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to build quiz service client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Quiz service at {}", config.quiz_api_url);

    // Create AppState
    let state = AppState {
        service: Arc::new(service),
        sessions: SessionRegistry::new(),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.listen_addr);

    // Start the server
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
