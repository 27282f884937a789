//! Simple Blog Server
//!
//! Loads configuration, creates the bootstrap accounts and serves the blog API
//! until Ctrl+C or SIGTERM.

use std::{net::SocketAddr, time::Duration};

use tokio::signal;

use simple_blog_server::{config::Config, create_router, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    logging::init(&config.log_level);

    tracing::info!(
        environment = config.environment.as_str(),
        "Configuration loaded"
    );

    if config.allow_user_id_header {
        tracing::warn!(
            "X-User-Id trust header is enabled; any client can act as any user without a token"
        );
    }

    let sweep_interval = Duration::from_secs(config.rate_limit_sweep_secs);
    let addr = SocketAddr::new(config.bind_addr, config.port);

    let app_state = AppState::new(config)?;
    app_state.bootstrap().await?;

    // Periodically drop expired rate-limit windows
    let auth_service = app_state.auth_service.clone();
    tokio::spawn(async move {
        tracing::info!("Rate-limit sweep task started");
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            auth_service.limiter().sweep().await;
        }
    });

    let app = create_router(app_state);

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
