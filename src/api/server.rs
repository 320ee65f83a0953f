/// Axum HTTP server setup and routing

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

pub const API_BASE: &str = "/api/v1/explorer";

/// CORS from a comma-separated origin list; any origin when unset
pub fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) if !origins.trim().is_empty() => {
            log::info!("CORS configured for origins: {}", origins);
            let origin_list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        log::warn!("Ignoring invalid CORS origin: {}", s.trim());
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origin_list)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        _ => {
            log::warn!("CORS: Allowing all origins. Set ALLOWED_ORIGINS to restrict.");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let explorer = Router::new()
        .route("/", get(handlers::mining_info_handler))
        .route("/overview", get(handlers::overview_handler))
        .route("/chain-info", get(handlers::chain_info_handler))
        .route("/address/", get(handlers::missing_address_handler))
        .route("/address/:address", get(handlers::address_handler))
        .route("/block/", get(handlers::missing_block_handler))
        .route("/block/:hash_or_height", get(handlers::block_handler))
        .route("/blocks", get(handlers::blocks_handler))
        .route("/tx/:txid", get(handlers::tx_handler));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(API_BASE, explorer)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(
    state: AppState,
    cors: CorsLayer,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let app = create_router(state, cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Explorer gateway listening on http://{}{}", addr, API_BASE);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        },
    }

    log::info!("Shutdown signal received, exiting gracefully...");
}
