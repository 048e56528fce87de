//! Bridge HTTP Surface
//!
//! HTTP and WebSocket share one listener, built with Axum.
//!
//! # Endpoints
//!
//! ## Stream
//! - `GET /` - WebSocket upgrade; plain requests get the liveness text
//! - `GET /ws` - Same as `/`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status
//!
//! Any other path answers with the plain-text liveness response.
//!
//! # Example
//!
//! ```rust,ignore
//! use sensor_bridge::api::{serve, AppState};
//! use sensor_bridge::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     serve(AppState::default(), &ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::websocket::stream_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(stream_handler))
        .route("/ws", get(stream_handler))
        .nest("/health", health_routes)
        .fallback(routes::health::plain_liveness)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Bind the listener; failure here is fatal
pub async fn bind(config: &ServerConfig) -> ApiResult<TcpListener> {
    let addr = config.addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind { addr, source })
}

/// Start the server and run until SIGINT/SIGTERM
pub async fn serve(state: AppState, config: &ServerConfig) -> ApiResult<()> {
    let listener = bind(config).await?;
    serve_on(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
///
/// On shutdown every stream client is closed before the server stops.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> ApiResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let hub = Arc::clone(&state.hub);
    let router = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("HTTP server listening on http://{}", addr);
        tracing::info!("WebSocket stream available on ws://{}", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            hub.close_all().await;
        })
        .await?;

    tracing::info!("Bridge server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, closing clients");
}
