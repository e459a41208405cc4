//! # tapcard-server
//!
//! HTTP surface of the NFC AI networking card.
//!
//! A tag tap opens `/tap`, which bumps the shared counter, asks the fact
//! generator for one AI fun fact and renders the card page. `/stats` and
//! `/fact` expose the two halves separately; `/static` serves the vCard.
//!
//! | Route    | Response                                   |
//! |----------|--------------------------------------------|
//! | `/`      | `{"message": ...}` liveness                 |
//! | `/tap`   | card HTML                                   |
//! | `/stats` | `{"total_taps": n, "status": ...}`          |
//! | `/fact`  | `{"fact": ..., "source": ...}`              |
//!
//! Store failures on any route become a 500 with `{error, details, hint}`;
//! the raw error only goes to the log.

use std::path::Path;

use axum::{Router, routing::get};
use tapcard_core::AppConfig;
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

pub mod card;
pub mod cli;
pub mod error;
pub mod logging;
pub mod preflight;
pub mod routes;
pub mod state;

use error::StartupError;
use routes::{fact_handler, root_handler, stats_handler, tap_handler};
use state::AppState;

/// All routes plus `/static` served from `static_dir`.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/tap", get(tap_handler))
        .route("/stats", get(stats_handler))
        .route("/fact", get(fact_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns an error if the state cannot be built or the listener cannot bind.
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    info!("Initializing state...");
    let state = AppState::from_config(&config)?;
    preflight::log_startup_checks(preflight::checks(&state, &config)).await;

    let app = build_router(state, &config.server.static_dir);

    let address = config.server.bind_addr()?;
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
