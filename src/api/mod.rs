//! HTTP API - axum router, shared state and server lifecycle.
//!
//! Routes under `/api` are meant for school office staff; `/public/receipts/:id` lets a
//! parent open a receipt from its printed code and is served from a separate, read-only
//! database handle.

/// Error to response mapping
pub mod error;
/// Route handlers
pub mod handlers;

use crate::{errors::Result, qr::QrEncoder};
use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use handlers::{families, fees, receipts, reports};
use sea_orm::DatabaseConnection;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// State shared by every handler.
///
/// Built once at start-up and cloned cheaply into each request.
#[derive(Clone)]
pub struct AppState {
    /// Read-write connection for staff routes
    pub db: DatabaseConnection,
    /// Separately opened connection used only for reads by public routes
    pub public_db: DatabaseConnection,
    /// Receipt code encoder
    pub qr: Arc<dyn QrEncoder>,
    /// Base URL of public receipts, without trailing slash
    pub receipt_base_url: String,
    /// School name printed on receipts
    pub school_name: String,
}

impl AppState {
    /// Public URL of a receipt.
    #[must_use]
    pub fn receipt_url(&self, receipt_id: &str) -> String {
        format!("{}/{receipt_id}", self.receipt_base_url)
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/families",
            get(families::list_families).post(families::create_family),
        )
        .route(
            "/families/:id",
            get(families::get_family).delete(families::delete_family),
        )
        .route(
            "/families/:id/students",
            get(families::list_students).post(families::create_student),
        )
        .route(
            "/families/:id/fees",
            get(fees::list_fees).post(fees::create_fee),
        )
        .route("/families/:id/outstanding", get(fees::get_outstanding))
        .route("/families/:id/voucher", post(fees::create_voucher))
        .route("/families/:id/payments", post(fees::apply_payment))
        .route("/fees/:id/reversal", post(fees::reverse_payment))
        .route("/receipts/:id", get(receipts::get_receipt))
        .route("/receipts/:id/text", get(receipts::get_receipt_text))
        .route("/reports/income", get(reports::income))
        .route("/billing/run", post(reports::run_billing));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .route("/public/receipts/:id", get(receipts::get_public_receipt))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serves the API until Ctrl-C is received.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
