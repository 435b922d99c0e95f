//! HTTP API for clinic appointment booking.
//!
//! Thin axum layer over `clinic-booking-core`. Identity comes from the
//! upstream gateway (see [`auth`]); every request opens its own database
//! connection so concurrent bookings contend only inside SQLite.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use clinic_booking_core::db::Database;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use crate::config::ServerConfig;
pub use crate::error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub database_path: Arc<PathBuf>,
    pub busy_timeout: Duration,
}

impl AppState {
    pub fn new(database_path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            database_path: Arc::new(database_path.into()),
            busy_timeout,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/appointments", post(routes::book_appointment))
        .route("/appointments/patient", get(routes::list_patient_appointments))
        .route("/appointments/doctor", get(routes::list_doctor_appointments))
        .route("/appointments/:id/cancel", put(routes::cancel_appointment))
        .route("/appointments/:id/status", put(routes::update_appointment_status))
        .route("/doctors", get(routes::list_doctors))
        .route(
            "/doctors/:id/availability",
            get(routes::get_availability).post(routes::add_availability),
        )
        .route(
            "/doctors/:id/availability/:slot_id",
            delete(routes::remove_availability),
        )
        .route("/admin/doctors", post(routes::register_doctor))
        .route("/admin/doctors/:id", get(routes::get_doctor))
        .route(
            "/admin/appointments",
            get(routes::list_all_appointments).post(routes::create_pending_appointment),
        )
        .route("/admin/appointments/:id", get(routes::get_appointment))
        .route("/admin/activity", get(routes::recent_activity))
        .with_state(state)
        .layer(cors)
}

/// Migrate the database, then serve until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    Database::open_with_busy_timeout(&config.database_path, config.busy_timeout())
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let state = AppState::new(config.database_path.clone(), config.busy_timeout());
    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    info!(%addr, database = %config.database_path.display(), "clinic booking API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("clinic booking API stopped");
    Ok(())
}
