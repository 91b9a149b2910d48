//! Scene folder server for the explorer.
//!
//! Serves a generated scene folder to the browser, advertises and backs the
//! label persistence endpoint, and renders legends and data layers on
//! request with the shared renderer.

pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    extract::Extension,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use error::{Result, ServerError};
pub use state::AppState;

/// Build the application router. `/metrics` is only mounted when a
/// Prometheus recorder is installed.
pub fn create_router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        // Scene folder
        .route("/", get(handlers::index_handler))
        .route("/index.html", get(handlers::index_handler))
        .route("/labels.json", get(handlers::labels_document_handler))
        .route("/:file", get(handlers::file_handler))
        .route("/data/:file", get(handlers::data_handler))
        .route("/images/:file", get(handlers::images_handler))
        .route("/cmaps/:file", get(handlers::cmaps_handler))
        // Capabilities and labels
        .route("/service_info/services.json", get(handlers::services_handler))
        .route("/label/:group/:index/:label", post(handlers::set_label_handler))
        .route("/label/:group/:index", delete(handlers::clear_label_handler))
        // Rendering
        .route("/api/legend", get(handlers::legend_handler))
        .route("/api/scenes/:index/:file", get(handlers::scene_layer_handler))
        // Health check
        .route("/health", get(handlers::health_handler));

    if let Some(handle) = prometheus {
        app = app
            .route("/metrics", get(handlers::metrics_handler))
            .layer(Extension(handle));
    }

    app.layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
