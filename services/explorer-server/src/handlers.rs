//! HTTP request handlers.

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use grid_codec::{fetch_grid, DataSource, DecodedGrid};
use labels::Capabilities;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use renderer::{encode_png, to_image, to_legend, LEGEND_HEIGHT, LEGEND_WIDTH};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{AppState, Result, ServerError};

/// Largest legend or layer image the server will render, per side.
const MAX_IMAGE_SIDE: u32 = 4096;

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LegendQuery {
    pub cmap: String,
    pub vmin: f32,
    pub vmax: f32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A missing bound defaults to the grid's own minimum or maximum.
#[derive(Debug, Deserialize)]
pub struct ScaleQuery {
    pub cmap: String,
    pub vmin: Option<f32>,
    pub vmax: Option<f32>,
}

impl ScaleQuery {
    fn range_for(&self, grid: &DecodedGrid) -> (f32, f32) {
        match (self.vmin, self.vmax) {
            (Some(vmin), Some(vmax)) => (vmin, vmax),
            (vmin, vmax) => {
                let (lo, hi) = grid.value_range().unwrap_or((0.0, 1.0));
                (vmin.unwrap_or(lo), vmax.unwrap_or(hi))
            }
        }
    }
}

// ============================================================================
// Scene folder
// ============================================================================

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "js" => "text/javascript",
        "css" => "text/css",
        _ => "application/octet-stream",
    }
}

async fn serve_file(state: &AppState, path: &str) -> Result<Response> {
    counter!("explorer_requests_total", "kind" => "file").increment(1);
    let bytes = state
        .source
        .fetch(path)
        .await
        .map_err(|_| ServerError::NotFound(path.to_string()))?;
    debug!(path = %path, bytes = bytes.len(), "Serving file");
    Ok(([(header::CONTENT_TYPE, content_type(path))], bytes).into_response())
}

/// GET / and /index.html
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Result<Response> {
    serve_file(&state, "index.html").await
}

/// GET /:file
pub async fn file_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response> {
    serve_file(&state, &file).await
}

/// GET /data/:file
pub async fn data_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response> {
    serve_file(&state, &format!("data/{}", file)).await
}

/// GET /images/:file
pub async fn images_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response> {
    serve_file(&state, &format!("images/{}", file)).await
}

/// GET /cmaps/:file
pub async fn cmaps_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response> {
    serve_file(&state, &format!("cmaps/{}", file)).await
}

/// GET /service_info/services.json
pub async fn services_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Capabilities> {
    Json(Capabilities {
        labels: state.labels_enabled(),
    })
}

// ============================================================================
// Labels
// ============================================================================

/// POST /label/:group/:index/:label
#[instrument(skip(state))]
pub async fn set_label_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((group, index, label)): Path<(String, usize, String)>,
) -> Result<Json<serde_json::Value>> {
    let labels = enabled_labels(&state)?;
    labels.write().await.set_label(&group, index, &label)?;
    counter!("explorer_label_updates_total", "op" => "set").increment(1);
    info!(group = %group, pos = index, label = %label, "Label set");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /label/:group/:index
#[instrument(skip(state))]
pub async fn clear_label_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((group, index)): Path<(String, usize)>,
) -> Result<Json<serde_json::Value>> {
    let labels = enabled_labels(&state)?;
    labels.write().await.clear_label(&group, index)?;
    counter!("explorer_label_updates_total", "op" => "clear").increment(1);
    info!(group = %group, pos = index, "Label cleared");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /labels.json is served from memory so clients see unsaved edits.
pub async fn labels_document_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response> {
    let Some(labels) = &state.labels else {
        return serve_file(&state, crate::state::LABELS_FILE).await;
    };
    counter!("explorer_requests_total", "kind" => "labels").increment(1);
    let json = labels.read().await.snapshot().to_json()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

fn enabled_labels(state: &AppState) -> Result<&tokio::sync::RwLock<labels::LabelStore>> {
    match &state.labels {
        Some(labels) if state.advertise_labels => Ok(labels),
        _ => Err(ServerError::LabelsDisabled),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn check_side(name: &str, value: u32) -> Result<u32> {
    if value == 0 || value > MAX_IMAGE_SIDE {
        return Err(ServerError::BadRequest(format!(
            "{} must be in 1..={}, got {}",
            name, MAX_IMAGE_SIDE, value
        )));
    }
    Ok(value)
}

fn png_response(png: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], Bytes::from(png)).into_response()
}

/// GET /api/legend?cmap&vmin&vmax&width&height
pub async fn legend_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<LegendQuery>,
) -> Result<Response> {
    counter!("explorer_render_requests_total", "kind" => "legend").increment(1);
    let width = check_side("width", query.width.unwrap_or(LEGEND_WIDTH))?;
    let height = check_side("height", query.height.unwrap_or(LEGEND_HEIGHT))?;

    let cmap = state.colormap(&query.cmap).await?;
    let legend = to_legend(&cmap, query.vmin, query.vmax, height, width);
    Ok(png_response(encode_png(&legend)?))
}

/// GET /api/scenes/:index/:layer.png?cmap[&vmin][&vmax]
///
/// Renders a raw data layer of the scene with the given original index.
#[instrument(skip(state))]
pub async fn scene_layer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((index, file)): Path<(usize, String)>,
    Query(query): Query<ScaleQuery>,
) -> Result<Response> {
    counter!("explorer_render_requests_total", "kind" => "layer").increment(1);
    let layer = file
        .strip_suffix(".png")
        .ok_or_else(|| ServerError::NotFound(file.clone()))?;
    let manifest = state
        .manifest
        .as_ref()
        .ok_or_else(|| ServerError::NotFound("scene manifest".to_string()))?;
    let scene = manifest
        .scene_by_original_index(index)
        .ok_or_else(|| ServerError::NotFound(format!("scene {}", index)))?;
    let src = scene
        .data_srcs
        .get(layer)
        .ok_or_else(|| ServerError::NotFound(format!("layer '{}' of scene {}", layer, index)))?;

    let grid = fetch_grid(&state.source, &src.url).await.map_err(|e| {
        if e.is_fetch() {
            ServerError::NotFound(src.url.clone())
        } else {
            ServerError::BadRequest(e.to_string())
        }
    })?;
    let cmap = state.colormap(&query.cmap).await?;
    let (vmin, vmax) = query.range_for(&grid);
    debug!(layer = %layer, vmin, vmax, "Rendering scene layer");
    let image = to_image(&grid, &cmap, vmin, vmax);
    Ok(png_response(encode_png(&image)?))
}

// ============================================================================
// Operations
// ============================================================================

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}
