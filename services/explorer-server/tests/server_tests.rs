//! Router tests against a sample scene folder on disk.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use explorer_server::{create_router, AppState};
use labels::LabelDocument;
use std::sync::Arc;
use tempfile::TempDir;
use test_utils::{labels::QUALITY, write_scene_folder, GREYS, GRID_HEIGHT, GRID_WIDTH};
use tower::ServiceExt;

fn scene_folder() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_scene_folder(dir.path()).unwrap();
    dir
}

fn serve(dir: &TempDir, advertise_labels: bool) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::open(dir.path(), advertise_labels).unwrap());
    (create_router(state.clone(), None), state)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Method::GET, uri).await
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// Scene folder
// ============================================================================

#[tokio::test]
async fn test_serves_folder_files() {
    let dir = scene_folder();
    std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    let (app, _) = serve(&dir, true);

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html></html>");

    let (status, body) = get(&app, "/scenes.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["index"].as_array().unwrap().len(), 5);

    let (status, body) = get(&app, "/data/sst_0.gz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, std::fs::read(dir.path().join("data/sst_0.gz")).unwrap());

    let (status, _) = get(&app, "/images/rgb_3.png").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/cmaps/greys.json").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_and_escaping_paths_are_not_found() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);

    let (status, body) = get(&app, "/data/none.gz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].is_string());

    let (status, _) = get(&app, "/data/..%2Fscenes.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // no index.html in the sample folder
    let (status, _) = get(&app, "/index.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    // recorder not installed
    let (status, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Capabilities and labels
// ============================================================================

#[tokio::test]
async fn test_services_advertises_labels() {
    let dir = scene_folder();

    let (app, _) = serve(&dir, true);
    let (status, body) = get(&app, "/service_info/services.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({ "labels": true }));

    let (app, _) = serve(&dir, false);
    let (_, body) = get(&app, "/service_info/services.json").await;
    assert_eq!(json(&body), serde_json::json!({ "labels": false }));
}

#[tokio::test]
async fn test_services_without_label_document() {
    let dir = scene_folder();
    std::fs::remove_file(dir.path().join("labels.json")).unwrap();
    let (app, _) = serve(&dir, true);

    let (_, body) = get(&app, "/service_info/services.json").await;
    assert_eq!(json(&body)["labels"], false);

    let (status, _) = send(&app, Method::POST, "/label/quality/0/good").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_and_clear_label() {
    let dir = scene_folder();
    let (app, state) = serve(&dir, true);

    let (status, body) = send(&app, Method::POST, "/label/quality/3/good").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({ "success": true }));

    // unsaved edits are visible through the document route
    let (status, body) = get(&app, "/labels.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["values"][QUALITY][3], "good");

    let (status, _) = send(&app, Method::DELETE, "/label/quality/1").await;
    assert_eq!(status, StatusCode::OK);

    let store = state.labels.as_ref().unwrap().read().await;
    assert_eq!(store.get(QUALITY, 3), Some("good"));
    assert_eq!(store.get(QUALITY, 1), None);
    assert!(store.is_dirty());
}

#[tokio::test]
async fn test_label_rejections() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);

    let (status, _) = send(&app, Method::POST, "/label/quality/0/excellent").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/label/mood/0/good").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/label/quality/99/good").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/label/quality/notanumber/good").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_labels_disabled_rejects_edits() {
    let dir = scene_folder();
    let (app, state) = serve(&dir, false);

    let (status, _) = send(&app, Method::POST, "/label/quality/0/good").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!state.labels.as_ref().unwrap().read().await.is_dirty());
}

#[tokio::test]
async fn test_save_labels_writes_document() {
    let dir = scene_folder();
    let (app, state) = serve(&dir, true);

    send(&app, Method::POST, "/label/quality/0/unsure").await;
    assert!(state.save_labels().await.unwrap());
    // nothing left to write
    assert!(!state.save_labels().await.unwrap());

    let doc = LabelDocument::load(dir.path().join("labels.json")).unwrap();
    assert_eq!(doc.values[QUALITY][0].as_deref(), Some("unsure"));
    assert_eq!(doc.values[QUALITY][1].as_deref(), Some("bad"));
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_legend_default_size() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);

    let uri = format!("/api/legend?cmap={}&vmin=0&vmax=1", GREYS);
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let legend = renderer::decode_png(&body).unwrap();
    assert_eq!(legend.dimensions(), (200, 20));

    let uri = format!("/api/legend?cmap={}&vmin=0&vmax=1&width=64&height=8", GREYS);
    let (_, body) = get(&app, &uri).await;
    assert_eq!(renderer::decode_png(&body).unwrap().dimensions(), (64, 8));
}

#[tokio::test]
async fn test_legend_rejections() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);

    let uri = format!("/api/legend?cmap={}&vmin=0&vmax=1&width=0", GREYS);
    let (status, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/legend?cmap=nosuchmap&vmin=0&vmax=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/legend?vmin=0&vmax=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scene_layer_render() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);

    let uri = format!("/api/scenes/2/sst.png?cmap={}&vmin=270&vmax=300", GREYS);
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let image = renderer::decode_png(&body).unwrap();
    assert_eq!(
        image.dimensions(),
        (GRID_WIDTH as u32, GRID_HEIGHT as u32)
    );
}

#[tokio::test]
async fn test_scene_layer_range_defaults_to_grid() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);

    // scene 3 (pos 2) spans 272..302 with its top-right cell missing
    let (status, body) = get(&app, &format!("/api/scenes/3/sst.png?cmap={}", GREYS)).await;
    assert_eq!(status, StatusCode::OK);
    let image = renderer::decode_png(&body).unwrap();
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(3, 1).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(3, 0).0[3], 0);
}

#[tokio::test]
async fn test_scene_layer_not_found() {
    let dir = scene_folder();
    let (app, _) = serve(&dir, true);
    let query = format!("?cmap={}&vmin=0&vmax=1", GREYS);

    // original indices start at 1
    let (status, _) = get(&app, &format!("/api/scenes/0/sst.png{}", query)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, &format!("/api/scenes/9/sst.png{}", query)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // rgb has no raw data
    let (status, _) = get(&app, &format!("/api/scenes/1/rgb.png{}", query)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, &format!("/api/scenes/1/sst.tif{}", query)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
