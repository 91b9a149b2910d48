//! Label editing, layer display state and compositing through the view
//! controller.

mod common;

use common::{controller, controller_over, controller_with_sync, GatedSync, RecordingSync};
use renderer::ColorScale;
use std::sync::Arc;
use std::time::Duration;
use test_utils::labels::QUALITY;
use test_utils::{layers, sample_image, sample_source, GREYS, GRID_HEIGHT, GRID_WIDTH};
use viewer::{LayerImage, Presentation, ViewError, ViewEvent};

fn edit(source: Presentation, pos: usize, value: Option<&str>) -> ViewEvent {
    ViewEvent::LabelEdit {
        source,
        group: QUALITY.to_string(),
        pos,
        value: value.map(str::to_string),
    }
}

// ============================================================================
// Label edits
// ============================================================================

#[tokio::test]
async fn test_grid_edit_of_current_scene_mirrors_to_overlay() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    let before = c.surface().writes_to(Presentation::Overlay).len();

    c.handle(edit(Presentation::Grid, 0, Some("good"))).await.unwrap();

    assert_eq!(c.labels().unwrap().get(QUALITY, 0), Some("good"));
    let overlay = c.surface().writes_to(Presentation::Overlay);
    assert_eq!(overlay.len(), before + 1);
    assert_eq!(overlay.last().unwrap().value.as_deref(), Some("good"));
}

#[tokio::test]
async fn test_grid_edit_of_other_scene_skips_overlay() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    let before = c.surface().writes_to(Presentation::Overlay).len();

    c.handle(edit(Presentation::Grid, 3, Some("unsure"))).await.unwrap();

    assert_eq!(c.labels().unwrap().get(QUALITY, 3), Some("unsure"));
    assert_eq!(c.surface().writes_to(Presentation::Overlay).len(), before);
}

#[tokio::test]
async fn test_overlay_edit_mirrors_to_grid() {
    let (mut c, _) = controller();
    c.start(Some("?index=2")).await.unwrap();

    c.handle(edit(Presentation::Overlay, 1, None)).await.unwrap();

    assert_eq!(c.labels().unwrap().get(QUALITY, 1), None);
    let last = c.surface().writes_to(Presentation::Grid).last().cloned().cloned().unwrap();
    assert_eq!((last.pos, last.value), (1, None));
}

#[tokio::test]
async fn test_overlay_edit_of_filtered_scene_skips_grid() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    c.handle(ViewEvent::ToggleMonth(2)).await.unwrap();
    let before = c.surface().writes_to(Presentation::Grid).len();

    // pos 1 is a February scene, not in the grid any more
    c.handle(edit(Presentation::Overlay, 1, Some("good"))).await.unwrap();
    assert_eq!(c.surface().writes_to(Presentation::Grid).len(), before);
    assert_eq!(c.labels().unwrap().get(QUALITY, 1), Some("good"));
}

#[tokio::test]
async fn test_invalid_label_edits() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();

    assert!(matches!(
        c.handle(edit(Presentation::Grid, 0, Some("excellent"))).await,
        Err(ViewError::Label(_))
    ));
    assert!(matches!(
        c.handle(edit(Presentation::Grid, 99, Some("good"))).await,
        Err(ViewError::Label(_))
    ));
    assert_eq!(c.labels().unwrap().get(QUALITY, 0), None);
}

#[tokio::test]
async fn test_label_edit_without_store() {
    let mut c = controller_over(Arc::new(sample_source()));
    c.start(None).await.unwrap();
    assert!(matches!(
        c.handle(edit(Presentation::Grid, 0, Some("good"))).await,
        Err(ViewError::LabelsDisabled)
    ));
    assert!(c.subscribe_labels().is_none());
}

#[tokio::test]
async fn test_label_edits_are_pushed_and_broadcast() {
    let sync = Arc::new(RecordingSync::default());
    let (mut c, _) = controller_with_sync(sync.clone());
    let mut changes = c.subscribe_labels().unwrap();
    c.start(None).await.unwrap();

    c.handle(edit(Presentation::Grid, 2, Some("good"))).await.unwrap();
    c.handle(edit(Presentation::Grid, 2, None)).await.unwrap();
    c.flush_label_sync().await;

    let pushes = sync.pushes.lock().unwrap().clone();
    assert_eq!(
        pushes,
        vec![
            (QUALITY.to_string(), 2, Some("good".to_string())),
            (QUALITY.to_string(), 2, None),
        ]
    );
    assert_eq!(changes.recv().await.unwrap().value.as_deref(), Some("good"));
    assert_eq!(changes.recv().await.unwrap().value, None);
}

#[tokio::test]
async fn test_failed_sync_keeps_local_label() {
    let sync = Arc::new(RecordingSync {
        failing: true,
        ..Default::default()
    });
    let (mut c, _) = controller_with_sync(sync.clone());
    c.start(None).await.unwrap();

    c.handle(edit(Presentation::Overlay, 0, Some("bad"))).await.unwrap();
    c.flush_label_sync().await;
    assert_eq!(sync.pushes.lock().unwrap().len(), 1);
    assert_eq!(c.labels().unwrap().get(QUALITY, 0), Some("bad"));
    assert!(c.labels().unwrap().is_dirty());
}

#[tokio::test]
async fn test_pending_sync_does_not_hold_up_navigation() {
    let sync = Arc::new(GatedSync::default());
    let (mut c, _) = controller_with_sync(sync.clone());
    c.start(None).await.unwrap();

    // the remote does not answer until the gate opens
    let edit_then_next = async {
        c.handle(edit(Presentation::Overlay, 0, Some("good"))).await.unwrap();
        c.handle(ViewEvent::Next).await.unwrap();
    };
    tokio::time::timeout(Duration::from_secs(5), edit_then_next)
        .await
        .expect("navigation waited on label sync");

    assert_eq!(c.index().position(), Some(1));
    assert_eq!(c.labels().unwrap().get(QUALITY, 0), Some("good"));
    assert!(sync.pushes.lock().unwrap().is_empty());

    sync.gate.notify_one();
    c.flush_label_sync().await;
    assert_eq!(
        *sync.pushes.lock().unwrap(),
        vec![(QUALITY.to_string(), 0, Some("good".to_string()))]
    );
}

// ============================================================================
// Layer display state
// ============================================================================

#[tokio::test]
async fn test_group_opacity_is_mirrored() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();

    c.handle(ViewEvent::SetOpacity {
        layer: layers::RGB.to_string(),
        opacity: 0.3,
    })
    .await
    .unwrap();

    assert_eq!(c.surface().layer(layers::RGB).unwrap().2, 0.3);
    assert_eq!(c.layers().opacity(layers::FALSE_COLOUR), 0.3);
    assert!(c.surface().layer(layers::FALSE_COLOUR).is_none());
}

#[tokio::test]
async fn test_select_group_layer_swaps_drawn_member() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    c.handle(ViewEvent::SetOpacity {
        layer: layers::RGB.to_string(),
        opacity: 0.6,
    })
    .await
    .unwrap();

    c.handle(ViewEvent::SelectGroupLayer(layers::FALSE_COLOUR.to_string()))
        .await
        .unwrap();

    let names = c.surface().stack_names();
    assert!(names.contains(&layers::FALSE_COLOUR));
    assert!(!names.contains(&layers::RGB));
    assert_eq!(c.surface().layer(layers::FALSE_COLOUR).unwrap().2, 0.6);
}

#[tokio::test]
async fn test_unknown_layer_is_rejected() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    assert!(matches!(
        c.handle(ViewEvent::SetOpacity {
            layer: "ghost".to_string(),
            opacity: 1.0
        })
        .await,
        Err(ViewError::UnknownLayer(_))
    ));
}

#[tokio::test]
async fn test_close_all_layers() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    c.handle(ViewEvent::CloseAllLayers).await.unwrap();
    assert!(c.surface().stack.iter().all(|(_, _, opacity)| *opacity == 0.0));
}

// ============================================================================
// Dynamic colormaps
// ============================================================================

#[tokio::test]
async fn test_color_scale_rasterizes_data_layer() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();

    c.handle(ViewEvent::SetColorScale {
        layer: layers::SST.to_string(),
        scale: ColorScale::new(GREYS, 270.0, 300.0),
    })
    .await
    .unwrap();

    let legend = &c.surface().legends[layers::SST];
    assert_eq!(legend.dimensions(), (200, 20));

    let raster = c.raster(layers::SST).unwrap();
    assert_eq!(raster.dimensions(), (GRID_WIDTH as u32, GRID_HEIGHT as u32));
    // 270 is the bottom bucket, 300 the top, the top-right cell is missing
    assert_eq!(raster.get_pixel(0, 1).0, [0, 0, 0, 255]);
    assert_eq!(raster.get_pixel(3, 1).0, [255, 255, 255, 255]);
    assert_eq!(raster.get_pixel(3, 0).0[3], 0);

    match &c.surface().layer(layers::SST).unwrap().1 {
        LayerImage::Rendered(img) => assert!(Arc::ptr_eq(img, &raster)),
        other => panic!("expected rendered layer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_color_scale_survives_navigation() {
    let (mut c, source) = controller();
    c.start(None).await.unwrap();
    c.handle(ViewEvent::SetColorScale {
        layer: layers::SST.to_string(),
        scale: ColorScale::new(GREYS, 270.0, 300.0),
    })
    .await
    .unwrap();
    c.handle(ViewEvent::Next).await.unwrap();

    assert!(c.raster(layers::SST).is_some());
    assert!(matches!(
        c.surface().layer(layers::SST).unwrap().1,
        LayerImage::Rendered(_)
    ));
    assert_eq!(source.fetch_count("cmaps/greys.json"), 1);
}

#[tokio::test]
async fn test_color_scale_errors() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();

    assert!(matches!(
        c.handle(ViewEvent::SetColorScale {
            layer: layers::RGB.to_string(),
            scale: ColorScale::new(GREYS, 0.0, 1.0),
        })
        .await,
        Err(ViewError::NotDataLayer(_))
    ));
    assert!(matches!(
        c.handle(ViewEvent::SetColorScale {
            layer: layers::SST.to_string(),
            scale: ColorScale::new("nope", 0.0, 1.0),
        })
        .await,
        Err(ViewError::Render(_))
    ));
    assert!(c.layers().color_scale(layers::SST).is_none());
}

// ============================================================================
// Combined image
// ============================================================================

#[tokio::test]
async fn test_combined_image_single_visible_layer() {
    let (mut c, _) = controller();
    c.start(None).await.unwrap();
    c.handle(ViewEvent::CloseAllLayers).await.unwrap();
    c.handle(ViewEvent::SetOpacity {
        layer: layers::ELEVATION.to_string(),
        opacity: 1.0,
    })
    .await
    .unwrap();

    let image = c.combined_image().await.unwrap();
    let expected = sample_image(layers::ELEVATION, 0);
    assert_eq!(image.get_pixel(1, 1), expected.get_pixel(1, 1));
}

#[tokio::test]
async fn test_combined_image_skips_unfetchable_layer() {
    let source = Arc::new(sample_source());
    source.fail("images/sst_0.png");
    let mut c = controller_over(source);
    c.start(None).await.unwrap();

    let image = c.combined_image().await.unwrap();
    assert_eq!(image.dimensions(), (GRID_WIDTH as u32, GRID_HEIGHT as u32));
}

#[tokio::test]
async fn test_combined_image_without_scene() {
    let (c, _) = controller();
    assert!(matches!(c.combined_image().await, Err(ViewError::NoScene)));
}
