//! Headless scene renderer.
//!
//! Opens a scene folder, either on disk or served over HTTP, navigates to
//! one scene (optionally under a month filter and with dynamic colormaps on
//! data layers) and writes the flattened overlay as a PNG. Labels given
//! with `--set-label` are applied to that scene and pushed to the server
//! when it advertises label persistence.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use grid_codec::{DataSource, FsSource, HttpSource};
use labels::{connect_sync, probe_capabilities, LabelSync, NoopSync};
use renderer::{encode_png, ColorScale};
use scene_index::MonthFilter;
use viewer::{
    fetch_labels, fetch_manifest, Presentation, TracingSurface, ViewController, ViewEvent,
};

#[derive(Parser, Debug)]
#[command(name = "render-scene")]
#[command(about = "Render one scene of a scene folder to PNG")]
struct Args {
    /// Scene folder containing scenes.json
    #[arg(long, env = "SCENE_FOLDER", default_value = ".")]
    folder: PathBuf,

    /// Base URL of a served scene folder; takes precedence over --folder
    #[arg(long, env = "SCENE_URL")]
    url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// 1-based original index of the scene (default: first visible)
    #[arg(long)]
    index: Option<usize>,

    /// Month to exclude (1-12), repeatable
    #[arg(long = "exclude-month")]
    exclude_month: Vec<u8>,

    /// Where to write the flattened overlay
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Dynamic colormap for a data layer as layer:cmap:vmin:vmax, repeatable
    #[arg(long)]
    legend: Vec<String>,

    /// Label to assign to the scene as group=value, repeatable
    #[arg(long = "set-label")]
    set_label: Vec<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_legend(spec: &str) -> Result<(String, ColorScale)> {
    let (layer, scale) = spec
        .split_once(':')
        .ok_or_else(|| anyhow!("expected layer:cmap:vmin:vmax, got '{}'", spec))?;
    let scale: ColorScale = scale.parse().map_err(|e: String| anyhow!(e))?;
    Ok((layer.to_string(), scale))
}

fn parse_label(spec: &str) -> Result<(String, String)> {
    let (group, value) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("expected group=value, got '{}'", spec))?;
    Ok((group.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let legends = args
        .legend
        .iter()
        .map(|s| parse_legend(s))
        .collect::<Result<Vec<_>>>()?;
    let label_edits = args
        .set_label
        .iter()
        .map(|s| parse_label(s))
        .collect::<Result<Vec<_>>>()?;

    let timeout = Duration::from_secs(args.timeout_secs);
    let source: Arc<dyn DataSource> = match &args.url {
        Some(url) => Arc::new(HttpSource::new(url, timeout)?),
        None => Arc::new(FsSource::new(&args.folder)),
    };
    info!(source = %source.describe(), "Opening scene folder");

    let manifest = fetch_manifest(source.as_ref())
        .await
        .context("failed to load scene manifest")?;
    let scene_count = manifest.scenes.len();
    let labels = fetch_labels(source.as_ref(), scene_count)
        .await
        .context("failed to load label document")?;

    let sync: Arc<dyn LabelSync> = match &args.url {
        Some(url) => {
            let caps = probe_capabilities(source.as_ref()).await;
            info!(labels = caps.labels, "Probed server capabilities");
            connect_sync(&caps, Some(url), timeout)?
        }
        None => Arc::new(NoopSync),
    };

    let mut controller = ViewController::new(manifest, source, TracingSurface);
    if let Some(store) = labels {
        controller = controller.with_labels(store, sync);
    }

    controller.start(None).await?;
    if !args.exclude_month.is_empty() {
        controller
            .apply_filter(MonthFilter::excluding(args.exclude_month.iter().copied()))
            .await;
    }
    if let Some(original_index) = args.index {
        controller
            .handle(ViewEvent::Open { original_index })
            .await
            .with_context(|| format!("cannot open scene {}", original_index))?;
    }

    for (layer, scale) in legends {
        controller
            .handle(ViewEvent::SetColorScale {
                layer: layer.clone(),
                scale,
            })
            .await
            .with_context(|| format!("cannot apply colormap to layer '{}'", layer))?;
    }

    let pos = controller
        .current_scene()
        .map(|scene| scene.pos)
        .ok_or_else(|| anyhow!("no scene is visible"))?;
    for (group, value) in label_edits {
        controller
            .handle(ViewEvent::LabelEdit {
                source: Presentation::Overlay,
                group: group.clone(),
                pos,
                value: Some(value),
            })
            .await
            .with_context(|| format!("cannot set label '{}'", group))?;
    }
    controller.flush_label_sync().await;

    let scene = controller
        .current_scene()
        .ok_or_else(|| anyhow!("no scene is visible"))?;
    info!(
        original_index = scene.original_index,
        timestamp = %scene.timestamp,
        caption = %controller.index().caption(),
        "Rendering scene"
    );
    if let Some(labels) = controller.labels() {
        for (group, value) in labels.labels_for(scene.pos) {
            info!(group = %group, value = ?value, "Scene label");
        }
    }
    info!(tooltip = %controller.tooltip(0.5, 0.5), "Centre point");

    if let Some(output) = &args.output {
        let image = controller.combined_image().await?;
        let png = encode_png(&image)?;
        tokio::fs::write(output, &png)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!(
            path = %output.display(),
            width = image.width(),
            height = image.height(),
            bytes = png.len(),
            "Wrote overlay"
        );
    }

    Ok(())
}
