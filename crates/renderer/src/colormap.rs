//! Named colormap tables and the registry that loads them.
//!
//! A colormap is fetched once per name from `cmaps/<name>.json`, a JSON
//! array of `[r, g, b]` triples with components in `0..=1`. Mapping a value
//! picks one of the N entries by linear bucketing between `vmin` and `vmax`.

use grid_codec::DataSource;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{RenderError, Result};

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA form.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// An ordered, non-empty table of colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    name: String,
    colors: Vec<Rgb>,
}

impl ColorMap {
    /// Build a colormap from explicit colors.
    pub fn new(name: impl Into<String>, colors: Vec<Rgb>) -> Result<Self> {
        let name = name.into();
        if colors.is_empty() {
            return Err(RenderError::load(name, "colormap has no entries"));
        }
        Ok(Self { name, colors })
    }

    /// Parse the JSON table form.
    pub fn from_json(name: &str, json: &[u8]) -> Result<Self> {
        let entries: Vec<[f64; 3]> =
            serde_json::from_slice(json).map_err(|e| RenderError::load(name, e.to_string()))?;

        let mut colors = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let mut rgb = [0u8; 3];
            for (slot, &c) in rgb.iter_mut().zip(entry) {
                if !(0.0..=1.0).contains(&c) {
                    return Err(RenderError::load(
                        name,
                        format!("entry {} has component {} outside 0..1", i, c),
                    ));
                }
                *slot = (c * 255.0).round() as u8;
            }
            colors.push(Rgb::new(rgb[0], rgb[1], rgb[2]));
        }
        Self::new(name, colors)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Table index for `v`, or `None` for NaN.
    ///
    /// `idx = floor((v - vmin) / (vmax - vmin) * N)` clamped to `0..N`.
    /// A zero-width range maps everything to index 0.
    #[inline]
    pub fn bucket(&self, vmin: f32, vmax: f32, v: f32) -> Option<usize> {
        if v.is_nan() {
            return None;
        }
        let n = self.colors.len();
        let span = vmax as f64 - vmin as f64;
        if span == 0.0 || !span.is_finite() {
            return Some(0);
        }
        let scaled = ((v as f64 - vmin as f64) / span * n as f64).floor();
        if scaled.is_nan() {
            return None;
        }
        Some(if scaled <= 0.0 {
            0
        } else if scaled >= (n - 1) as f64 {
            n - 1
        } else {
            scaled as usize
        })
    }

    /// Color for `v`, or `None` (transparent) for NaN.
    #[inline]
    pub fn map(&self, vmin: f32, vmax: f32, v: f32) -> Option<Rgb> {
        self.bucket(vmin, vmax, v).map(|i| self.colors[i])
    }
}

/// Colormap choice for a raw data layer: name plus value range.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub cmap: String,
    pub vmin: f32,
    pub vmax: f32,
}

impl ColorScale {
    pub fn new(cmap: impl Into<String>, vmin: f32, vmax: f32) -> Self {
        Self {
            cmap: cmap.into(),
            vmin,
            vmax,
        }
    }
}

/// Parses `cmap:vmin:vmax`.
impl FromStr for ColorScale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let vmax = parts.next();
        let vmin = parts.next();
        let cmap = parts.next();
        match (cmap, vmin, vmax) {
            (Some(cmap), Some(vmin), Some(vmax)) if !cmap.is_empty() => {
                let vmin: f32 = vmin
                    .parse()
                    .map_err(|_| format!("invalid vmin '{}'", vmin))?;
                let vmax: f32 = vmax
                    .parse()
                    .map_err(|_| format!("invalid vmax '{}'", vmax))?;
                Ok(Self::new(cmap, vmin, vmax))
            }
            _ => Err(format!("expected cmap:vmin:vmax, got '{}'", s)),
        }
    }
}

/// Loaded colormaps by name.
#[derive(Debug, Default, Clone)]
pub struct ColorMapRegistry {
    maps: HashMap<String, Arc<ColorMap>>,
}

impl ColorMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL of a colormap table relative to the scene folder.
    pub fn url_for(name: &str) -> String {
        format!("cmaps/{}.json", name)
    }

    /// Fetch and register `name`. Loading an already-loaded name is a no-op.
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub async fn load(&mut self, source: &dyn DataSource, name: &str) -> Result<()> {
        if self.is_loaded(name) {
            debug!(cmap = %name, "Colormap already loaded");
            return Ok(());
        }

        let url = Self::url_for(name);
        let bytes = source
            .fetch(&url)
            .await
            .map_err(|e| RenderError::load(name, e.to_string()))?;
        let cmap = ColorMap::from_json(name, &bytes)?;

        info!(cmap = %name, entries = cmap.len(), "Loaded colormap");
        self.insert(cmap);
        Ok(())
    }

    /// Register a colormap directly, replacing any entry with the same name.
    pub fn insert(&mut self, cmap: ColorMap) {
        self.maps.insert(cmap.name().to_string(), Arc::new(cmap));
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    /// Look up a loaded colormap.
    pub fn get(&self, name: &str) -> Result<Arc<ColorMap>> {
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::ColorMapNotLoaded(name.to_string()))
    }

    /// Map one value through a loaded colormap.
    pub fn map_value(&self, name: &str, vmin: f32, vmax: f32, v: f32) -> Result<Option<Rgb>> {
        let cmap = self
            .maps
            .get(name)
            .ok_or_else(|| RenderError::ColorMapNotLoaded(name.to_string()))?;
        Ok(cmap.map(vmin, vmax, v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}
