//! Rendering for scene layers.
//!
//! - Colormap tables and a registry that loads them through a
//!   [`DataSource`](grid_codec::DataSource)
//! - Rasterizing decoded grids and legend strips
//! - Back-to-front compositing of layer images
//! - PNG encoding

pub mod colormap;
pub mod composite;
pub mod error;
pub mod png;
pub mod raster;

pub use colormap::{ColorMap, ColorMapRegistry, ColorScale, Rgb};
pub use composite::flatten;
pub use error::{RenderError, Result};
pub use png::{decode_png, encode_png, encode_png_rgba};
pub use raster::{legend_value, to_image, to_legend, LEGEND_HEIGHT, LEGEND_WIDTH};
