//! Binary grid codec for raw scene layers.
//!
//! Wire format (after gzip decompression), all little-endian:
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────────────────┐
//! │ i32 height   │ i32 width    │ f32 × height × width (row-major) │
//! └──────────────┴──────────────┴──────────────────────────────────┘
//! ```
//!
//! Missing cells are stored as NaN. Decoding distinguishes "could not get
//! the bytes" ([`CodecError::Fetch`]) from "the bytes are malformed"
//! ([`CodecError::Format`]).

pub mod codec;
pub mod error;
pub mod grid;
pub mod source;

pub use codec::{decode_grid, decode_payload, encode_grid, HEADER_LEN};
pub use error::{CodecError, Result};
pub use grid::DecodedGrid;
pub use source::{fetch_grid, DataSource, FsSource, HttpSource};
