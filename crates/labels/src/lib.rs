//! Scene labels.
//!
//! A label group (for example `quality`) has an ordered set of permitted
//! values; each scene, keyed by its stable `pos`, holds at most one value
//! per group or is unset. [`LabelStore`] is the single source of truth and
//! broadcasts every change so each presentation can react. Changes can be
//! pushed to a remote persistence service when its capability document
//! advertises labels.

pub mod capabilities;
pub mod document;
pub mod error;
pub mod store;
pub mod sync;

pub use capabilities::{probe_capabilities, Capabilities, CAPABILITIES_URL};
pub use document::LabelDocument;
pub use error::{LabelError, Result};
pub use store::{LabelChange, LabelStore};
pub use sync::{connect_sync, HttpLabelSync, LabelSync, NoopSync, SyncQueue};
