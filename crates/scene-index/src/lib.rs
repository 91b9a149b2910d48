//! Filtered view over the ordered scene collection.
//!
//! Three indices identify a scene:
//!
//! - `pos`: stable identity, the only key used for label storage
//! - `original_index`: 1-based position in the unfiltered collection, shown
//!   to users and carried in shareable locators
//! - *position*: index into the current filtered sequence; transient
//!
//! [`SceneIndex`] owns the filtered sequence and the current position and
//! guarantees the position is always valid or the sequence is empty.

pub mod error;
pub mod filter;
pub mod index;

pub use error::{IndexError, Result};
pub use filter::MonthFilter;
pub use index::SceneIndex;
