/*!
 * Error Types
 * Validation errors for the wait/notify surface, reported before any
 * waiter state exists
 */

use crate::memory::ElementKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation error types
///
/// These map onto the host runtime's RangeError/TypeError split:
/// out-of-bounds and non-shared backing are range errors, a non-waitable
/// element kind is a type error. Race outcomes are never errors; they are
/// [`crate::sync::WaitOutcome`] values.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum WaitError {
    /// Index past the end of the view
    #[error("Index out of bounds: {index} >= {length}")]
    OutOfBounds { index: usize, length: usize },

    /// The view is not backed by shared memory
    #[error("View is not backed by shared memory")]
    NotShared,

    /// Element kind cannot be waited on
    #[error("Element kind {0:?} does not support waiting")]
    NotWaitable(ElementKind),

    /// View window does not fit its block
    #[error("Invalid view range: offset {offset}, size {size}, block size {block_size}")]
    InvalidRange {
        offset: usize,
        size: usize,
        block_size: usize,
    },

    /// View offset not aligned to the element width
    #[error("Misaligned view: offset {offset}, element width {width}")]
    Misaligned { offset: usize, width: usize },

    /// Block size rejected
    #[error("Invalid size: {0}")]
    InvalidSize(String),
}
