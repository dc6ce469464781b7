/*!
 * Core Module
 * Shared type aliases, limits, and the validation-error taxonomy
 */

pub mod errors;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use types::*;
