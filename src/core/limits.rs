/*!
 * Limits and Constants
 *
 * Centralized location for crate-wide limits and thresholds.
 */

/// Maximum size of a single shared block (100MB)
/// Waiting addresses at most one element; larger regions belong to a
/// dedicated allocator, not this primitive
pub const MAX_BLOCK_SIZE: usize = 100 * 1024 * 1024;

/// Word width of the block backing store (8 bytes)
/// Storage is 8-byte aligned so every element width up to u64 can be
/// loaded atomically at its natural alignment
pub const BLOCK_WORD_BYTES: usize = 8;
