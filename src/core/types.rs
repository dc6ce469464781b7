/*!
 * Core Types
 * Common types used across the crate
 */

/// Identity of a shared memory block, unique for the life of the process
pub type BlockId = u64;

/// Size type for memory operations
pub type Size = usize;

/// Waiter arrival sequence number, unique for the life of the process
pub type SequenceId = u64;

/// Common result type for wait/notify operations
pub type WaitqResult<T> = Result<T, super::errors::WaitError>;
