/*!
 * waitq Library
 * Futex-like wait/notify over shared memory blocks, with synchronous and
 * asynchronous wait engines, strict FIFO wake order, and exactly-once
 * resolution of the notify/timeout race
 */

pub mod core;
pub mod memory;
pub mod sync;

// Re-exports
pub use crate::core::errors::WaitError;
pub use crate::core::types::{BlockId, WaitqResult};
pub use memory::{ElementKind, SharedBlock, SharedView};
pub use sync::{AsyncWait, FutexManager, RegistryStats, WaitFuture, WaitLocation, WaitOutcome};
