/*!
 * Synchronization Module
 * Waiter registry, wait engines, notifier, and the timeout scheduler
 */

pub mod future;
pub mod manager;
pub mod registry;
pub mod timeout;
pub mod types;
pub mod waiter;

pub use future::WaitFuture;
pub use manager::{AsyncWait, FutexManager};
pub use registry::WaiterRegistry;
pub use types::{RegistryStats, WaitLocation, WaitOutcome};
