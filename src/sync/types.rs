/*!
 * Synchronization Types
 * Keys, race outcomes, and diagnostics for the wait/notify subsystem
 */

use crate::core::types::{BlockId, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Synchronization key: block identity plus byte offset
///
/// Equality is structural, so any two views that address the same byte of
/// the same block wait on the same list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaitLocation {
    pub block: BlockId,
    pub byte_offset: Size,
}

/// Result of a wait: the three defined race outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitOutcome {
    /// Woken by a notify
    Ok,
    /// Current value differed from the expected value; never enqueued
    NotEqual,
    /// Deadline elapsed before any notify claimed the waiter
    TimedOut,
}

impl WaitOutcome {
    /// Host-runtime result string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotEqual => "not-equal",
            Self::TimedOut => "timed-out",
        }
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry-wide diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistryStats {
    pub locations: usize,
    pub waiters: usize,
}

impl RegistryStats {
    /// Serialize for diagnostic dumps
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to serialize registry stats: {}", e))
    }
}
