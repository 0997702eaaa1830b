use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// Typed errors for spacesweep operations.
// `anyhow` stays at the binary top level; the library reports
// precise failures so callers can tell cancellation from breakage.

/// Outcome of a scan that did not produce a summary.
///
/// Missing or unreadable sources never end up here: they contribute
/// zero to their category and the scan keeps going.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The run was cancelled at a phase boundary
    #[error("scan cancelled after {completed_phases} completed phase(s)")]
    Cancelled { completed_phases: usize },

    /// `start` was called while this orchestrator was mid-run
    #[error("a scan is already running on this orchestrator")]
    AlreadyRunning,

    /// The worker thread running the scan died
    #[error("scan worker failed: {0}")]
    Worker(String),
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled { .. })
    }
}

/// Why a single item ended up in `CleanupResult::failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// Classified unsafe, either at scan time or on re-check
    #[error("protected path")]
    ProtectedPath,

    /// The filesystem refused the removal
    #[error("{0}")]
    Io(String),
}

/// Configuration file problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{tier} tier expects {expected} phase weights, found {found}")]
    InvalidWeights {
        tier: String,
        expected: usize,
        found: usize,
    },
}
