use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::debug;
use walkdir::WalkDir;

/// Measures how many bytes a path occupies.
///
/// Implementations never fail: a missing path, a permission error or
/// anything else unreadable counts as zero so one bad entry cannot sink
/// a whole phase.
pub trait SizeAggregator: Send + Sync {
    fn size_of(&self, path: &Path) -> u64;
}

/// Which aggregator a tier uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingStrategy {
    /// In-process walk summing file lengths
    #[default]
    Walk,
    /// `du` estimate, falling back to the walk
    NativeDu,
}

impl SizingStrategy {
    pub fn aggregator(&self) -> Box<dyn SizeAggregator> {
        match self {
            SizingStrategy::Walk => Box::new(WalkSizer),
            SizingStrategy::NativeDu => Box::new(NativeDuSizer),
        }
    }
}

/// Pure in-process sizing. Symlinks are never followed, so links pointing
/// outside the measured subtree neither double count nor loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkSizer;

impl SizeAggregator for WalkSizer {
    fn size_of(&self, path: &Path) -> u64 {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "size check failed");
                return 0;
            }
        };

        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            0
        } else if file_type.is_file() {
            metadata.len()
        } else if file_type.is_dir() {
            dir_size(path)
        } else {
            0
        }
    }
}

/// Recursive sum of regular file lengths under a directory
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .sum()
}

/// True when a regular file exists anywhere under `path`
pub fn has_files(path: &Path) -> bool {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file())
}

/// Asks `du` for an on-disk estimate of directories. Fast on large trees,
/// but reports allocated blocks rather than exact byte lengths. Single
/// files use their length, and directories holding no files are 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDuSizer;

impl SizeAggregator for NativeDuSizer {
    fn size_of(&self, path: &Path) -> u64 {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(_) => return 0,
        };

        let file_type = metadata.file_type();
        if file_type.is_file() {
            return metadata.len();
        }
        if !file_type.is_dir() || !has_files(path) {
            return 0;
        }

        match du_kilobytes(path) {
            Some(kb) => kb.saturating_mul(1024),
            None => {
                debug!(path = %path.display(), "du unavailable, walking instead");
                WalkSizer.size_of(path)
            }
        }
    }
}

/// Run `du -skP` and parse the leading number. `du` exits non-zero on
/// partial permission errors but still prints a total, so stdout is
/// parsed regardless of status.
fn du_kilobytes(path: &Path) -> Option<u64> {
    let output = Command::new("du").args(["-s", "-k", "-P"]).arg(path).output().ok()?;
    parse_du_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_du_output(stdout: &str) -> Option<u64> {
    stdout
        .lines()
        .next()?
        .split_whitespace()
        .next()?
        .parse::<u64>()
        .ok()
}

/// Walk sizer whose every call waits until the paired sender is dropped.
/// Holds a run mid-phase so tests can act on it deterministically.
#[cfg(test)]
pub(crate) struct GatedSizer {
    gate: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
}

#[cfg(test)]
impl GatedSizer {
    pub(crate) fn new() -> (Self, std::sync::mpsc::Sender<()>) {
        let (open, gate) = std::sync::mpsc::channel();
        (
            Self {
                gate: std::sync::Mutex::new(gate),
            },
            open,
        )
    }
}

#[cfg(test)]
impl SizeAggregator for GatedSizer {
    fn size_of(&self, path: &Path) -> u64 {
        if let Ok(gate) = self.gate.lock() {
            let _ = gate.recv();
        }
        WalkSizer.size_of(path)
    }
}
