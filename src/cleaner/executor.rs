use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::common::errors::FailureReason;
use crate::common::safety::PathSafetyClassifier;
use crate::scanner::targets::ScanItem;

/// A failed item and why it failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupError {
    pub item: ScanItem,
    pub reason: FailureReason,
}

/// Outcome of one cleanup call.
///
/// Every input item lands in exactly one of `cleaned` or `failed`, and
/// every failed item has a matching entry in `errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub dry_run: bool,
    pub cleaned: Vec<ScanItem>,
    pub failed: Vec<ScanItem>,
    pub total_size_freed: u64,
    pub errors: Vec<CleanupError>,
    /// True only when nothing failed
    pub success: bool,
}

impl CleanupResult {
    fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            cleaned: Vec::new(),
            failed: Vec::new(),
            total_size_freed: 0,
            errors: Vec::new(),
            success: true,
        }
    }

    fn record_cleaned(&mut self, item: &ScanItem) {
        // Sizes may come from outside the engine
        self.total_size_freed = self.total_size_freed.saturating_add(item.size);
        self.cleaned.push(item.clone());
    }

    fn record_failed(&mut self, item: &ScanItem, reason: FailureReason) {
        self.failed.push(item.clone());
        self.errors.push(CleanupError {
            item: item.clone(),
            reason,
        });
        self.success = false;
    }

    /// Number of items handed in
    pub fn attempted(&self) -> usize {
        self.cleaned.len() + self.failed.len()
    }
}

/// Deletes (or simulates deleting) scan items one by one.
///
/// Items are never trusted: the stored `can_delete` flag and a fresh
/// classifier verdict must both allow deletion. A dry run goes through
/// the same checks and stops short of touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct CleanupExecutor {
    classifier: PathSafetyClassifier,
}

impl CleanupExecutor {
    pub fn new(classifier: PathSafetyClassifier) -> Self {
        Self { classifier }
    }

    /// Process items in the order given. Individual failures are
    /// recorded and the batch carries on.
    pub fn clean(&self, items: &[ScanItem], dry_run: bool) -> CleanupResult {
        let mut result = CleanupResult::new(dry_run);

        for item in items {
            match self.clean_item(item, dry_run) {
                Ok(()) => {
                    debug!(path = %item.path.display(), dry_run, "cleaned");
                    result.record_cleaned(item);
                }
                Err(reason) => {
                    warn!(path = %item.path.display(), %reason, "cleanup failed");
                    result.record_failed(item, reason);
                }
            }
        }

        info!(
            dry_run,
            cleaned = result.cleaned.len(),
            failed = result.failed.len(),
            freed = result.total_size_freed,
            "cleanup finished"
        );
        result
    }

    fn clean_item(&self, item: &ScanItem, dry_run: bool) -> Result<(), FailureReason> {
        if !item.can_delete {
            return Err(FailureReason::ProtectedPath);
        }

        // The item may come from an old scan; judge the path again
        if !self.classifier.is_safe(&item.path) {
            return Err(FailureReason::ProtectedPath);
        }

        if dry_run {
            return Ok(());
        }

        remove_path(&item.path).map_err(|e| FailureReason::Io(e.to_string()))
    }
}

/// Delete a file, symlink or whole directory. Symlinks are removed
/// themselves, never their targets.
fn remove_path(path: &Path) -> std::io::Result<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
