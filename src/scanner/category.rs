use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, trace, warn};

use super::sizer::{has_files, SizeAggregator};
use super::targets::{Category, ScanCategory, ScanItem};
use crate::common::safety::PathSafetyClassifier;

/// Scans the source directories of one category.
///
/// Only the immediate entries of each source are considered; every entry
/// is sized as a unit through the [`SizeAggregator`].
pub struct CategoryScanner<'a> {
    classifier: &'a PathSafetyClassifier,
    sizer: &'a dyn SizeAggregator,
    min_age: Option<Duration>,
}

impl<'a> CategoryScanner<'a> {
    pub fn new(classifier: &'a PathSafetyClassifier, sizer: &'a dyn SizeAggregator) -> Self {
        Self {
            classifier,
            sizer,
            min_age: None,
        }
    }

    /// Ignore entries modified more recently than `min_age`
    pub fn with_min_age(mut self, min_age: Option<Duration>) -> Self {
        self.min_age = min_age;
        self
    }

    /// Scan `sources` into a category.
    ///
    /// Once `item_cap` items are listed, later entries still count toward
    /// `size` and `item_count`. With `expose_items` off the item list stays
    /// empty and empty directories are left out of the totals.
    pub fn scan(
        &self,
        sources: &[PathBuf],
        category: Category,
        item_cap: usize,
        expose_items: bool,
    ) -> ScanCategory {
        let mut result = ScanCategory::empty(category);

        for source in sources {
            let Some(entries) = list_entries(source) else {
                continue;
            };

            for entry in entries {
                let metadata = match std::fs::symlink_metadata(&entry) {
                    Ok(m) => m,
                    Err(e) => {
                        debug!(path = %entry.display(), error = %e, "entry vanished during scan");
                        continue;
                    }
                };

                if !self.old_enough(&metadata) {
                    trace!(path = %entry.display(), "entry too recent");
                    continue;
                }

                if !expose_items && metadata.is_dir() && !has_files(&entry) {
                    trace!(path = %entry.display(), "skipping empty directory");
                    continue;
                }

                let size = self.sizer.size_of(&entry);

                result.size += size;
                result.item_count += 1;

                if expose_items && result.items.len() < item_cap {
                    let last_modified = if metadata.is_file() {
                        metadata.modified().ok().map(DateTime::<Utc>::from)
                    } else {
                        None
                    };
                    let can_delete = self.classifier.is_safe(&entry);
                    result.items.push(ScanItem {
                        path: entry,
                        size,
                        category,
                        last_modified,
                        can_delete,
                    });
                }
            }
        }

        result
            .items
            .sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));

        debug!(
            category = category.id(),
            size = result.size,
            count = result.item_count,
            listed = result.items.len(),
            "category scanned"
        );
        result
    }

    fn old_enough(&self, metadata: &Metadata) -> bool {
        let Some(min_age) = self.min_age else {
            return true;
        };
        // Unknown mtime counts as stale
        metadata
            .modified()
            .ok()
            .and_then(|m| SystemTime::now().duration_since(m).ok())
            .map_or(true, |age| age >= min_age)
    }
}

/// Immediate entries of a source directory, sorted by name.
/// `None` when the source is missing or unreadable.
fn list_entries(source: &Path) -> Option<Vec<PathBuf>> {
    match std::fs::read_dir(source) {
        Ok(read_dir) => {
            let mut entries: Vec<PathBuf> = read_dir
                .filter_map(|e| match e {
                    Ok(e) => Some(e.path()),
                    Err(err) => {
                        debug!(source = %source.display(), error = %err, "unreadable entry");
                        None
                    }
                })
                .collect();
            entries.sort();
            Some(entries)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(source = %source.display(), "source missing, skipping");
            None
        }
        Err(e) => {
            warn!(source = %source.display(), error = %e, "source inaccessible, skipping");
            None
        }
    }
}
