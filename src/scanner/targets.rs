use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::config::Tier;

// ─── Core types ───────────────────────────────────────────────────────────────

/// Logical source of reclaimable space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cache,
    Logs,
    Downloads,
    Trash,
}

impl Category {
    /// All categories in phase order
    pub const ALL: [Category; 4] = [
        Category::Cache,
        Category::Logs,
        Category::Downloads,
        Category::Trash,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Cache => "cache",
            Category::Logs => "logs",
            Category::Downloads => "downloads",
            Category::Trash => "trash",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Cache => "User Cache",
            Category::Logs => "Logs",
            Category::Downloads => "Downloads",
            Category::Trash => "Trash",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Cache => "Application caches that are rebuilt on demand",
            Category::Logs => "Diagnostic and application log files",
            Category::Downloads => "Files sitting in the downloads folder",
            Category::Trash => "Items already moved to the trash",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// One candidate filesystem entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanItem {
    /// Absolute path of the entry
    pub path: PathBuf,

    /// Size in bytes; recursive total for directories
    pub size: u64,

    pub category: Category,

    /// Modification time, files only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Safety verdict at scan time
    pub can_delete: bool,
}

/// One logical grouping of scan results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,

    /// Sum of every counted entry's size, listed or not
    pub size: u64,

    /// Count of every counted entry; may exceed `items.len()`
    pub item_count: usize,

    /// Largest first; empty when the tier withholds paths
    pub items: Vec<ScanItem>,
}

impl ScanCategory {
    pub fn empty(category: Category) -> Self {
        Self {
            id: category.id().to_string(),
            name: category.name().to_string(),
            description: category.description().to_string(),
            category,
            size: 0,
            item_count: 0,
            items: Vec::new(),
        }
    }

    /// Items that passed the safety check at scan time
    pub fn deletable(&self) -> impl Iterator<Item = &ScanItem> {
        self.items.iter().filter(|i| i.can_delete)
    }
}

/// Result of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub tier: Tier,

    /// When the run began
    pub started_at: DateTime<Utc>,

    /// Sum of all category sizes
    pub total_space: u64,

    /// Categories in phase order
    pub categories: Vec<ScanCategory>,

    /// Sum of category item counts
    pub item_count: usize,

    /// Elapsed milliseconds
    pub scan_time: u64,

    pub free_space: u64,
    pub total_disk_space: u64,
}

impl ScanSummary {
    pub fn category(&self, category: Category) -> Option<&ScanCategory> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Every listed item across categories, in category then size order
    pub fn items(&self) -> impl Iterator<Item = &ScanItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }
}

// ─── Source definitions ───────────────────────────────────────────────────────

/// Where each category looks. Paths accept `~` and `*` globs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSources {
    pub cache: Vec<String>,
    pub logs: Vec<String>,
    pub downloads: Vec<String>,
    pub trash: Vec<String>,
}

impl Default for ScanSources {
    fn default() -> Self {
        Self {
            cache: vec!["~/Library/Caches".into(), "~/.cache".into()],
            logs: vec![
                "~/Library/Logs".into(),
                "/Library/Logs".into(),
                "~/.local/state/log".into(),
            ],
            downloads: vec!["~/Downloads".into()],
            trash: vec!["~/.Trash".into(), "~/.local/share/Trash/files".into()],
        }
    }
}

impl ScanSources {
    /// No sources at all; every category scans nothing
    pub fn empty() -> Self {
        Self {
            cache: Vec::new(),
            logs: Vec::new(),
            downloads: Vec::new(),
            trash: Vec::new(),
        }
    }

    /// Replace the sources of one category
    pub fn with<I, S>(mut self, category: Category, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.paths_mut(category) = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn paths(&self, category: Category) -> &[String] {
        match category {
            Category::Cache => &self.cache,
            Category::Logs => &self.logs,
            Category::Downloads => &self.downloads,
            Category::Trash => &self.trash,
        }
    }

    fn paths_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Cache => &mut self.cache,
            Category::Logs => &mut self.logs,
            Category::Downloads => &mut self.downloads,
            Category::Trash => &mut self.trash,
        }
    }

    /// Expanded source directories for a category
    pub fn resolve(&self, category: Category) -> Vec<PathBuf> {
        expand_paths(self.paths(category))
    }
}

/// Expand a leading `~` and glob patterns in paths
pub fn expand_paths(paths: &[String]) -> Vec<PathBuf> {
    let home = dirs::home_dir();
    let mut expanded = Vec::new();

    for path_str in paths {
        let resolved = match (path_str.strip_prefix('~'), &home) {
            (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
                format!("{}{}", home.display(), rest)
            }
            (Some(_), None) => continue,
            _ => path_str.clone(),
        };

        if resolved.contains('*') {
            if let Ok(entries) = glob::glob(&resolved) {
                expanded.extend(entries.filter_map(|e| e.ok()));
            }
        } else {
            expanded.push(PathBuf::from(resolved));
        }
    }

    expanded
}
