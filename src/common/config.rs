use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::ConfigError;
use super::safety::PathSafetyClassifier;
use crate::scanner::phases::PHASE_COUNT;
use crate::scanner::sizer::SizingStrategy;
use crate::scanner::targets::{expand_paths, ScanSources};

/// Scan trust tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Aggregate sizes and counts only, no paths
    Restricted,
    /// Individual items with paths, eligible for cleanup
    Full,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Restricted => write!(f, "restricted"),
            Tier::Full => write!(f, "full"),
        }
    }
}

/// Per-tier knobs handed to the orchestrator at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Maximum items listed per category
    pub item_cap: usize,

    /// Whether category item lists are populated
    pub expose_items: bool,

    /// Relative weights in phase order: cache, logs, downloads, trash, finalize
    pub phase_weights: Vec<u32>,

    /// How entry sizes are measured
    #[serde(default)]
    pub sizing: SizingStrategy,
}

impl TierConfig {
    pub fn restricted() -> Self {
        Self {
            item_cap: 100,
            expose_items: false,
            phase_weights: vec![35, 15, 20, 10, 20],
            sizing: SizingStrategy::NativeDu,
        }
    }

    pub fn full() -> Self {
        Self {
            item_cap: 500,
            expose_items: true,
            phase_weights: vec![30, 20, 20, 10, 20],
            sizing: SizingStrategy::Walk,
        }
    }

    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Restricted => Self::restricted(),
            Tier::Full => Self::full(),
        }
    }

    fn validate(&self, tier: Tier) -> Result<(), ConfigError> {
        if self.phase_weights.len() != PHASE_COUNT {
            return Err(ConfigError::InvalidWeights {
                tier: tier.to_string(),
                expected: PHASE_COUNT,
                found: self.phase_weights.len(),
            });
        }
        Ok(())
    }
}

/// Global spacesweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Extra path prefixes that must never be deleted
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Only flag downloads older than this many days
    #[serde(default)]
    pub stale_download_days: Option<u32>,

    /// Mirror logs into the data directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Settings for unauthenticated, aggregate-only scans
    #[serde(default = "TierConfig::restricted")]
    pub restricted: TierConfig,

    /// Settings for authenticated, path-exposing scans
    #[serde(default = "TierConfig::full")]
    pub full: TierConfig,

    /// Where each category looks
    #[serde(default)]
    pub sources: ScanSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            restricted: TierConfig::restricted(),
            full: TierConfig::full(),
            sources: ScanSources::default(),
            exclude_paths: Vec::new(),
            stale_download_days: None,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Get the spacesweep data directory (~/.spacesweep)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".spacesweep")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from the default location, or defaults if missing
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.restricted.validate(Tier::Restricted)?;
        config.full.validate(Tier::Full)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(write_err)?;
        Ok(())
    }

    pub fn tier(&self, tier: Tier) -> &TierConfig {
        match tier {
            Tier::Restricted => &self.restricted,
            Tier::Full => &self.full,
        }
    }

    /// Classifier honouring `exclude_paths`
    pub fn classifier(&self) -> PathSafetyClassifier {
        PathSafetyClassifier::new().protect(expand_paths(&self.exclude_paths))
    }
}
