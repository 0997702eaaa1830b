//! Entry points for a presentation layer.
//!
//! [`Engine`] bundles one orchestrator per tier with a cleanup executor
//! and the system probe, all configured from a single [`Config`].

use std::sync::Arc;

use crate::cleaner::{CleanupExecutor, CleanupResult};
use crate::common::config::{Config, Tier};
use crate::common::errors::{ConfigError, ScanError};
use crate::common::system::{SystemInfo, SystemInfoProbe};
use crate::scanner::targets::{Category, ScanItem, ScanSummary};
use crate::scanner::{self, ScanHandle, ScanOptions, ScanOrchestrator, ScanProgress};

pub struct Engine {
    config: Config,
    restricted: Arc<ScanOrchestrator>,
    full: Arc<ScanOrchestrator>,
    executor: CleanupExecutor,
    probe: SystemInfoProbe,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            restricted: Arc::new(ScanOrchestrator::from_config(Tier::Restricted, &config)),
            full: Arc::new(ScanOrchestrator::from_config(Tier::Full, &config)),
            executor: CleanupExecutor::new(config.classifier()),
            probe: SystemInfoProbe,
            config,
        }
    }

    /// Engine with prebuilt orchestrators
    #[cfg(test)]
    pub(crate) fn with_orchestrators(
        config: Config,
        restricted: ScanOrchestrator,
        full: ScanOrchestrator,
    ) -> Self {
        Self {
            restricted: Arc::new(restricted),
            full: Arc::new(full),
            ..Self::new(config)
        }
    }

    /// Engine backed by the on-disk configuration
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::new(Config::load()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self, tier: Tier) -> &Arc<ScanOrchestrator> {
        match tier {
            Tier::Restricted => &self.restricted,
            Tier::Full => &self.full,
        }
    }

    fn options(&self, categories: Option<Vec<Category>>) -> ScanOptions {
        ScanOptions {
            categories,
            ..ScanOptions::from_config(&self.config)
        }
    }

    /// Scan on the calling thread
    pub fn start_scan<F>(
        &self,
        tier: Tier,
        categories: Option<Vec<Category>>,
        on_progress: F,
    ) -> Result<ScanSummary, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        self.orchestrator(tier)
            .start_with(&self.options(categories), on_progress)
    }

    /// Scan on a worker thread. Fails with `AlreadyRunning` if this
    /// tier is mid-run.
    pub fn spawn_scan(
        &self,
        tier: Tier,
        categories: Option<Vec<Category>>,
    ) -> Result<ScanHandle, ScanError> {
        scanner::spawn_scan(Arc::clone(self.orchestrator(tier)), self.options(categories))
    }

    /// Ask any in-flight scan to stop at its next phase boundary
    pub fn cancel_scan(&self) {
        self.restricted.cancel();
        self.full.cancel();
    }

    pub fn clean_items(&self, items: &[ScanItem], dry_run: bool) -> CleanupResult {
        self.executor.clean(items, dry_run)
    }

    pub fn system_info(&self) -> SystemInfo {
        self.probe.system_info()
    }
}
