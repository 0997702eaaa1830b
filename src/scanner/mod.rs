pub mod cancel;
pub mod category;
pub mod phases;
pub mod sizer;
pub mod targets;

use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::common::config::{Config, Tier, TierConfig};
use crate::common::errors::ScanError;
use crate::common::safety::PathSafetyClassifier;
use crate::common::system::SystemInfoProbe;
use cancel::CancelToken;
use category::CategoryScanner;
use phases::{Phase, PhasePlan};
use sizer::SizeAggregator;
use targets::{Category, ScanCategory, ScanSources, ScanSummary};

/// Lifecycle of an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running { phase: usize },
    Completed,
    Cancelled,
}

/// Emitted after every phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// Cumulative, never decreasing, 100 only after the last phase
    pub percentage: u8,
    pub phase: Phase,
    pub label: String,
    /// Entries counted so far across finished phases
    pub items_scanned: usize,
}

/// Per-run choices
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Restrict the run to these categories; all when `None`
    pub categories: Option<Vec<Category>>,

    /// Only count downloads at least this many days old
    pub stale_download_days: Option<u32>,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            categories: None,
            stale_download_days: config.stale_download_days,
        }
    }

    fn categories(&self) -> &[Category] {
        self.categories.as_deref().unwrap_or(&Category::ALL)
    }
}

/// Runs the category phases in order and assembles a [`ScanSummary`].
///
/// One orchestrator serves one tier. It can be shared across threads;
/// `cancel` may be called from anywhere while `start` runs elsewhere.
pub struct ScanOrchestrator {
    tier: Tier,
    config: TierConfig,
    sources: ScanSources,
    classifier: PathSafetyClassifier,
    sizer: Box<dyn SizeAggregator>,
    probe: SystemInfoProbe,
    cancel: CancelToken,
    state: Mutex<ScanState>,
}

impl ScanOrchestrator {
    pub fn new(tier: Tier, config: TierConfig, sources: ScanSources) -> Self {
        let sizer = config.sizing.aggregator();
        Self {
            tier,
            config,
            sources,
            classifier: PathSafetyClassifier::new(),
            sizer,
            probe: SystemInfoProbe,
            cancel: CancelToken::new(),
            state: Mutex::new(ScanState::Idle),
        }
    }

    /// Orchestrator for a tier using the loaded configuration
    pub fn from_config(tier: Tier, config: &Config) -> Self {
        Self::new(tier, config.tier(tier).clone(), config.sources.clone())
            .with_classifier(config.classifier())
    }

    /// Aggregate-only orchestrator with default settings
    pub fn restricted(sources: ScanSources) -> Self {
        Self::new(Tier::Restricted, TierConfig::restricted(), sources)
    }

    /// Path-exposing orchestrator with default settings
    pub fn full(sources: ScanSources) -> Self {
        Self::new(Tier::Full, TierConfig::full(), sources)
    }

    pub fn with_classifier(mut self, classifier: PathSafetyClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_sizer(mut self, sizer: Box<dyn SizeAggregator>) -> Self {
        self.sizer = sizer;
        self
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn state(&self) -> ScanState {
        *lock(&self.state)
    }

    /// Token that cancels this orchestrator's runs
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run every category with default options
    pub fn start<F>(&self, on_progress: F) -> Result<ScanSummary, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        self.start_with(&ScanOptions::default(), on_progress)
    }

    /// Run a scan. Progress is reported synchronously after each phase;
    /// keep the callback short.
    ///
    /// A cancel request issued before this call is discarded. To cancel
    /// from another thread without racing the start, use [`spawn_scan`].
    pub fn start_with<F>(&self, options: &ScanOptions, on_progress: F) -> Result<ScanSummary, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        self.claim()?;
        self.run(options, on_progress)
    }

    /// Mark the orchestrator running and clear any earlier cancel request.
    /// Every successful claim must be followed by `run` or `release`.
    fn claim(&self) -> Result<(), ScanError> {
        let mut state = lock(&self.state);
        if matches!(*state, ScanState::Running { .. }) {
            return Err(ScanError::AlreadyRunning);
        }
        *state = ScanState::Running { phase: 0 };
        self.cancel.reset();
        Ok(())
    }

    /// Undo a claim whose run never started
    fn release(&self) {
        *lock(&self.state) = ScanState::Idle;
    }

    /// Body of a claimed run. Cancellation requests made since the claim
    /// are honoured at the first phase boundary.
    fn run<F>(&self, options: &ScanOptions, mut on_progress: F) -> Result<ScanSummary, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        let _guard = RunGuard { state: &self.state };

        let started = Instant::now();
        let started_at = Utc::now();
        let plan = PhasePlan::new(options.categories(), &self.config.phase_weights);
        info!(tier = %self.tier, phases = plan.scans().len() + 1, "scan started");

        let mut categories: Vec<ScanCategory> = Vec::with_capacity(plan.scans().len());
        let mut items_scanned = 0usize;
        let mut percentage = 0u8;

        for (index, &(category, weight)) in plan.scans().iter().enumerate() {
            self.enter_phase(index)?;

            let result = self.scan_category(category, options);
            items_scanned += result.item_count;
            categories.push(result);

            percentage = percentage.saturating_add(weight).min(100);
            let phase = Phase::Scan(category);
            on_progress(&ScanProgress {
                percentage,
                phase,
                label: phase.label(),
                items_scanned,
            });
        }

        self.enter_phase(plan.scans().len())?;
        let total_space = categories.iter().map(|c| c.size).sum();
        let item_count = categories.iter().map(|c| c.item_count).sum();
        let disk = self
            .probe
            .disk_space(&dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")));

        let summary = ScanSummary {
            tier: self.tier,
            started_at,
            total_space,
            categories,
            item_count,
            scan_time: started.elapsed().as_millis() as u64,
            free_space: disk.free,
            total_disk_space: disk.total,
        };

        percentage = percentage.saturating_add(plan.finalize_weight()).min(100);
        on_progress(&ScanProgress {
            percentage,
            phase: Phase::Finalize,
            label: Phase::Finalize.label(),
            items_scanned,
        });

        *lock(&self.state) = ScanState::Completed;
        info!(
            tier = %self.tier,
            total_space = summary.total_space,
            items = summary.item_count,
            elapsed_ms = summary.scan_time,
            "scan completed"
        );
        Ok(summary)
    }

    /// Check for cancellation at a phase boundary, then mark the phase running
    fn enter_phase(&self, index: usize) -> Result<(), ScanError> {
        let mut state = lock(&self.state);
        if self.cancel.is_cancelled() {
            *state = ScanState::Cancelled;
            info!(tier = %self.tier, completed_phases = index, "scan cancelled");
            return Err(ScanError::Cancelled {
                completed_phases: index,
            });
        }
        *state = ScanState::Running { phase: index };
        debug!(phase = index, "phase started");
        Ok(())
    }

    fn scan_category(&self, category: Category, options: &ScanOptions) -> ScanCategory {
        let min_age = match category {
            Category::Downloads => options
                .stale_download_days
                .map(|days| Duration::from_secs(u64::from(days) * 86_400)),
            Category::Cache | Category::Logs | Category::Trash => None,
        };

        CategoryScanner::new(&self.classifier, self.sizer.as_ref())
            .with_min_age(min_age)
            .scan(
                &self.sources.resolve(category),
                category,
                self.config.item_cap,
                self.config.expose_items,
            )
    }
}

fn lock(state: &Mutex<ScanState>) -> MutexGuard<'_, ScanState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the orchestrator to `Idle` if a run unwinds mid-phase
struct RunGuard<'a> {
    state: &'a Mutex<ScanState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if matches!(*state, ScanState::Running { .. }) {
            *state = ScanState::Idle;
        }
    }
}

/// A scan running on a worker thread
pub struct ScanHandle {
    progress: mpsc::Receiver<ScanProgress>,
    token: CancelToken,
    worker: JoinHandle<Result<ScanSummary, ScanError>>,
}

impl ScanHandle {
    /// Progress events; the channel closes when the scan ends
    pub fn progress(&self) -> &mpsc::Receiver<ScanProgress> {
        &self.progress
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the outcome
    pub fn join(self) -> Result<ScanSummary, ScanError> {
        self.worker
            .join()
            .unwrap_or_else(|_| Err(ScanError::Worker("scan thread panicked".to_string())))
    }
}

/// Dispatch a scan onto its own thread so the caller stays responsive.
///
/// The run is claimed before this returns, so a cancel issued through
/// the handle or the orchestrator at any later point ends it as
/// cancelled.
pub fn spawn_scan(orchestrator: Arc<ScanOrchestrator>, options: ScanOptions) -> Result<ScanHandle, ScanError> {
    orchestrator.claim()?;

    let (tx, rx) = mpsc::channel();
    let token = orchestrator.cancel_token();
    let worker_orchestrator = Arc::clone(&orchestrator);
    let spawned = std::thread::Builder::new()
        .name("spacesweep-scan".to_string())
        .spawn(move || {
            worker_orchestrator.run(&options, |progress| {
                // Receiver may be gone; the scan still finishes
                let _ = tx.send(progress.clone());
            })
        });

    match spawned {
        Ok(worker) => Ok(ScanHandle {
            progress: rx,
            token,
            worker,
        }),
        Err(e) => {
            orchestrator.release();
            Err(ScanError::Worker(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::sizer::{GatedSizer, WalkSizer};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ScanSources) {
        let tmp = TempDir::new().unwrap();
        for (dir, file, len) in [
            ("cache", "app.cache", 300usize),
            ("logs", "app.log", 200),
            ("downloads", "setup.dmg", 100),
            ("trash", "old.txt", 50),
        ] {
            let d = tmp.path().join(dir);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join(file), vec![0u8; len]).unwrap();
        }
        let root = tmp.path().to_path_buf();
        let sources = Category::ALL.into_iter().fold(ScanSources::empty(), |s, c| {
            s.with(c, [root.join(c.id()).display().to_string()])
        });
        (tmp, sources)
    }

    fn orchestrator(tier: Tier, sources: ScanSources) -> ScanOrchestrator {
        ScanOrchestrator::new(tier, TierConfig::for_tier(tier), sources)
            .with_sizer(Box::new(WalkSizer))
            .with_classifier(PathSafetyClassifier::with_home("/nonexistent-home"))
    }

    #[test]
    fn test_full_scan_totals() {
        let (_tmp, sources) = fixture();
        let orch = orchestrator(Tier::Full, sources);
        let summary = orch.start(|_| {}).unwrap();

        assert_eq!(summary.categories.len(), 4);
        assert_eq!(summary.total_space, 650);
        assert_eq!(summary.item_count, 4);
        let order: Vec<Category> = summary.categories.iter().map(|c| c.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(orch.state(), ScanState::Completed);
    }

    #[test]
    fn test_restricted_hides_items() {
        let (_tmp, sources) = fixture();
        let summary = orchestrator(Tier::Restricted, sources).start(|_| {}).unwrap();
        assert_eq!(summary.total_space, 650);
        assert!(summary.categories.iter().all(|c| c.items.is_empty()));
        assert_eq!(summary.item_count, 4);
    }

    #[test]
    fn test_progress_monotonic_and_ends_at_100() {
        let (_tmp, sources) = fixture();
        let mut events = Vec::new();
        orchestrator(Tier::Full, sources)
            .start(|p| events.push(p.clone()))
            .unwrap();

        assert_eq!(events.len(), 5);
        assert!(events.windows(2).all(|w| w[0].percentage <= w[1].percentage));
        assert_eq!(events.last().unwrap().percentage, 100);
        assert_eq!(events.last().unwrap().phase, Phase::Finalize);
        assert_eq!(events[0].items_scanned, 1);
        assert_eq!(events[3].items_scanned, 4);
    }

    #[test]
    fn test_cancel_during_first_phase() {
        let (_tmp, sources) = fixture();
        let orch = orchestrator(Tier::Full, sources);
        let token = orch.cancel_token();
        let mut seen = Vec::new();

        let result = orch.start(|p| {
            seen.push(p.phase);
            token.cancel();
        });

        match result {
            Err(ScanError::Cancelled { completed_phases }) => assert_eq!(completed_phases, 1),
            other => panic!("expected cancellation, got {:?}", other.map(|s| s.item_count)),
        }
        assert_eq!(seen, vec![Phase::Scan(Category::Cache)]);
        assert_eq!(orch.state(), ScanState::Cancelled);
    }

    #[test]
    fn test_cancel_before_finalize() {
        let (_tmp, sources) = fixture();
        let orch = orchestrator(Tier::Full, sources);
        let token = orch.cancel_token();
        let result = orch.start(|p| {
            if p.phase == Phase::Scan(Category::Trash) {
                token.cancel();
            }
        });
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_restart_after_cancel() {
        let (_tmp, sources) = fixture();
        let orch = orchestrator(Tier::Full, sources);
        let token = orch.cancel_token();
        assert!(orch.start(|_| token.cancel()).is_err());

        // Flag is reset on start
        let summary = orch.start(|_| {}).unwrap();
        assert_eq!(summary.total_space, 650);
    }

    #[test]
    fn test_category_subset() {
        let (_tmp, sources) = fixture();
        let options = ScanOptions {
            categories: Some(vec![Category::Trash, Category::Logs]),
            stale_download_days: None,
        };
        let mut last = 0;
        let summary = orchestrator(Tier::Full, sources)
            .start_with(&options, |p| last = p.percentage)
            .unwrap();

        let order: Vec<Category> = summary.categories.iter().map(|c| c.category).collect();
        assert_eq!(order, vec![Category::Logs, Category::Trash]);
        assert_eq!(summary.total_space, 250);
        assert_eq!(last, 100);
    }

    #[test]
    fn test_stale_download_filter() {
        let (_tmp, sources) = fixture();
        let options = ScanOptions {
            categories: Some(vec![Category::Downloads]),
            stale_download_days: Some(30),
        };
        let summary = orchestrator(Tier::Full, sources)
            .start_with(&options, |_| {})
            .unwrap();
        assert_eq!(summary.item_count, 0);
    }

    #[test]
    fn test_spawned_scan_streams_progress() {
        let (_tmp, sources) = fixture();
        let handle = spawn_scan(Arc::new(orchestrator(Tier::Full, sources)), ScanOptions::default()).unwrap();
        let events: Vec<ScanProgress> = handle.progress().iter().collect();
        let summary = handle.join().unwrap();

        assert_eq!(events.last().unwrap().percentage, 100);
        assert_eq!(summary.total_space, 650);
    }

    fn gated(tier: Tier, sources: ScanSources) -> (Arc<ScanOrchestrator>, mpsc::Sender<()>) {
        let (sizer, open) = GatedSizer::new();
        (Arc::new(orchestrator(tier, sources).with_sizer(Box::new(sizer))), open)
    }

    #[test]
    fn test_cancel_right_after_spawn() {
        let (_tmp, sources) = fixture();
        for _ in 0..20 {
            let (orch, open) = gated(Tier::Full, sources.clone());
            let handle = spawn_scan(Arc::clone(&orch), ScanOptions::default()).unwrap();
            handle.cancel();
            drop(open);

            match handle.join() {
                Err(ScanError::Cancelled { completed_phases }) => assert!(completed_phases <= 1),
                other => panic!("expected cancellation, got {:?}", other.map(|s| s.item_count)),
            }
            assert_eq!(orch.state(), ScanState::Cancelled);
        }
    }

    #[test]
    fn test_orchestrator_cancel_after_spawn() {
        let (_tmp, sources) = fixture();
        let (orch, open) = gated(Tier::Restricted, sources);
        let handle = spawn_scan(Arc::clone(&orch), ScanOptions::default()).unwrap();
        orch.cancel();
        drop(open);
        assert!(handle.join().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_spawn_claims_before_returning() {
        let (_tmp, sources) = fixture();
        let (orch, open) = gated(Tier::Full, sources);
        let handle = spawn_scan(Arc::clone(&orch), ScanOptions::default()).unwrap();

        // Held at the first sizing call, so the run is still in flight
        assert!(matches!(orch.state(), ScanState::Running { .. }));
        assert!(matches!(
            orch.start(|_| {}),
            Err(ScanError::AlreadyRunning)
        ));
        drop(open);
        assert_eq!(handle.join().unwrap().total_space, 650);

        // The next run starts with a clear flag
        let summary = spawn_scan(orch, ScanOptions::default()).unwrap().join().unwrap();
        assert_eq!(summary.total_space, 650);
    }

    #[test]
    fn test_restricted_defaults_skip_empty_dirs() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("one.bin"), b"x").unwrap();
        std::fs::create_dir_all(tmp.path().join("scaffold/inner")).unwrap();
        let sources = ScanSources::empty().with(Category::Cache, [tmp.path().display().to_string()]);

        let summary = ScanOrchestrator::restricted(sources)
            .with_classifier(PathSafetyClassifier::with_home("/nonexistent-home"))
            .start(|_| {})
            .unwrap();

        let cache = summary.category(Category::Cache).unwrap();
        assert_eq!(cache.item_count, 1);
        assert_eq!(cache.size, 1);
        assert_eq!(summary.total_space, 1);
    }

    #[test]
    fn test_empty_sources() {
        let summary = orchestrator(Tier::Full, ScanSources::empty())
            .start(|_| {})
            .unwrap();
        assert_eq!(summary.total_space, 0);
        assert_eq!(summary.item_count, 0);
        assert!(summary.categories.iter().all(|c| c.items.is_empty()));
    }
}
