//! Hot-reload watcher
//!
//! Each [`check`](HotReloadWatcher::check) is gated by a "next check due"
//! instant from an injected [`Clock`]. A due check scans the plugin root for
//! staged builds of loaded plugins and reloads each one. The host drives
//! `check` from its own timer, or via [`spawn`](HotReloadWatcher::spawn).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::clock::Clock;
use super::lifecycle::PluginManager;
use super::settings::{MAX_RELOAD_SECONDS, ReloadSettings};

/// Host hook that persists mutable state before plugins are swapped
pub trait StateCheckpoint: Send + Sync {
    fn checkpoint(&self) -> Result<(), String>;
}

/// Watcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Waiting for the next check to come due
    Idle,
    /// A scan is in progress
    Checking,
}

/// Outcome of one scan
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReloadReport {
    /// Plugins reloaded successfully
    pub reloaded: Vec<String>,
    /// Plugins whose reload failed, with the error message
    pub failed: Vec<(String, String)>,
    /// Whether a checkpoint was taken during this pass
    pub checkpointed: bool,
}

#[derive(Debug)]
struct Schedule {
    state: WatcherState,
    next_check_due: Option<Instant>,
}

/// Detects staged plugin builds and reloads them
pub struct HotReloadWatcher {
    manager: Arc<PluginManager>,
    clock: Arc<dyn Clock>,
    checkpoint: Option<Arc<dyn StateCheckpoint>>,
    schedule: Mutex<Schedule>,
}

impl HotReloadWatcher {
    /// Create a watcher; the first check is due immediately
    pub fn new(manager: Arc<PluginManager>, clock: Arc<dyn Clock>) -> Self {
        Self {
            manager,
            clock,
            checkpoint: None,
            schedule: Mutex::new(Schedule {
                state: WatcherState::Idle,
                next_check_due: None,
            }),
        }
    }

    /// Attach a checkpoint hook
    pub fn with_checkpoint(mut self, checkpoint: Arc<dyn StateCheckpoint>) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn state(&self) -> WatcherState {
        self.lock_schedule().state
    }

    /// Instant before which [`check`](Self::check) is a no-op
    pub fn next_check_due(&self) -> Option<Instant> {
        self.lock_schedule().next_check_due
    }

    /// Scan for staged builds if reloading is enabled and a check is due.
    ///
    /// Returns `None` when nothing ran.
    pub fn check(&self) -> Option<ReloadReport> {
        let settings = self.manager.reload_settings();
        if !settings.enabled {
            return None;
        }

        {
            let now = self.clock.now();
            let mut schedule = self.lock_schedule();
            if schedule.state == WatcherState::Checking
                || schedule.next_check_due.is_some_and(|due| now < due)
            {
                return None;
            }
            schedule.state = WatcherState::Checking;
        }

        let _checking = CheckingGuard { watcher: self };
        let report = self.scan(&settings);

        let now = self.clock.now();
        self.lock_schedule().next_check_due = Some(deadline(now, settings.interval));

        Some(report)
    }

    fn scan(&self, settings: &ReloadSettings) -> ReloadReport {
        let mut report = ReloadReport::default();
        let layout = self.manager.layout();

        let names = match layout.discover() {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(dir = %layout.root().display(), error = %e, "Failed to scan plugin directory");
                return report;
            }
        };

        // At most one checkpoint per pass, however many plugins reload
        let mut checkpoint_pending = settings.checkpoint_before_reload;

        for name in names {
            if !layout.has_staged(&name) || !self.manager.is_loaded(&name) {
                continue;
            }

            if checkpoint_pending {
                checkpoint_pending = false;
                report.checkpointed = self.take_checkpoint();
            }

            match self.manager.reload(&name) {
                Ok(_) => {
                    tracing::info!(plugin = %name, "Reloaded plugin - {}", name);
                    report.reloaded.push(name);
                }
                Err(e) => {
                    tracing::warn!(plugin = %name, error = %e, "{}", e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        report
    }

    fn take_checkpoint(&self) -> bool {
        let Some(checkpoint) = &self.checkpoint else {
            return false;
        };

        tracing::info!("Saving state before reloading plugins ...");
        match checkpoint.checkpoint() {
            Ok(()) => {
                tracing::info!("State saved.");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "State checkpoint failed, reloading anyway");
                false
            }
        }
    }

    /// Drive [`check`](Self::check) every `tick` until `shutdown` fires.
    ///
    /// Checks run one at a time on the blocking pool, since module
    /// init/shutdown entry points may block.
    pub fn spawn(self: Arc<Self>, tick: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let watcher = Arc::clone(&self);
                        if let Err(e) = tokio::task::spawn_blocking(move || watcher.check()).await {
                            tracing::error!(error = %e, "Plugin reload check panicked");
                        }
                    }
                }
            }

            tracing::debug!("Plugin reload watcher stopped");
        })
    }

    fn lock_schedule(&self) -> MutexGuard<'_, Schedule> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the watcher to `Idle` when a scan ends, including by unwinding
struct CheckingGuard<'a> {
    watcher: &'a HotReloadWatcher,
}

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.watcher.lock_schedule().state = WatcherState::Idle;
    }
}

/// `now + interval`, capped so an oversized interval cannot overflow `Instant`
fn deadline(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .or_else(|| now.checked_add(Duration::from_secs(MAX_RELOAD_SECONDS)))
        .unwrap_or(now)
}
