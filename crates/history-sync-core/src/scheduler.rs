use async_trait::async_trait;
use futures::FutureExt;
use history_sync_config::SchedulerConfig;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info};
use crate::error::SyncError;
use crate::sync::{SyncOrchestrator, SyncResult};

/// Something the driver can run once per interval
#[async_trait]
pub trait SyncJob: Send + Sync {
    async fn run_once(&self) -> SyncResult;
}

#[async_trait]
impl SyncJob for SyncOrchestrator {
    async fn run_once(&self) -> SyncResult {
        self.sync().await
    }
}

/// Source of the delay between cycles
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-delay polling loop: run a cycle, sleep `interval`, repeat.
///
/// Failures never end the loop. The job reports its own errors; a panic that
/// still escapes it is caught and logged here.
pub struct PollingDriver<J, C = TokioClock> {
    job: J,
    clock: C,
    interval: Duration,
    run_on_startup: bool,
}

impl<J: SyncJob> PollingDriver<J, TokioClock> {
    pub fn new(job: J, config: &SchedulerConfig) -> Self {
        Self {
            job,
            clock: TokioClock,
            interval: config.interval(),
            run_on_startup: config.run_on_startup,
        }
    }
}

impl<J: SyncJob, C: Clock> PollingDriver<J, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> PollingDriver<J, C2> {
        PollingDriver {
            job: self.job,
            clock,
            interval: self.interval,
            run_on_startup: self.run_on_startup,
        }
    }

    /// Run forever. Returns only if the surrounding task is cancelled.
    pub async fn run(&self) {
        info!(
            operation = "scheduler_started",
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "Service started, entering polling loop"
        );

        if !self.run_on_startup {
            self.sleep().await;
        }

        loop {
            self.tick().await;
        }
    }

    /// One cycle followed by one interval of sleep.
    /// Returns `None` when the cycle panicked past the job boundary.
    pub async fn tick(&self) -> Option<SyncResult> {
        let result = self.run_cycle().await;
        self.sleep().await;
        result
    }

    async fn run_cycle(&self) -> Option<SyncResult> {
        match AssertUnwindSafe(self.job.run_once()).catch_unwind().await {
            Ok(result) => Some(result),
            Err(panic) => {
                let err = SyncError::from_panic(panic);
                error!(
                    operation = "scheduled_sync_error",
                    kind = err.kind(),
                    error = %err,
                    "Critical loop error"
                );
                None
            }
        }
    }

    async fn sleep(&self) {
        info!(
            operation = "scheduler_sleep",
            interval_secs = self.interval.as_secs(),
            "Sleeping until next cycle"
        );
        self.clock.sleep(self.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, Scripted, ScriptedSource};
    use history_sync_models::RawHistoryRecord;
    use history_sync_sources::SourceError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records requested sleeps and yields briefly instead of waiting
    #[derive(Clone, Default)]
    struct FakeClock {
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    #[async_trait]
    impl Clock for FakeClock {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    struct PanickingJob {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl SyncJob for PanickingJob {
        async fn run_once(&self) -> SyncResult {
            self.runs.fetch_add(1, Ordering::SeqCst);
            panic!("job exploded");
        }
    }

    fn config(interval_secs: u64, run_on_startup: bool) -> SchedulerConfig {
        SchedulerConfig {
            interval_secs,
            run_on_startup,
        }
    }

    fn record(reference_id: i64) -> RawHistoryRecord {
        serde_json::from_value(json!({ "reference_id": reference_id, "date": 1700000000 })).unwrap()
    }

    #[tokio::test]
    async fn test_failed_cycle_sleeps_then_retries() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![
            Scripted::Fail(SourceError::Timeout(Duration::from_secs(10))),
            Scripted::Records(vec![record(1), record(2)]),
        ]);
        let orchestrator = SyncOrchestrator::new(Box::new(source), Box::new(store.clone()));
        let clock = FakeClock::default();
        let driver = PollingDriver::new(orchestrator, &config(3600, true)).with_clock(clock.clone());

        let first = driver.tick().await.unwrap();
        assert!(matches!(first.error, Some(SyncError::Fetch(_))));
        assert!(store.row_ids().is_empty());

        let second = driver.tick().await.unwrap();
        assert!(second.is_success());
        assert_eq!(second.inserted, 2);

        assert_eq!(
            *clock.sleeps.lock().unwrap(),
            vec![Duration::from_secs(3600), Duration::from_secs(3600)]
        );
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_driver() {
        let clock = FakeClock::default();
        let job = PanickingJob {
            runs: AtomicUsize::new(0),
        };
        let driver = PollingDriver::new(job, &config(60, true)).with_clock(clock.clone());

        assert!(driver.tick().await.is_none());
        assert!(driver.tick().await.is_none());

        assert_eq!(driver.job.runs.load(Ordering::SeqCst), 2);
        assert_eq!(clock.sleeps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_keeps_cycling() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![
            Scripted::Fail(SourceError::Status { status: 503 }),
            Scripted::Records(vec![record(5)]),
        ]);
        let orchestrator = SyncOrchestrator::new(Box::new(source), Box::new(store.clone()));
        let clock = FakeClock::default();
        let driver = PollingDriver::new(orchestrator, &config(3600, true)).with_clock(clock.clone());

        let outcome = tokio::time::timeout(Duration::from_millis(200), driver.run()).await;

        assert!(outcome.is_err(), "run() should never return on its own");
        assert!(clock.sleeps.lock().unwrap().len() >= 3);
        assert_eq!(store.row_ids(), vec![5]);
    }

    #[tokio::test]
    async fn test_delayed_start_sleeps_first() {
        let store = MemoryStore::default();
        let source = ScriptedSource::new(vec![]);
        let orchestrator = SyncOrchestrator::new(Box::new(source), Box::new(store.clone()));
        let clock = FakeClock::default();
        let driver = PollingDriver::new(orchestrator, &config(30, false)).with_clock(clock.clone());

        let _ = tokio::time::timeout(Duration::from_millis(50), driver.run()).await;

        let sleeps = clock.sleeps.lock().unwrap();
        assert!(!sleeps.is_empty());
        assert_eq!(sleeps[0], Duration::from_secs(30));
    }
}
