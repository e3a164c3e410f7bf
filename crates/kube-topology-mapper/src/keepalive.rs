//! Periodic refresh of every live key.
//!
//! Downstream, a record expires after its keepalive seconds. The scheduler
//! re-submits every cached key as an upsert once per interval, so live
//! entities and links never expire even when the cluster is quiet.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::TopologyCache;
use crate::config::TopologyConfig;
use crate::dispatcher::{Job, JobRouter};
use crate::{Result, TopologyError};

/// Lifecycle of a [`KeepaliveScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveState {
    /// Created, not yet started.
    Idle,
    /// Ticking.
    Running,
    /// Shut down. Terminal.
    Stopped,
}

impl KeepaliveState {
    /// Lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Keys in the snapshot.
    pub keys: usize,
    /// Refresh jobs accepted by the router.
    pub submitted: usize,
    /// Refresh jobs the router refused.
    pub failed: usize,
}

/// Re-submits every cached key on a fixed period.
pub struct KeepaliveScheduler {
    cache: Arc<TopologyCache>,
    router: Arc<dyn JobRouter>,
    period: Duration,
    state: Mutex<KeepaliveState>,
}

impl KeepaliveScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new(cache: Arc<TopologyCache>, router: Arc<dyn JobRouter>, period: Duration) -> Self {
        Self {
            cache,
            router,
            period,
            state: Mutex::new(KeepaliveState::Idle),
        }
    }

    /// Create an idle scheduler ticking once per configured interval.
    #[must_use]
    pub fn from_config(
        config: &TopologyConfig,
        cache: Arc<TopologyCache>,
        router: Arc<dyn JobRouter>,
    ) -> Self {
        Self::new(cache, router, config.interval())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> KeepaliveState {
        *self.state.lock()
    }

    /// Tick period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Move from idle to running.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidState` unless the scheduler is idle.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != KeepaliveState::Idle {
            return Err(TopologyError::InvalidState(state.as_str()));
        }
        *state = KeepaliveState::Running;
        Ok(())
    }

    /// Stop for good. No tick runs after this returns.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state != KeepaliveState::Stopped {
            *state = KeepaliveState::Stopped;
            info!("Keepalive scheduler stopped");
        }
    }

    /// Submit a refresh for every key currently cached.
    ///
    /// A refused submission is logged and counted; the tick continues with
    /// the remaining keys. If the router is shutting down, the scheduler
    /// stops and the tick ends early.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidState` unless the scheduler is running.
    pub async fn tick(&self) -> Result<TickReport> {
        let state = self.state();
        if state != KeepaliveState::Running {
            return Err(TopologyError::InvalidState(state.as_str()));
        }

        let keys = self.cache.keys();
        let mut report = TickReport {
            keys: keys.len(),
            ..TickReport::default()
        };
        for key in keys {
            match self.router.submit(Job::Refresh(key.clone())).await {
                Ok(()) => report.submitted += 1,
                Err(TopologyError::ShuttingDown) => {
                    report.failed += 1;
                    self.stop();
                    break;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(key = %key, error = %e, "Failed to submit keepalive refresh");
                }
            }
        }
        debug!(
            keys = report.keys,
            submitted = report.submitted,
            failed = report.failed,
            "Keepalive tick"
        );
        Ok(report)
    }

    /// Start and tick once per period until `token` is cancelled.
    ///
    /// The first tick fires one period after start.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidState` if the scheduler was not idle.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        self.start()?;
        info!(period_secs = self.period.as_secs(), "Keepalive scheduler started");

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    if self.tick().await.is_err() {
                        break;
                    }
                }
            }
        }

        self.stop();
        Ok(())
    }
}

impl std::fmt::Debug for KeepaliveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepaliveScheduler")
            .field("period", &self.period)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
