//! Background eviction of idle sessions.
//!
//! Sessions untouched for longer than the configured idle TTL are removed on
//! a fixed interval. The sweeper only runs when a TTL is configured.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RetentionConfig;
use crate::conversation::{ConversationStore, StoreResult};

/// Statistics from one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepStats {
    /// Number of sessions evicted.
    pub evicted: usize,
    /// Sweep duration in milliseconds.
    pub duration_ms: u64,
}

/// Periodic idle-session sweeper.
pub struct SessionSweeper {
    store: Arc<dyn ConversationStore>,
    idle_ttl: Duration,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl SessionSweeper {
    /// Create a sweeper; `None` when retention keeps sessions forever.
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStore>, retention: &RetentionConfig) -> Option<Self> {
        let idle_ttl = retention.idle_ttl?;
        Some(Self {
            store,
            idle_ttl,
            interval: retention.cleanup_interval,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Get a shutdown notifier to stop the sweeper.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the sweeper as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(ttl = ?self.idle_ttl, interval = ?self.interval, "Starting session sweeper");

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {
                    match self.sweep().await {
                        Ok(stats) if stats.evicted > 0 => {
                            info!(
                                evicted = stats.evicted,
                                duration_ms = stats.duration_ms,
                                "Idle sessions evicted"
                            );
                        }
                        Ok(_) => debug!("Sweep found no idle sessions"),
                        Err(err) => warn!(%err, "Session sweep failed"),
                    }
                }
                () = self.shutdown.notified() => {
                    info!("Session sweeper shutting down");
                    break;
                }
            }
        }
    }

    /// Run a single sweep.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn sweep(&self) -> StoreResult<SweepStats> {
        let start = Instant::now();
        let evicted = self.store.evict_idle(self.idle_ttl).await?;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(SweepStats {
            evicted,
            duration_ms,
        })
    }
}
