//! Maintenance-loop glue for the host process.
//!
//! The registry never schedules its own polling. A host that wants the
//! conventional setup - one periodic timer refreshing every family - spawns
//! [`run_refresh_loop`] and cancels it on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::registry::MetricsRegistry;

/// Refresh `registry` on a fixed cadence until `cancel` fires.
///
/// The first refresh happens immediately. Per-tick failures are already
/// logged by the registry and do not stop the loop.
pub async fn run_refresh_loop(
    registry: Arc<MetricsRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    info!(?interval, "metrics refresh loop started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("metrics refresh loop stopping");
                break;
            }
            _ = ticker.tick() => {
                let _ = registry.refresh();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::{Result, StatError};
    use crate::source::{
        LoadAverages, MemoryCounters, ProcessCpuCounters, SystemCpuCounters, SystemStatsSource,
        UptimeCounters,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that counts reads and never succeeds past the counter bump.
    #[derive(Default)]
    struct CountingSource {
        reads: Arc<AtomicUsize>,
    }

    impl SystemStatsSource for CountingSource {
        fn read_system_cpu(&self) -> Result<SystemCpuCounters> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(SystemCpuCounters::default())
        }

        fn read_process_cpu(&self) -> Result<ProcessCpuCounters> {
            Ok(ProcessCpuCounters::default())
        }

        fn read_memory(&self) -> Result<MemoryCounters> {
            Err(StatError::ReadFailure("memory unavailable".to_string()))
        }

        fn read_load_average(&self) -> Result<LoadAverages> {
            Ok(LoadAverages::default())
        }

        fn read_uptime(&self) -> Result<UptimeCounters> {
            Ok(UptimeCounters::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_ticks_until_cancelled() {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            reads: Arc::clone(&reads),
        };
        let registry = Arc::new(MetricsRegistry::new(Box::new(source)));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_refresh_loop(
            Arc::clone(&registry),
            Duration::from_secs(5),
            cancel.clone(),
        ));

        // Let the task start and take its immediate first tick.
        tokio::task::yield_now().await;
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(5)).await;
            tokio::task::yield_now().await;
        }

        cancel.cancel();
        handle.await.expect("loop task should join");

        let count = reads.load(Ordering::SeqCst);
        assert!(count >= 3, "expected several refreshes, got {count}");
        // Per-tick memory failures must not have stopped the loop.
        assert!(!registry.memory().ok);
        assert!(registry.system_cpu().ok);
    }
}
