//! Owned registry of cached host metric samples.
//!
//! One `MetricsRegistry` replaces the classic pile of process-wide mutable
//! stat singletons: the host constructs it once, passes it (typically in an
//! `Arc`) to whichever components need readings, and drives `refresh` from a
//! single maintenance path. Accessors never trigger a read; they hand back
//! the cached sample, which is the default (`ok = false`) before the first
//! successful refresh.
//!
//! Refresh failures are logged at `warn` and leave the previously cached
//! good sample in place, so readers always see the last known good values.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tracing::warn;

use crate::config::StatsConfig;
use crate::error::Result;
use crate::proc::ProcStatsSource;
use crate::sample::{MemorySample, PlatformSample, ProcessCpuSample, SystemCpuSample};
use crate::source::SystemStatsSource;

/// Registry of cached samples for all metric families.
///
/// Samples sit behind `RwLock`s: `refresh_*` takes the write lock briefly,
/// accessors take the read lock and clone. The intended deployment has a
/// single writer (one maintenance timer), but concurrent refreshes are
/// merely redundant, not unsound.
pub struct MetricsRegistry {
    source: Box<dyn SystemStatsSource>,
    system_cpu: RwLock<SystemCpuSample>,
    process_cpu: RwLock<ProcessCpuSample>,
    memory: RwLock<MemorySample>,
    platform: RwLock<PlatformSample>,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("system_cpu", &self.system_cpu)
            .field("process_cpu", &self.process_cpu)
            .field("memory", &self.memory)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl Default for MetricsRegistry {
    /// Registry reading the real `/proc`.
    fn default() -> Self {
        Self::new(Box::new(ProcStatsSource::new()))
    }
}

impl MetricsRegistry {
    /// Registry reading counters from `source`.
    #[must_use]
    pub fn new(source: Box<dyn SystemStatsSource>) -> Self {
        let startup_time = Utc::now().timestamp_millis();
        Self {
            source,
            system_cpu: RwLock::new(SystemCpuSample::default()),
            process_cpu: RwLock::new(ProcessCpuSample::default()),
            memory: RwLock::new(MemorySample::default()),
            platform: RwLock::new(PlatformSample::with_startup(startup_time)),
        }
    }

    /// Registry configured from [`StatsConfig`] (proc root override).
    #[must_use]
    pub fn from_config(config: &StatsConfig) -> Self {
        Self::new(Box::new(ProcStatsSource::with_root(
            config.proc_root.clone(),
        )))
    }

    /// Cached system CPU sample. Never triggers a read.
    #[must_use]
    pub fn system_cpu(&self) -> SystemCpuSample {
        *self
            .system_cpu
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached process CPU sample. Never triggers a read.
    #[must_use]
    pub fn process_cpu(&self) -> ProcessCpuSample {
        self.process_cpu
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cached memory sample. Never triggers a read.
    #[must_use]
    pub fn memory(&self) -> MemorySample {
        *self.memory.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached platform sample. Never triggers a read.
    #[must_use]
    pub fn platform(&self) -> PlatformSample {
        *self
            .platform
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh the system CPU sample: one raw read, replace on success.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StatError::ReadFailure`] when the source cannot
    /// supply counters; the cached sample is left untouched. The failure is
    /// already logged, so callers are free to ignore it.
    pub fn refresh_system_cpu(&self) -> Result<()> {
        let counters = self.source.read_system_cpu().map_err(|e| {
            warn!(error = %e, "system cpu refresh failed, keeping last sample");
            e
        })?;
        let sample_time = Utc::now().timestamp_millis();
        let mut slot = self
            .system_cpu
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let next = SystemCpuSample::advance(&slot, counters, sample_time);
        *slot = next;
        Ok(())
    }

    /// Refresh the process CPU sample: one raw read, replace on success.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StatError::ReadFailure`] when the source cannot
    /// supply counters; the cached sample is left untouched.
    pub fn refresh_process_cpu(&self) -> Result<()> {
        let counters = self.source.read_process_cpu().map_err(|e| {
            warn!(error = %e, "process cpu refresh failed, keeping last sample");
            e
        })?;
        let sample_time = Utc::now().timestamp_millis();
        let mut slot = self
            .process_cpu
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let next = ProcessCpuSample::advance(&slot, counters, sample_time);
        *slot = next;
        Ok(())
    }

    /// Refresh the memory sample: one raw read, replace on success.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StatError::ReadFailure`] when the source cannot
    /// supply counters; the cached sample is left untouched.
    pub fn refresh_memory(&self) -> Result<()> {
        let counters = self.source.read_memory().map_err(|e| {
            warn!(error = %e, "memory refresh failed, keeping last sample");
            e
        })?;
        let sample_time = Utc::now().timestamp_millis();
        let mut slot = self.memory.write().unwrap_or_else(PoisonError::into_inner);
        let next = MemorySample::advance(&slot, counters, sample_time);
        *slot = next;
        Ok(())
    }

    /// Refresh the platform sample (load averages and uptime).
    ///
    /// # Errors
    ///
    /// Returns [`crate::StatError::ReadFailure`] when either read fails; the
    /// cached sample is left untouched.
    pub fn refresh_platform(&self) -> Result<()> {
        let outcome = self
            .source
            .read_load_average()
            .and_then(|load| self.source.read_uptime().map(|up| (load, up)));
        let (load, up) = outcome.map_err(|e| {
            warn!(error = %e, "platform refresh failed, keeping last sample");
            e
        })?;
        let sample_time = Utc::now().timestamp_millis();
        let mut slot = self
            .platform
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let next = PlatformSample::advance(&slot, load, up, sample_time);
        *slot = next;
        Ok(())
    }

    /// Refresh every family. Each family is attempted regardless of earlier
    /// failures; the first error (if any) is returned after all attempts.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::StatError::ReadFailure`] encountered.
    pub fn refresh(&self) -> Result<()> {
        let results = [
            self.refresh_system_cpu(),
            self.refresh_process_cpu(),
            self.refresh_memory(),
            self.refresh_platform(),
        ];
        results
            .into_iter()
            .find(Result::is_err)
            .unwrap_or(Ok(()))
    }
}
