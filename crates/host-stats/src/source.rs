//! Raw counter types and the stats-source capability trait.
//!
//! The percentage-delta math in [`crate::sample`] operates on the raw
//! counters defined here. Where those counters come from is hidden behind
//! [`SystemStatsSource`], so the math is testable with injected fakes and the
//! platform-specific parsing lives in exactly one place
//! ([`crate::proc::ProcStatsSource`] on Linux).

use crate::error::Result;

/// Cumulative system-wide CPU time counters, in clock ticks (jiffies).
///
/// Counters are non-decreasing since boot. The aggregate `cpu` line of
/// `/proc/stat` is the canonical source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemCpuCounters {
    /// Time spent in user mode.
    pub user: u64,
    /// Time spent in user mode with low priority (nice).
    pub nice: u64,
    /// Time spent in kernel mode.
    pub system: u64,
    /// Time spent idle.
    pub idle: u64,
    /// Time waiting for I/O to complete.
    pub iowait: u64,
    /// Time servicing hardware interrupts.
    pub irq: u64,
    /// Time servicing software interrupts.
    pub softirq: u64,
    /// Time stolen by the hypervisor for other guests.
    pub steal: u64,
    /// Time spent running a guest OS.
    pub guest: u64,
}

impl SystemCpuCounters {
    /// Sum of all tracked tick categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
            + self.guest
    }
}

/// Per-process counters from the fixed field layout of `/proc/self/stat`,
/// through field 24 (`rss`).
///
/// `utime` and `stime` are cumulative clock ticks; the rest ride along for
/// status reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessCpuCounters {
    /// Process ID.
    pub pid: i32,
    /// Executable name, without the surrounding parentheses.
    pub comm: String,
    /// Process state (R, S, D, Z, T, ...).
    pub state: char,
    /// Parent process ID.
    pub ppid: i32,
    /// Process group ID.
    pub pgrp: i32,
    /// Session ID.
    pub session: i32,
    /// Controlling terminal.
    pub tty_nr: i32,
    /// Foreground process group of the controlling terminal.
    pub tpgid: i32,
    /// Kernel flags word.
    pub flags: u32,
    /// Minor faults not requiring a page load from disk.
    pub minflt: u64,
    /// Minor faults of waited-for children.
    pub cminflt: u64,
    /// Major faults requiring a page load from disk.
    pub majflt: u64,
    /// Major faults of waited-for children.
    pub cmajflt: u64,
    /// Time scheduled in user mode, in clock ticks.
    pub utime: u64,
    /// Time scheduled in kernel mode, in clock ticks.
    pub stime: u64,
    /// User-mode time of waited-for children, in clock ticks.
    pub cutime: i64,
    /// Kernel-mode time of waited-for children, in clock ticks.
    pub cstime: i64,
    /// Scheduling priority.
    pub priority: i64,
    /// Nice value.
    pub nice: i64,
    /// Number of threads.
    pub num_threads: i64,
    /// Obsolete interval-timer field, kept for layout fidelity.
    pub itrealvalue: i64,
    /// Time the process started after boot, in clock ticks.
    pub starttime: u64,
    /// Virtual memory size in bytes.
    pub vsize: u64,
    /// Resident set size in pages.
    pub rss: i64,
}

/// Raw memory counters in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    /// Total usable RAM (`MemTotal`).
    pub total: u64,
    /// Free memory (`MemFree`).
    pub free: u64,
    /// Block-device buffer memory (`Buffers`).
    pub buffers: u64,
    /// Page-cache memory (`Cached`).
    pub cached: u64,
    /// Total swap space (`SwapTotal`).
    pub swap_total: u64,
    /// Free swap space (`SwapFree`).
    pub swap_free: u64,
}

/// System load averages over 1/5/15 minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverages {
    /// 1-minute load average.
    pub one: f64,
    /// 5-minute load average.
    pub five: f64,
    /// 15-minute load average.
    pub fifteen: f64,
}

/// System uptime counters, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UptimeCounters {
    /// Seconds since boot.
    pub uptime: f64,
    /// Seconds all CPUs spent idle since boot (may exceed `uptime` on
    /// multi-core hosts).
    pub idle: f64,
}

/// Capability interface over the host's stat facilities.
///
/// Each method performs exactly one raw read and returns counters without
/// any derived values. Implementations must not cache: the caller decides
/// polling cadence, and the samplers rely on successive reads advancing.
pub trait SystemStatsSource: Send + Sync {
    /// Read cumulative system-wide CPU tick counters.
    fn read_system_cpu(&self) -> Result<SystemCpuCounters>;

    /// Read this process's CPU tick counters.
    fn read_process_cpu(&self) -> Result<ProcessCpuCounters>;

    /// Read memory counters.
    fn read_memory(&self) -> Result<MemoryCounters>;

    /// Read load averages.
    fn read_load_average(&self) -> Result<LoadAverages>;

    /// Read uptime counters.
    fn read_uptime(&self) -> Result<UptimeCounters>;
}
