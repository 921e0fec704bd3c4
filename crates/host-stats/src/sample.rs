//! Cached sample types and the delta-percentage math.
//!
//! A sample is one timestamped read of raw counters plus a derived
//! percentage. Each type's `advance` constructor consumes the sample it is
//! replacing, so the previous counters live exactly long enough to compute
//! one delta.
//!
//! Percentage fields are meaningful only when `ok` is true; callers must
//! check `ok` before trusting a sample. A delta with `total <= 0` (first
//! sample, clock anomaly) retains the previous percentage instead of
//! reporting a spurious zero.

use serde::Serialize;

use crate::source::{
    LoadAverages, MemoryCounters, ProcessCpuCounters, SystemCpuCounters, UptimeCounters,
};

/// System-wide CPU utilization sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SystemCpuSample {
    /// Whether the underlying read succeeded.
    pub ok: bool,
    /// Wall-clock sample time, milliseconds since the Unix epoch.
    pub sample_time: i64,
    /// Busy fraction over the last delta, in [0, 1].
    pub percent: f32,
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

impl SystemCpuSample {
    /// Build the next sample from fresh counters and the sample being
    /// replaced.
    ///
    /// `percent = 1 - idle_delta / total` across all tracked tick
    /// categories; when `total <= 0` the previous percent is retained.
    // Tick counters fit i64 for any realistic uptime, and f64 precision is
    // ample for a telemetry percentage.
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn advance(prev: &Self, c: SystemCpuCounters, sample_time: i64) -> Self {
        let mut next = Self {
            ok: true,
            sample_time,
            percent: prev.percent,
            user: c.user,
            nice: c.nice,
            system: c.system,
            idle: c.idle,
            iowait: c.iowait,
            irq: c.irq,
            softirq: c.softirq,
            steal: c.steal,
            guest: c.guest,
        };

        let total = c.total() as i64 - prev.total_ticks() as i64;
        let idle_delta = c.idle as i64 - prev.idle as i64;
        if total > 0 {
            next.percent = (1.0 - idle_delta as f64 / total as f64) as f32;
        }
        next
    }

    fn total_ticks(&self) -> u64 {
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

/// Per-process CPU utilization sample, mirroring the leading fixed-layout
/// fields of `/proc/self/stat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessCpuSample {
    /// Whether the underlying read succeeded.
    pub ok: bool,
    /// Wall-clock sample time, milliseconds since the Unix epoch.
    pub sample_time: i64,
    /// Busy fraction of this process over the last delta. One fully busy
    /// core reads 1.0; the value can exceed 1.0 on multi-core hosts.
    pub percent: f32,
    /// Process ID.
    pub pid: i32,
    /// Executable name.
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
    /// Minor faults.
    pub minflt: u64,
    /// Minor faults of waited-for children.
    pub cminflt: u64,
    /// Major faults.
    pub majflt: u64,
    /// Major faults of waited-for children.
    pub cmajflt: u64,
    /// Time scheduled in user mode, in clock ticks.
    pub utime: u64,
    /// Time scheduled in kernel mode, in clock ticks.
    pub stime: u64,
    /// User-mode time of waited-for children.
    pub cutime: i64,
    /// Kernel-mode time of waited-for children.
    pub cstime: i64,
    /// Scheduling priority.
    pub priority: i64,
    /// Nice value.
    pub nice: i64,
    /// Number of threads.
    pub num_threads: i64,
    /// Obsolete interval-timer field.
    pub itrealvalue: i64,
    /// Time the process started after boot, in clock ticks.
    pub starttime: u64,
    /// Virtual memory size in bytes.
    pub vsize: u64,
    /// Resident set size in pages.
    pub rss: i64,
}

impl ProcessCpuSample {
    /// Build the next sample from fresh counters and the sample being
    /// replaced.
    ///
    /// `total` is the wall-clock delta in milliseconds, `usage` the
    /// utime+stime tick delta; `percent = usage * 1000 / total / 100`,
    /// i.e. ticks-per-second normalized by the 100 ticks/sec clock. When
    /// `total <= 0` the previous percent is retained.
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn advance(prev: &Self, c: ProcessCpuCounters, sample_time: i64) -> Self {
        let mut next = Self {
            ok: true,
            sample_time,
            percent: prev.percent,
            pid: c.pid,
            comm: c.comm,
            state: c.state,
            ppid: c.ppid,
            pgrp: c.pgrp,
            session: c.session,
            tty_nr: c.tty_nr,
            tpgid: c.tpgid,
            flags: c.flags,
            minflt: c.minflt,
            cminflt: c.cminflt,
            majflt: c.majflt,
            cmajflt: c.cmajflt,
            utime: c.utime,
            stime: c.stime,
            cutime: c.cutime,
            cstime: c.cstime,
            priority: c.priority,
            nice: c.nice,
            num_threads: c.num_threads,
            itrealvalue: c.itrealvalue,
            starttime: c.starttime,
            vsize: c.vsize,
            rss: c.rss,
        };

        let total = sample_time - prev.sample_time;
        let usage = (next.utime + next.stime) as i64 - (prev.utime + prev.stime) as i64;
        if total > 0 {
            next.percent = (usage as f64 * 1000.0 / total as f64 / 100.0) as f32;
        }
        next
    }
}

/// Memory utilization sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemorySample {
    /// Whether the underlying read succeeded.
    pub ok: bool,
    /// Wall-clock sample time, milliseconds since the Unix epoch.
    pub sample_time: i64,
    /// RAM actually in use as a fraction of total, in [0, 1].
    pub percent_ram: f32,
    /// Swap in use as a fraction of total swap, in [0, 1].
    pub percent_swap: f32,
    /// `total - free`, in kB.
    pub active: u64,
    /// `active - buffers - cached`, in kB.
    pub real_in_use: u64,
    /// `total - real_in_use`, in kB.
    pub not_in_use: u64,
    /// Total usable RAM, in kB.
    pub total: u64,
    /// Free RAM, in kB.
    pub free: u64,
    /// Block-device buffer memory, in kB.
    pub buffers: u64,
    /// Page-cache memory, in kB.
    pub cached: u64,
    /// Total swap space, in kB.
    pub swap_total: u64,
    /// Free swap space, in kB.
    pub swap_free: u64,
}

impl MemorySample {
    /// Build the next sample from fresh counters and the sample being
    /// replaced.
    ///
    /// Buffer and page-cache memory count as reclaimable, so
    /// `real_in_use = (total - free) - buffers - cached`. Zero totals
    /// retain the previous percentage.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    #[must_use]
    pub fn advance(prev: &Self, c: MemoryCounters, sample_time: i64) -> Self {
        let active = c.total.saturating_sub(c.free);
        let real_in_use = active.saturating_sub(c.buffers).saturating_sub(c.cached);
        let not_in_use = c.total.saturating_sub(real_in_use);

        let percent_ram = if c.total > 0 {
            (real_in_use as f64 / c.total as f64) as f32
        } else {
            prev.percent_ram
        };
        let percent_swap = if c.swap_total > 0 {
            (c.swap_total.saturating_sub(c.swap_free) as f64 / c.swap_total as f64) as f32
        } else {
            prev.percent_swap
        };

        Self {
            ok: true,
            sample_time,
            percent_ram,
            percent_swap,
            active,
            real_in_use,
            not_in_use,
            total: c.total,
            free: c.free,
            buffers: c.buffers,
            cached: c.cached,
            swap_total: c.swap_total,
            swap_free: c.swap_free,
        }
    }
}

/// Platform sample: load averages and uptime, raw pass-through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlatformSample {
    /// Whether the underlying read succeeded.
    pub ok: bool,
    /// Wall-clock sample time, milliseconds since the Unix epoch.
    pub sample_time: i64,
    /// Wall-clock time the owning registry was created, milliseconds since
    /// the Unix epoch.
    pub startup_time: i64,
    /// Seconds since boot.
    pub os_uptime: f64,
    /// Seconds all CPUs spent idle since boot.
    pub os_idle_time: f64,
    /// 1-minute load average.
    pub load_one: f64,
    /// 5-minute load average.
    pub load_five: f64,
    /// 15-minute load average.
    pub load_fifteen: f64,
}

impl PlatformSample {
    /// Default sample stamped with the process startup time.
    #[must_use]
    pub fn with_startup(startup_time: i64) -> Self {
        Self {
            startup_time,
            ..Self::default()
        }
    }

    /// Build the next sample from fresh counters and the sample being
    /// replaced. No derived computation; the startup time carries over.
    #[must_use]
    pub fn advance(
        prev: &Self,
        load: LoadAverages,
        up: UptimeCounters,
        sample_time: i64,
    ) -> Self {
        Self {
            ok: true,
            sample_time,
            startup_time: prev.startup_time,
            os_uptime: up.uptime,
            os_idle_time: up.idle,
            load_one: load.one,
            load_five: load.five,
            load_fifteen: load.fifteen,
        }
    }
}
