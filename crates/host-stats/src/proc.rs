//! Linux stats source backed by the proc filesystem.
//!
//! Parses the fixed-format counter files under `/proc`:
//!
//! - `/proc/stat` - aggregate `cpu` line, cumulative tick counters
//! - `/proc/self/stat` - per-process fields through `rss`
//! - `/proc/meminfo` - `key: value kB` lines
//! - `/proc/loadavg` - 1/5/15-minute load averages
//! - `/proc/uptime` - uptime and cumulative idle seconds
//!
//! The proc root is injectable so tests can point the source at a fixture
//! tree, and containers can read a bind-mounted host proc.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, StatError};
use crate::source::{
    LoadAverages, MemoryCounters, ProcessCpuCounters, SystemCpuCounters, SystemStatsSource,
    UptimeCounters,
};

/// Stats source reading the proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcStatsSource {
    root: PathBuf,
}

impl Default for ProcStatsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcStatsSource {
    /// Source reading the real `/proc`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Source reading a proc tree rooted at `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The proc root this source reads.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_file(&self, rel: &str) -> Result<String> {
        let path = self.root.join(rel);
        fs::read_to_string(&path)
            .map_err(|e| StatError::ReadFailure(format!("{}: {e}", path.display())))
    }
}

impl SystemStatsSource for ProcStatsSource {
    fn read_system_cpu(&self) -> Result<SystemCpuCounters> {
        parse_system_cpu(&self.read_file("stat")?)
    }

    fn read_process_cpu(&self) -> Result<ProcessCpuCounters> {
        parse_process_cpu(&self.read_file("self/stat")?)
    }

    fn read_memory(&self) -> Result<MemoryCounters> {
        parse_meminfo(&self.read_file("meminfo")?)
    }

    fn read_load_average(&self) -> Result<LoadAverages> {
        parse_loadavg(&self.read_file("loadavg")?)
    }

    fn read_uptime(&self) -> Result<UptimeCounters> {
        parse_uptime(&self.read_file("uptime")?)
    }
}

/// Pull and parse the next whitespace-separated field.
fn next_field<'a, T>(
    fields: &mut impl Iterator<Item = &'a str>,
    file: &str,
    name: &str,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = fields
        .next()
        .ok_or_else(|| StatError::ReadFailure(format!("{file}: missing field {name}")))?;
    raw.parse()
        .map_err(|e| StatError::ReadFailure(format!("{file}: field {name}: {e}")))
}

/// Same, but a missing trailing field parses as zero (older kernels emit
/// fewer columns).
fn next_field_or_zero<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    file: &str,
    name: &str,
) -> Result<u64> {
    match fields.next() {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|e| StatError::ReadFailure(format!("{file}: field {name}: {e}"))),
    }
}

fn parse_system_cpu(text: &str) -> Result<SystemCpuCounters> {
    const FILE: &str = "stat";

    let line = text
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| StatError::ReadFailure(format!("{FILE}: no aggregate cpu line")))?;

    let mut fields = line.split_whitespace().skip(1);
    Ok(SystemCpuCounters {
        user: next_field(&mut fields, FILE, "user")?,
        nice: next_field(&mut fields, FILE, "nice")?,
        system: next_field(&mut fields, FILE, "system")?,
        idle: next_field(&mut fields, FILE, "idle")?,
        iowait: next_field_or_zero(&mut fields, FILE, "iowait")?,
        irq: next_field_or_zero(&mut fields, FILE, "irq")?,
        softirq: next_field_or_zero(&mut fields, FILE, "softirq")?,
        steal: next_field_or_zero(&mut fields, FILE, "steal")?,
        guest: next_field_or_zero(&mut fields, FILE, "guest")?,
    })
}

fn parse_process_cpu(text: &str) -> Result<ProcessCpuCounters> {
    const FILE: &str = "self/stat";

    // Field 2 (comm) is wrapped in parentheses and may itself contain
    // spaces and parentheses; the first '(' and the last ')' delimit it.
    let (pid_part, rest) = text
        .split_once('(')
        .ok_or_else(|| StatError::ReadFailure(format!("{FILE}: missing comm open paren")))?;
    let (comm, rest) = rest
        .rsplit_once(')')
        .ok_or_else(|| StatError::ReadFailure(format!("{FILE}: missing comm close paren")))?;

    let pid = pid_part
        .trim()
        .parse()
        .map_err(|e| StatError::ReadFailure(format!("{FILE}: field pid: {e}")))?;

    let mut fields = rest.split_whitespace();
    let state = fields
        .next()
        .and_then(|s| s.chars().next())
        .ok_or_else(|| StatError::ReadFailure(format!("{FILE}: missing field state")))?;

    Ok(ProcessCpuCounters {
        pid,
        comm: comm.to_string(),
        state,
        ppid: next_field(&mut fields, FILE, "ppid")?,
        pgrp: next_field(&mut fields, FILE, "pgrp")?,
        session: next_field(&mut fields, FILE, "session")?,
        tty_nr: next_field(&mut fields, FILE, "tty_nr")?,
        tpgid: next_field(&mut fields, FILE, "tpgid")?,
        flags: next_field(&mut fields, FILE, "flags")?,
        minflt: next_field(&mut fields, FILE, "minflt")?,
        cminflt: next_field(&mut fields, FILE, "cminflt")?,
        majflt: next_field(&mut fields, FILE, "majflt")?,
        cmajflt: next_field(&mut fields, FILE, "cmajflt")?,
        utime: next_field(&mut fields, FILE, "utime")?,
        stime: next_field(&mut fields, FILE, "stime")?,
        cutime: next_field(&mut fields, FILE, "cutime")?,
        cstime: next_field(&mut fields, FILE, "cstime")?,
        priority: next_field(&mut fields, FILE, "priority")?,
        nice: next_field(&mut fields, FILE, "nice")?,
        num_threads: next_field(&mut fields, FILE, "num_threads")?,
        itrealvalue: next_field(&mut fields, FILE, "itrealvalue")?,
        starttime: next_field(&mut fields, FILE, "starttime")?,
        vsize: next_field(&mut fields, FILE, "vsize")?,
        rss: next_field(&mut fields, FILE, "rss")?,
    })
}

fn parse_meminfo(text: &str) -> Result<MemoryCounters> {
    let mut c = MemoryCounters::default();
    let mut saw_total = false;

    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value: u64 = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        match key.trim() {
            "MemTotal" => {
                c.total = value;
                saw_total = true;
            }
            "MemFree" => c.free = value,
            "Buffers" => c.buffers = value,
            "Cached" => c.cached = value,
            "SwapTotal" => c.swap_total = value,
            "SwapFree" => c.swap_free = value,
            _ => {}
        }
    }

    if saw_total {
        Ok(c)
    } else {
        Err(StatError::ReadFailure(
            "meminfo: MemTotal not found".to_string(),
        ))
    }
}

fn parse_loadavg(text: &str) -> Result<LoadAverages> {
    const FILE: &str = "loadavg";

    let mut fields = text.split_whitespace();
    Ok(LoadAverages {
        one: next_field(&mut fields, FILE, "one")?,
        five: next_field(&mut fields, FILE, "five")?,
        fifteen: next_field(&mut fields, FILE, "fifteen")?,
    })
}

fn parse_uptime(text: &str) -> Result<UptimeCounters> {
    const FILE: &str = "uptime";

    let mut fields = text.split_whitespace();
    Ok(UptimeCounters {
        uptime: next_field(&mut fields, FILE, "uptime")?,
        idle: next_field(&mut fields, FILE, "idle")?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628\n\
                        cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933\n\
                        intr 1462898 0 0\n\
                        ctxt 115315133\n";

    #[test]
    fn test_parse_system_cpu_aggregate_line() {
        let c = parse_system_cpu(STAT).expect("aggregate line should parse");
        assert_eq!(c.user, 10_132_153);
        assert_eq!(c.nice, 290_696);
        assert_eq!(c.system, 3_084_719);
        assert_eq!(c.idle, 46_828_483);
        assert_eq!(c.iowait, 16_683);
        assert_eq!(c.irq, 0);
        assert_eq!(c.softirq, 25_195);
        assert_eq!(c.steal, 0);
        assert_eq!(c.guest, 175_628);
    }

    #[test]
    fn test_parse_system_cpu_skips_per_core_lines() {
        // "cpu0" must not match the aggregate "cpu " prefix.
        let c = parse_system_cpu(STAT).expect("aggregate line should parse");
        assert_ne!(c.user, 1_393_280);
    }

    #[test]
    fn test_parse_system_cpu_short_line_defaults_trailing_to_zero() {
        let c = parse_system_cpu("cpu 100 5 50 800\n").expect("short line should parse");
        assert_eq!(c.idle, 800);
        assert_eq!(c.iowait, 0);
        assert_eq!(c.steal, 0);
    }

    #[test]
    fn test_parse_system_cpu_missing_line() {
        let err = parse_system_cpu("intr 0\n").unwrap_err();
        assert!(format!("{err}").contains("no aggregate cpu line"));
    }

    #[test]
    fn test_parse_system_cpu_garbage_field() {
        assert!(parse_system_cpu("cpu x y z w\n").is_err());
    }

    #[test]
    fn test_parse_process_cpu() {
        let line = "1234 (media-server) S 1 1234 1234 0 -1 4194560 \
                    5432 0 12 0 150 75 3 1 20 0 8 0 9876 123456789 4321 \
                    18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";
        let c = parse_process_cpu(line).expect("stat line should parse");
        assert_eq!(c.pid, 1234);
        assert_eq!(c.comm, "media-server");
        assert_eq!(c.state, 'S');
        assert_eq!(c.ppid, 1);
        assert_eq!(c.flags, 4_194_560);
        assert_eq!(c.minflt, 5_432);
        assert_eq!(c.majflt, 12);
        assert_eq!(c.utime, 150);
        assert_eq!(c.stime, 75);
        assert_eq!(c.cutime, 3);
        assert_eq!(c.cstime, 1);
        assert_eq!(c.priority, 20);
        assert_eq!(c.num_threads, 8);
        assert_eq!(c.starttime, 9_876);
        assert_eq!(c.vsize, 123_456_789);
        assert_eq!(c.rss, 4_321);
    }

    #[test]
    fn test_parse_process_cpu_comm_with_spaces_and_parens() {
        let line = "77 (tmux: server (1)) R 1 77 77 0 -1 0 \
                    0 0 0 0 10 5 0 0 20 0 1 0 100 2048 16";
        let c = parse_process_cpu(line).expect("awkward comm should parse");
        assert_eq!(c.comm, "tmux: server (1)");
        assert_eq!(c.state, 'R');
        assert_eq!(c.utime, 10);
        assert_eq!(c.stime, 5);
        assert_eq!(c.rss, 16);
    }

    #[test]
    fn test_parse_process_cpu_truncated_line() {
        let err = parse_process_cpu("55 (short) S 1 2 3").unwrap_err();
        assert!(format!("{err}").contains("missing field"));
    }

    #[test]
    fn test_parse_process_cpu_no_parens() {
        assert!(parse_process_cpu("55 noparens S 1").is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let text = "MemTotal:       16384256 kB\n\
                    MemFree:         8123456 kB\n\
                    MemAvailable:   12000000 kB\n\
                    Buffers:          204800 kB\n\
                    Cached:          3145728 kB\n\
                    SwapCached:            0 kB\n\
                    SwapTotal:       2097152 kB\n\
                    SwapFree:        2000000 kB\n";
        let c = parse_meminfo(text).expect("meminfo should parse");
        assert_eq!(c.total, 16_384_256);
        assert_eq!(c.free, 8_123_456);
        assert_eq!(c.buffers, 204_800);
        assert_eq!(c.cached, 3_145_728);
        assert_eq!(c.swap_total, 2_097_152);
        assert_eq!(c.swap_free, 2_000_000);
    }

    #[test]
    fn test_parse_meminfo_requires_mem_total() {
        let err = parse_meminfo("MemFree: 100 kB\n").unwrap_err();
        assert!(format!("{err}").contains("MemTotal"));
    }

    #[test]
    fn test_parse_loadavg() {
        let l = parse_loadavg("0.52 0.58 0.59 1/467 31337\n").expect("loadavg should parse");
        assert!((l.one - 0.52).abs() < f64::EPSILON);
        assert!((l.five - 0.58).abs() < f64::EPSILON);
        assert!((l.fifteen - 0.59).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_uptime() {
        let u = parse_uptime("35321.12 123456.78\n").expect("uptime should parse");
        assert!((u.uptime - 35_321.12).abs() < f64::EPSILON);
        assert!((u.idle - 123_456.78).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_uptime_truncated() {
        assert!(parse_uptime("35321.12\n").is_err());
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let source = ProcStatsSource::with_root("/nonexistent-proc-root");
        let err = source.read_system_cpu().unwrap_err();
        assert!(matches!(err, StatError::ReadFailure(_)));
    }
}
