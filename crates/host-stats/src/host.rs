//! CPU topology, read once per process.

use std::sync::OnceLock;

use serde::Serialize;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

/// Processor counts of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuTopology {
    /// Whether the probe yielded anything usable.
    pub ok: bool,
    /// Logical CPUs visible to this process.
    pub logical_cpus: usize,
    /// Physical cores; falls back to the logical count when the platform
    /// cannot report it.
    pub physical_cores: usize,
}

/// Host CPU topology, probed on the first call and cached for the process
/// lifetime. Topology does not change under a running server, so one probe
/// is enough.
pub fn cpu_topology() -> &'static CpuTopology {
    static TOPOLOGY: OnceLock<CpuTopology> = OnceLock::new();
    TOPOLOGY.get_or_init(|| {
        let sys = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::everything()),
        );
        let logical = sys.cpus().len();
        CpuTopology {
            ok: logical > 0,
            logical_cpus: logical,
            physical_cores: sys.physical_core_count().unwrap_or(logical),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_reports_at_least_one_cpu() {
        let topology = cpu_topology();
        assert!(topology.ok);
        assert!(topology.logical_cpus >= 1);
        assert!(topology.physical_cores >= 1);
        assert!(topology.physical_cores <= topology.logical_cpus);
    }

    #[test]
    fn test_topology_is_cached() {
        assert!(std::ptr::eq(cpu_topology(), cpu_topology()));
    }
}
