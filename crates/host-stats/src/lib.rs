//! Host system metrics shim.
//!
//! Best-effort telemetry about the machine and process a media server runs
//! on: CPU and memory utilization, load averages, uptime, local interface
//! addresses, and socket endpoint lookups. Everything is cached; readers
//! get the last known good sample and a validity flag, never a panic.
//!
//! # Usage
//!
//! ```rust,ignore
//! let registry = Arc::new(MetricsRegistry::default());
//! tokio::spawn(run_refresh_loop(
//!     Arc::clone(&registry),
//!     Duration::from_secs(10),
//!     shutdown_token.child_token(),
//! ));
//!
//! // Elsewhere, any number of readers:
//! let cpu = registry.system_cpu();
//! if cpu.ok {
//!     info!("cpu busy: {:.1}%", cpu.percent * 100.0);
//! }
//! ```
//!
//! # Modules
//!
//! - [`registry`] - owned cache of current samples, refresh entry points
//! - [`sample`] - sample types and the delta-percentage math
//! - [`source`] - raw counters and the stats-source capability trait
//! - [`proc`] - Linux proc-filesystem source
//! - [`net`] - interface addresses and socket endpoint lookups
//! - [`host`] - CPU topology
//! - [`task`] - tokio maintenance-loop glue
//! - [`config`] - environment configuration
//! - [`error`] - the one error kind

#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod host;
pub mod net;
pub mod proc;
pub mod registry;
pub mod sample;
pub mod source;
pub mod task;
