use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure parsed from `ptop.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sampling interval in milliseconds. Ticks that fall behind are
    /// skipped, never queued.
    pub interval_ms: u64,
    /// Chart series capacity: how many past samples each history keeps
    /// (typically the chart width minus its border margin).
    pub history_capacity: usize,
    /// Counter file locations, overridable for tests and non-Linux hosts.
    pub sources: SourceConfig,
    /// Process-listing collaborator settings.
    pub process: ProcessConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            history_capacity: 60,
            sources: SourceConfig::default(),
            process: ProcessConfig::default(),
        }
    }
}

/// Locations of the counter text sources the engine reads each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Cumulative per-CPU time counters.
    pub stat_path: PathBuf,
    /// `MemTotal:` / `MemFree:` counters, values in kilobytes.
    pub meminfo_path: PathBuf,
    /// Per-interface cumulative byte counters.
    pub netdev_path: PathBuf,
    /// Root under which `<pid>/io` counter files live.
    pub proc_root: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            stat_path:    PathBuf::from("/proc/stat"),
            meminfo_path: PathBuf::from("/proc/meminfo"),
            netdev_path:  PathBuf::from("/proc/net/dev"),
            proc_root:    PathBuf::from("/proc"),
        }
    }
}

/// How to invoke the external process-listing command.
///
/// The command text is opaque to the engine; it only requires one header
/// row followed by `pid cpu% mem% user command` rows in any order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Argv of the listing command.
    pub list_command: Vec<String>,
    /// Upper bound on how long one listing invocation may take; a slow
    /// `ps` stalls the whole tick otherwise.
    pub timeout_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            list_command: ["ps", "-e", "-opid,%cpu,%mem,user,comm", "--sort=-pcpu"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_ms: 2000,
        }
    }
}
