use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cumulative CPU time reading for a single label (`cpu`, `cpu0`, …).
///
/// Counters are in USER_HZ ticks and only ever grow while the system is up;
/// the engine works on deltas between two readings, never on absolutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuCounters {
    /// Sum of all four counters.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle
    }
}

/// Percentage breakdown of one CPU's time over the last tick.
///
/// The four fields sum to 100 (within floating rounding).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuUtilization {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
}

impl CpuUtilization {
    /// Non-idle share in `[0, 100]`; the number the gauge shows.
    #[must_use]
    pub fn busy(&self) -> f64 {
        self.user + self.nice + self.system
    }
}

/// Total and free memory in kilobytes, as reported by the meminfo source.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemSnapshot {
    pub total_kb: u64,
    pub free_kb: u64,
}

impl MemSnapshot {
    /// Used memory as a percentage in `[0, 100]`.
    ///
    /// A source reporting more free than total memory clamps to 0% used
    /// instead of underflowing.
    #[must_use]
    pub fn used_percent(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        self.total_kb.saturating_sub(self.free_kb) as f64 * 100.0 / self.total_kb as f64
    }
}

/// Cumulative byte totals summed over all non-loopback interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetTotals {
    pub rx_total: u64,
    pub tx_total: u64,
}

/// One row of the process table at a given tick.
///
/// `disk_*_bytes` are lifetime totals from the process's I/O counters;
/// `disk_*_rate` are bytes over the last tick, and stay 0 until the same
/// process (pid *and* command) has been seen on two consecutive ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: i32,
    pub user: String,
    pub command: String,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub disk_read_bytes: u64,
    pub disk_write_bytes: u64,
    pub disk_read_rate: u64,
    pub disk_write_rate: u64,
}

/// A point-in-time snapshot handed to the rendering layer each tick.
///
/// The engine owns all mutable series state; renderers only ever see this
/// immutable value, cloned per tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Utilization per CPU label. Empty until the second tick.
    pub cpus: BTreeMap<String, CpuUtilization>,
    /// Latest memory reading.
    pub mem: MemSnapshot,
    /// Receive rate in bytes per tick interval.
    pub net_rx_rate: u64,
    /// Transmit rate in bytes per tick interval.
    pub net_tx_rate: u64,
    /// Process table rows, in listing-command order.
    pub processes: Vec<ProcessSample>,
    /// Overall CPU busy-percent series, newest first.
    pub cpu_history: Vec<f64>,
    /// Memory used-percent series, newest first.
    pub mem_history: Vec<f64>,
    /// Receive-rate series, newest first.
    pub rx_history: Vec<f64>,
    /// Transmit-rate series, newest first.
    pub tx_history: Vec<f64>,
    /// Wall-clock time the snapshot was taken.
    pub time: DateTime<Local>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            cpus: BTreeMap::new(),
            mem: MemSnapshot::default(),
            net_rx_rate: 0,
            net_tx_rate: 0,
            processes: Vec::new(),
            cpu_history: Vec::new(),
            mem_history: Vec::new(),
            rx_history: Vec::new(),
            tx_history: Vec::new(),
            time: Local::now(),
        }
    }
}

impl Snapshot {
    /// Busy percent of the aggregate `cpu` label, if known yet.
    #[must_use]
    pub fn overall_busy(&self) -> Option<f64> {
        self.cpus.get("cpu").map(CpuUtilization::busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_percent_basic() {
        let mem = MemSnapshot {
            total_kb: 1000,
            free_kb: 250,
        };
        assert_eq!(mem.used_percent(), 75.0);
    }

    #[test]
    fn used_percent_zero_total() {
        assert_eq!(MemSnapshot::default().used_percent(), 0.0);
    }

    #[test]
    fn used_percent_free_above_total_clamps_to_zero() {
        let mem = MemSnapshot {
            total_kb: 100,
            free_kb: 250,
        };
        assert_eq!(mem.used_percent(), 0.0);
    }

    #[test]
    fn busy_excludes_idle() {
        let util = CpuUtilization {
            user: 40.0,
            nice: 5.0,
            system: 15.0,
            idle: 40.0,
        };
        assert_eq!(util.busy(), 60.0);
    }
}
