//! The sampling and rate-derivation engine.
//!
//! One periodic tick re-reads each counter source, diffs against the
//! previous reading, updates the bounded chart histories, and publishes an
//! immutable [`Snapshot`] for the rendering layer.

pub mod cpu;
pub mod history;
pub mod memory;
pub mod net;
pub mod parser;
pub mod process;

use chrono::Local;
use ptop_config::SamplerConfig;
use ptop_core::state::{MemSnapshot, ProcessSample, Snapshot};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};

use crate::{
    cpu::{CpuReducer, CpuSeries},
    history::History,
    memory::MemReducer,
    net::{NetReducer, NetSeries},
    parser::reduce_file,
    process::ProcessSampler,
};

/// Owns every piece of cross-tick state: previous counters, derived
/// percentages, rate baselines, process table, and chart histories.
///
/// All sampling for one tick runs sequentially through [`Engine::tick`];
/// nothing here is shared or mutated concurrently.
#[derive(Debug)]
pub struct Engine {
    cfg: SamplerConfig,
    cpu: CpuSeries,
    mem: MemSnapshot,
    net: NetSeries,
    processes: Vec<ProcessSample>,
    sampler: ProcessSampler,
    cpu_history: History,
    mem_history: History,
    rx_history: History,
    tx_history: History,
}

impl Engine {
    #[must_use]
    pub fn new(cfg: SamplerConfig) -> Self {
        let sampler = ProcessSampler::new(
            cfg.process.list_command.clone(),
            Duration::from_millis(cfg.process.timeout_ms),
            cfg.sources.proc_root.clone(),
        );
        let capacity = cfg.history_capacity;
        Self {
            cfg,
            cpu: CpuSeries::default(),
            mem: MemSnapshot::default(),
            net: NetSeries::default(),
            processes: Vec::new(),
            sampler,
            cpu_history: History::new(capacity),
            mem_history: History::new(capacity),
            rx_history: History::new(capacity),
            tx_history: History::new(capacity),
        }
    }

    /// Run one sampling pass and return the resulting snapshot.
    ///
    /// Every failure is absorbed here: an unreadable source or unusable
    /// process listing leaves the matching slice of the snapshot at its
    /// previous value.
    pub async fn tick(&mut self) -> Snapshot {
        match reduce_file(&self.cfg.sources.stat_path, CpuReducer::default()) {
            Ok(counters) => self.cpu.advance(counters),
            Err(e) => tracing::warn!("cpu source: {e}"),
        }

        match reduce_file(&self.cfg.sources.meminfo_path, MemReducer::resuming(self.mem)) {
            Ok(snapshot) => self.mem = snapshot,
            Err(e) => tracing::warn!("memory source: {e}"),
        }

        match reduce_file(&self.cfg.sources.netdev_path, NetReducer::default()) {
            Ok(totals) => self.net.advance(totals),
            Err(e) => tracing::warn!("network source: {e}"),
        }

        match self.sampler.sample().await {
            Ok(list) => self.processes = list,
            // Keep the previous table; the renderer sees no empty flash.
            Err(e) => tracing::warn!("process sampler: {e}"),
        }

        self.update_histories();
        self.snapshot()
    }

    fn update_histories(&mut self) {
        if let Some(overall) = self.cpu.utilization().get("cpu") {
            self.cpu_history.push(overall.busy());
        }
        self.mem_history.push(self.mem.used_percent());
        let (rx, tx) = self.net.rates();
        self.rx_history.push(rx as f64);
        self.tx_history.push(tx as f64);
    }

    fn snapshot(&self) -> Snapshot {
        let (rx, tx) = self.net.rates();
        Snapshot {
            cpus: self.cpu.utilization().clone(),
            mem: self.mem,
            net_rx_rate: rx,
            net_tx_rate: tx,
            processes: self.processes.clone(),
            cpu_history: self.cpu_history.to_vec(),
            mem_history: self.mem_history.to_vec(),
            rx_history: self.rx_history.to_vec(),
            tx_history: self.tx_history.to_vec(),
            time: Local::now(),
        }
    }
}

/// Spawn a background Tokio task that samples every `interval_ms`
/// milliseconds and forwards [`Snapshot`]s through the returned channel.
///
/// The task stops automatically when the receiver is dropped. Ticks that
/// fall behind are skipped, never queued, so sampling passes can't overlap.
pub fn spawn_monitor(cfg: SamplerConfig) -> mpsc::Receiver<Snapshot> {
    let (tx, rx) = mpsc::channel(4);
    let interval = Duration::from_millis(cfg.interval_ms);

    tokio::spawn(async move {
        let mut engine = Engine::new(cfg);
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let snapshot = engine.tick().await;
            if tx.send(snapshot).await.is_err() {
                break; // all receivers dropped
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, path::Path};

    fn write_fixture(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    fn fixture_config(dir: &Path) -> SamplerConfig {
        let mut cfg = SamplerConfig::default();
        cfg.history_capacity = 3;
        cfg.sources.stat_path = write_fixture(dir, "stat", "cpu 100 0 0 100\n");
        cfg.sources.meminfo_path =
            write_fixture(dir, "meminfo", "MemTotal: 1000 kB\nMemFree: 250 kB\n");
        cfg.sources.netdev_path = write_fixture(
            dir,
            "netdev",
            "eth0: 500 1 0 0 0 0 0 0 200 1 0 0 0 0 0 0\n",
        );
        cfg.sources.proc_root = dir.to_path_buf();
        cfg.process.list_command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf '  PID %%CPU %%MEM USER COMMAND\\n1 0.5 0.1 root init\\n'".to_string(),
        ];
        cfg
    }

    #[tokio::test]
    async fn two_ticks_derive_percentages_and_rates() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture_config(dir.path());
        let mut engine = Engine::new(cfg);

        let first = engine.tick().await;
        assert!(first.cpus.is_empty());
        assert_eq!(first.net_rx_rate, 0);
        assert_eq!(first.mem.total_kb, 1000);
        assert_eq!(first.processes.len(), 1);

        write_fixture(dir.path(), "stat", "cpu 150 0 0 150\n");
        write_fixture(
            dir.path(),
            "netdev",
            "eth0: 1500 2 0 0 0 0 0 0 900 2 0 0 0 0 0 0\n",
        );

        let second = engine.tick().await;
        let overall = second.overall_busy().unwrap();
        assert_eq!(overall, 50.0);
        assert_eq!(second.net_rx_rate, 1000);
        assert_eq!(second.net_tx_rate, 700);
        assert_eq!(second.mem_history.len(), 2);
        assert_eq!(second.mem_history[0], 75.0);
    }

    #[tokio::test]
    async fn unreadable_sources_keep_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture_config(dir.path());
        let mut engine = Engine::new(cfg.clone());

        let first = engine.tick().await;
        assert_eq!(first.mem.total_kb, 1000);

        std::fs::remove_file(&cfg.sources.stat_path).unwrap();
        std::fs::remove_file(&cfg.sources.meminfo_path).unwrap();
        std::fs::remove_file(&cfg.sources.netdev_path).unwrap();

        let second = engine.tick().await;
        assert_eq!(second.mem.total_kb, 1000);
        assert_eq!(second.mem.free_kb, 250);
        assert_eq!(second.net_rx_rate, 0);
    }

    #[tokio::test]
    async fn failed_listing_keeps_the_previous_process_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = fixture_config(dir.path());
        let mut engine = Engine::new(cfg.clone());

        let first = engine.tick().await;
        assert_eq!(first.processes.len(), 1);

        cfg.process.list_command = vec!["false".to_string()];
        engine.sampler = ProcessSampler::new(
            cfg.process.list_command.clone(),
            Duration::from_secs(1),
            cfg.sources.proc_root.clone(),
        );

        let second = engine.tick().await;
        assert_eq!(second.processes.len(), 1);
        assert_eq!(second.processes[0].command, "init");
    }

    #[tokio::test]
    async fn histories_are_bounded_and_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture_config(dir.path());
        let mut engine = Engine::new(cfg);

        for free in [900, 800, 700, 600, 500] {
            write_fixture(
                dir.path(),
                "meminfo",
                &format!("MemTotal: 1000 kB\nMemFree: {free} kB\n"),
            );
            engine.tick().await;
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.mem_history, vec![50.0, 40.0, 30.0]);
    }
}
