use crate::parser::{reduce_file, LineReducer};
use ptop_core::{state::ProcessSample, Result, SampleError};
use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    time::Duration,
};
use tokio::process::Command;

/// Cumulative I/O counters from one per-process counter read.
#[derive(Debug, Clone, Copy, Default)]
struct IoCounters {
    read_bytes:  u64,
    write_bytes: u64,
}

/// Reducer for `read_bytes:` / `write_bytes:` counter files.
#[derive(Debug, Default)]
struct IoReducer {
    counters: IoCounters,
}

impl LineReducer for IoReducer {
    type Output = IoCounters;

    fn process(&mut self, line: &str) -> Result<()> {
        let slot = if line.starts_with("read_bytes:") {
            &mut self.counters.read_bytes
        } else if line.starts_with("write_bytes:") {
            &mut self.counters.write_bytes
        } else {
            return Ok(());
        };

        let value = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| SampleError::Parse(format!("io line has no value: {line:?}")))?;
        *slot = value
            .parse()
            .map_err(|e| SampleError::Parse(format!("bad io value {value:?}: {e}")))?;
        Ok(())
    }

    fn finalize(self) -> Self::Output {
        self.counters
    }
}

/// Last tick's I/O counters for one pid, tagged with the command so a
/// recycled pid never diffs against a dead process's counters.
#[derive(Debug, Clone)]
struct IoBaseline {
    command:  String,
    counters: IoCounters,
}

/// Enumerates processes via the configured listing command and attaches
/// per-process disk I/O totals and rates.
#[derive(Debug)]
pub struct ProcessSampler {
    command:   Vec<String>,
    timeout:   Duration,
    proc_root: PathBuf,
    baselines: HashMap<i32, IoBaseline>,
}

impl ProcessSampler {
    #[must_use]
    pub fn new(command: Vec<String>, timeout: Duration, proc_root: PathBuf) -> Self {
        Self {
            command,
            timeout,
            proc_root,
            baselines: HashMap::new(),
        }
    }

    /// Run one listing pass.
    ///
    /// `NoProcessData` when the command fails, times out, or yields no
    /// usable rows; the caller should keep its previous table in that case.
    pub async fn sample(&mut self) -> Result<Vec<ProcessSample>> {
        let output = self.run_listing().await?;
        let mut samples = parse_listing(&output)?;
        for sample in &mut samples {
            self.attach_io(sample);
        }
        self.prune(&samples);
        Ok(samples)
    }

    async fn run_listing(&self) -> Result<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(SampleError::NoProcessData)?;

        let output = Command::new(program).args(args).output();
        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!("process listing failed to run: {e}");
                return Err(SampleError::NoProcessData);
            }
            Err(_) => {
                tracing::warn!("process listing timed out after {:?}", self.timeout);
                return Err(SampleError::NoProcessData);
            }
        };
        if !output.status.success() {
            tracing::warn!("process listing exited with {}", output.status);
            return Err(SampleError::NoProcessData);
        }

        String::from_utf8(output.stdout).map_err(|_| SampleError::NoProcessData)
    }

    /// Fill in the sample's I/O totals and, when a matching baseline
    /// exists, its per-tick rates.
    fn attach_io(&mut self, sample: &mut ProcessSample) {
        let path = self.proc_root.join(sample.pid.to_string()).join("io");
        let counters = match reduce_file(&path, IoReducer::default()) {
            Ok(counters) => counters,
            // Process exited between listing and read, or counters are
            // not readable for this uid; totals stay zero.
            Err(_) => return,
        };

        sample.disk_read_bytes = counters.read_bytes;
        sample.disk_write_bytes = counters.write_bytes;

        match self.baselines.get(&sample.pid) {
            Some(baseline) if baseline.command == sample.command => {
                sample.disk_read_rate =
                    counters.read_bytes.saturating_sub(baseline.counters.read_bytes);
                sample.disk_write_rate =
                    counters.write_bytes.saturating_sub(baseline.counters.write_bytes);
            }
            Some(_) => {
                tracing::debug!(pid = sample.pid, "pid recycled; resetting I/O baseline");
            }
            None => {}
        }

        self.baselines.insert(
            sample.pid,
            IoBaseline {
                command:  sample.command.clone(),
                counters,
            },
        );
    }

    /// Drop baselines for pids that no longer appear in the listing.
    fn prune(&mut self, samples: &[ProcessSample]) {
        let live: HashSet<i32> = samples.iter().map(|s| s.pid).collect();
        self.baselines.retain(|pid, _| live.contains(pid));
    }
}

/// Parse listing output: one header row, then `pid cpu% mem% user command`
/// rows in any order.
fn parse_listing(output: &str) -> Result<Vec<ProcessSample>> {
    let mut lines = output.lines();
    if lines.next().is_none() {
        return Err(SampleError::NoProcessData);
    }

    let mut samples = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok(sample) => samples.push(sample),
            Err(e) => tracing::debug!("skipping process row: {e}"),
        }
    }

    if samples.is_empty() {
        return Err(SampleError::NoProcessData);
    }
    Ok(samples)
}

fn parse_row(line: &str) -> Result<ProcessSample> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(SampleError::Parse(format!("process row too short: {line:?}")));
    }

    let pid = fields[0]
        .parse()
        .map_err(|e| SampleError::Parse(format!("bad pid: {e}")))?;
    let cpu_percent = fields[1]
        .parse()
        .map_err(|e| SampleError::Parse(format!("bad cpu%: {e}")))?;
    let mem_percent = fields[2]
        .parse()
        .map_err(|e| SampleError::Parse(format!("bad mem%: {e}")))?;
    let user = fields[3].to_string();
    // Commands with spaces keep their tail fields.
    let command = fields[4..].join(" ");

    Ok(ProcessSample {
        pid,
        user,
        command,
        cpu_percent,
        mem_percent,
        disk_read_bytes: 0,
        disk_write_bytes: 0,
        disk_read_rate: 0,
        disk_write_rate: 0,
    })
}
