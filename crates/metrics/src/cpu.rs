use crate::parser::LineReducer;
use ptop_core::{
    state::{CpuCounters, CpuUtilization},
    Result, SampleError,
};
use std::collections::BTreeMap;

/// Collects `cpu*` lines from the stat source into a counters map.
///
/// Recognizes the aggregate `cpu` label and per-core `cpu0`, `cpu1`, …;
/// every other line (interrupts, context switches, boot time) is ignored.
/// Fields past `idle` are ignored too.
#[derive(Debug, Default)]
pub struct CpuReducer {
    counters: BTreeMap<String, CpuCounters>,
}

impl LineReducer for CpuReducer {
    type Output = BTreeMap<String, CpuCounters>;

    fn process(&mut self, line: &str) -> Result<()> {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            return Ok(());
        };
        let Some(suffix) = label.strip_prefix("cpu") else {
            return Ok(());
        };
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(());
        }

        let mut next = |name: &str| -> Result<u64> {
            fields
                .next()
                .ok_or_else(|| SampleError::Parse(format!("cpu line missing {name} field")))?
                .parse()
                .map_err(|e| SampleError::Parse(format!("bad cpu {name} field: {e}")))
        };
        let counters = CpuCounters {
            user:   next("user")?,
            nice:   next("nice")?,
            system: next("system")?,
            idle:   next("idle")?,
        };

        self.counters.insert(label.to_string(), counters);
        Ok(())
    }

    fn finalize(self) -> Self::Output {
        self.counters
    }
}

/// Tracks counters across ticks and derives utilization percentages.
///
/// Starts uninitialized: the first reading only seeds the baseline and
/// emits nothing. Labels appearing later (hot-added CPUs) are adopted the
/// same way; labels that disappear keep their last percentages (documented
/// drift, they stop updating).
#[derive(Debug, Default)]
pub struct CpuSeries {
    prev:   BTreeMap<String, CpuCounters>,
    latest: BTreeMap<String, CpuUtilization>,
}

impl CpuSeries {
    /// Feed one tick's counters, updating the derived percentages.
    pub fn advance(&mut self, fresh: BTreeMap<String, CpuCounters>) {
        if self.prev.is_empty() {
            self.prev = fresh;
            return;
        }

        for (label, new) in fresh {
            let Some(old) = self.prev.get(&label) else {
                // Hot-added label: baseline now, percentages next tick.
                self.prev.insert(label, new);
                continue;
            };

            match delta(*old, new) {
                Ok(d) if d.total() > 0 => {
                    self.latest.insert(label.clone(), utilization(d));
                }
                // Zero total delta: keep the previous percentages rather
                // than divide by zero.
                Ok(_) => {}
                // A counter went backwards (wraparound or misread): keep
                // the previous percentages for this tick. The stored
                // counters are still refreshed below so the next tick
                // diffs against the fresh reading.
                Err(e) => tracing::warn!("cpu label {label}: {e}"),
            }
            self.prev.insert(label, new);
        }
    }

    /// Latest derived percentages per label. Empty until two readings
    /// have been observed.
    #[must_use]
    pub fn utilization(&self) -> &BTreeMap<String, CpuUtilization> {
        &self.latest
    }
}

fn delta(old: CpuCounters, new: CpuCounters) -> Result<CpuCounters> {
    let sub = |name: &str, old: u64, new: u64| -> Result<u64> {
        new.checked_sub(old)
            .ok_or_else(|| SampleError::NegativeDelta(format!("{name} {new} < {old}")))
    };
    Ok(CpuCounters {
        user:   sub("user", old.user, new.user)?,
        nice:   sub("nice", old.nice, new.nice)?,
        system: sub("system", old.system, new.system)?,
        idle:   sub("idle", old.idle, new.idle)?,
    })
}

fn utilization(d: CpuCounters) -> CpuUtilization {
    let total = d.total() as f64;
    CpuUtilization {
        user:   d.user as f64 / total * 100.0,
        nice:   d.nice as f64 / total * 100.0,
        system: d.system as f64 / total * 100.0,
        idle:   d.idle as f64 / total * 100.0,
    }
}
