use crate::parser::LineReducer;
use ptop_core::{state::NetTotals, Result, SampleError};

/// Sums per-interface cumulative byte counters, skipping loopback.
///
/// Interface lines read `eth0: <rx bytes> ... <tx bytes> ...` with receive
/// bytes first and transmit bytes ninth after the colon; the two header
/// lines carry no colon and fall through untouched.
#[derive(Debug, Default)]
pub struct NetReducer {
    totals: NetTotals,
}

impl LineReducer for NetReducer {
    type Output = NetTotals;

    fn process(&mut self, line: &str) -> Result<()> {
        let Some((name, rest)) = line.split_once(':') else {
            return Ok(());
        };
        if name.trim() == "lo" {
            return Ok(());
        }

        let field = |index: usize| -> Result<u64> {
            rest.split_whitespace()
                .nth(index)
                .ok_or_else(|| {
                    SampleError::Parse(format!("interface line too short: {line:?}"))
                })?
                .parse()
                .map_err(|e| SampleError::Parse(format!("bad interface counter: {e}")))
        };
        let rx = field(0)?;
        let tx = field(8)?;

        self.totals.rx_total += rx;
        self.totals.tx_total += tx;
        Ok(())
    }

    fn finalize(self) -> Self::Output {
        self.totals
    }
}

/// Derives per-tick byte rates from successive cumulative totals.
///
/// The first reading only seeds the baseline: the rate stays 0 rather than
/// spiking to the lifetime total.
#[derive(Debug, Default)]
pub struct NetSeries {
    prev:    Option<NetTotals>,
    rx_rate: u64,
    tx_rate: u64,
}

impl NetSeries {
    /// Feed one tick's totals, updating the derived rates.
    pub fn advance(&mut self, totals: NetTotals) {
        if let Some(prev) = self.prev {
            self.rx_rate = diff("receive", prev.rx_total, totals.rx_total);
            self.tx_rate = diff("transmit", prev.tx_total, totals.tx_total);
        }
        self.prev = Some(totals);
    }

    /// `(rx, tx)` in bytes over the last tick interval.
    #[must_use]
    pub fn rates(&self) -> (u64, u64) {
        (self.rx_rate, self.tx_rate)
    }
}

fn diff(name: &str, prev: u64, current: u64) -> u64 {
    match current.checked_sub(prev) {
        Some(delta) => delta,
        None => {
            // Interface removed or counter reset; one tick at rate 0.
            tracing::warn!("{name} byte counter went backwards: {current} < {prev}");
            0
        }
    }
}
