use crate::parser::LineReducer;
use ptop_core::{state::MemSnapshot, Result, SampleError};

/// Extracts `MemTotal:` / `MemFree:` from a meminfo-style counter file.
///
/// All other lines are ignored. A field missing from the source keeps the
/// value the reducer was seeded with (zero on the first run).
#[derive(Debug, Default)]
pub struct MemReducer {
    snapshot: MemSnapshot,
}

impl MemReducer {
    /// Seed the reducer with the previous tick's snapshot so a field
    /// absent this tick holds its prior value.
    #[must_use]
    pub fn resuming(prev: MemSnapshot) -> Self {
        Self { snapshot: prev }
    }
}

impl LineReducer for MemReducer {
    type Output = MemSnapshot;

    fn process(&mut self, line: &str) -> Result<()> {
        let slot = if line.starts_with("MemTotal:") {
            &mut self.snapshot.total_kb
        } else if line.starts_with("MemFree:") {
            &mut self.snapshot.free_kb
        } else {
            return Ok(());
        };

        let value = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| SampleError::Parse(format!("meminfo line has no value: {line:?}")))?;
        *slot = value
            .parse()
            .map_err(|e| SampleError::Parse(format!("bad meminfo value {value:?}: {e}")))?;
        Ok(())
    }

    fn finalize(self) -> Self::Output {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_total_and_free() {
        let mut reducer = MemReducer::default();
        reducer.process("MemTotal: 1000 kB").unwrap();
        reducer.process("MemFree: 250 kB").unwrap();
        reducer.process("Buffers: 82132 kB").unwrap();

        let mem = reducer.finalize();
        assert_eq!(mem.total_kb, 1000);
        assert_eq!(mem.free_kb, 250);
        assert_eq!(mem.used_percent(), 75.0);
    }

    #[test]
    fn missing_field_keeps_seeded_value() {
        let prev = MemSnapshot {
            total_kb: 16384,
            free_kb: 4096,
        };
        let mut reducer = MemReducer::resuming(prev);
        reducer.process("MemFree: 2048 kB").unwrap();

        let mem = reducer.finalize();
        assert_eq!(mem.total_kb, 16384);
        assert_eq!(mem.free_kb, 2048);
    }

    #[test]
    fn malformed_value_is_a_parse_error() {
        let mut reducer = MemReducer::default();
        let err = reducer.process("MemTotal: lots kB").unwrap_err();
        assert!(matches!(err, SampleError::Parse(_)));
    }
}
