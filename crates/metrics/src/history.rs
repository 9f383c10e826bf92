use std::collections::VecDeque;

/// Fixed-capacity, newest-first sample window for chart series.
#[derive(Debug, Clone)]
pub struct History {
    samples:  VecDeque<f64>,
    capacity: usize,
}

impl History {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples:  VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new sample at the front, evicting the oldest past capacity.
    pub fn push(&mut self, value: f64) {
        self.samples.push_front(value);
        self.samples.truncate(self.capacity);
    }

    /// Newest-first copy for handing to the rendering layer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Format a byte rate as a human-readable string (e.g. `"2 KB/s"`).
///
/// Division truncates toward zero. The Byte bucket covers values below
/// 1000; everything from there up reads in KB and larger 1024-based units.
#[must_use]
pub fn format_rate(bytes_per_sec: u64) -> String {
    const KIB: u64 = 1 << 10;
    const MIB: u64 = 1 << 20;
    const GIB: u64 = 1 << 30;
    const TIB: u64 = 1 << 40;

    let (num, unit) = if bytes_per_sec < 1000 {
        (bytes_per_sec, "Byte")
    } else if bytes_per_sec < MIB {
        (bytes_per_sec / KIB, "KB")
    } else if bytes_per_sec < GIB {
        (bytes_per_sec / MIB, "MB")
    } else if bytes_per_sec < TIB {
        (bytes_per_sec / GIB, "GB")
    } else {
        (bytes_per_sec / TIB, "TB")
    };

    format!("{num} {unit}/s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_newest_first_within_capacity() {
        let mut history = History::new(5);
        for value in 1..=7 {
            history.push(f64::from(value));
        }
        assert_eq!(history.to_vec(), vec![7.0, 6.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn capacity_zero_stays_empty() {
        let mut history = History::new(0);
        for value in 0..100 {
            history.push(f64::from(value));
        }
        assert!(history.is_empty());
    }

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut history = History::new(5);
        history.push(1.0);
        history.push(2.0);
        assert_eq!(history.to_vec(), vec![2.0, 1.0]);
    }

    #[test]
    fn format_rate_bytes() {
        assert_eq!(format_rate(0), "0 Byte/s");
        assert_eq!(format_rate(999), "999 Byte/s");
    }

    #[test]
    fn format_rate_truncates_kb() {
        assert_eq!(format_rate(1000), "0 KB/s");
        assert_eq!(format_rate(2048), "2 KB/s");
    }

    #[test]
    fn format_rate_larger_units() {
        assert_eq!(format_rate(3 * (1 << 20)), "3 MB/s");
        assert_eq!(format_rate(5 * (1 << 30)), "5 GB/s");
        assert_eq!(format_rate(2 * (1u64 << 40)), "2 TB/s");
    }
}
