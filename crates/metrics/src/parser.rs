use ptop_core::{Result, SampleError};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// A per-source line reducer: fed every non-blank line of a counter file,
/// then asked for the finished snapshot.
///
/// Each counter source (CPU, memory, network, per-process I/O) supplies its
/// own implementation; `reduce_file` handles the shared read loop.
pub trait LineReducer {
    type Output;

    /// Digest one trimmed, non-empty line.
    ///
    /// An error marks this line as malformed; the rest of the source is
    /// still processed.
    fn process(&mut self, line: &str) -> Result<()>;

    /// Consume the reducer and produce the typed snapshot.
    fn finalize(self) -> Self::Output;
}

/// Run `reducer` over every line of the file at `path`.
///
/// Malformed lines are logged and skipped, so the caller may receive a
/// partially populated snapshot. Only failure to open the file is an
/// error; the engine then keeps its previous snapshot for the tick.
pub fn reduce_file<R: LineReducer>(path: &Path, mut reducer: R) -> Result<R::Output> {
    let file = File::open(path)
        .map_err(|e| SampleError::SourceUnavailable(format!("{}: {e}", path.display())))?;

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("read error in {}: {e}", path.display());
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(e) = reducer.process(line) {
            tracing::debug!("skipping malformed line in {}: {e}", path.display());
        }
    }

    Ok(reducer.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Counts lines seen; errors on any line containing "bad".
    #[derive(Default)]
    struct Counting {
        seen: usize,
    }

    impl LineReducer for Counting {
        type Output = usize;

        fn process(&mut self, line: &str) -> Result<()> {
            if line.contains("bad") {
                return Err(SampleError::Parse(format!("bad line: {line:?}")));
            }
            self.seen += 1;
            Ok(())
        }

        fn finalize(self) -> usize {
            self.seen
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "one\n\n  \ntwo\n").unwrap();
        let seen = reduce_file(file.path(), Counting::default()).unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn malformed_line_does_not_abort_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "one\nbad apple\ntwo\nthree\n").unwrap();
        let seen = reduce_file(file.path(), Counting::default()).unwrap();
        assert_eq!(seen, 3);
    }

    #[test]
    fn unopenable_source_is_an_error() {
        let err = reduce_file(Path::new("/nonexistent/counters"), Counting::default())
            .unwrap_err();
        assert!(matches!(err, SampleError::SourceUnavailable(_)));
    }
}
