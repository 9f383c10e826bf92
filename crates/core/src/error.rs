use thiserror::Error;

/// Top-level error type used across the entire application.
///
/// Nothing here is fatal to the sampling engine: every variant is absorbed
/// at the tick boundary and surfaces to the rendering layer only as a
/// "snapshot unchanged since last tick".
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("config error: {0}")]
    Config(String),

    /// A counter source could not be opened this tick.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// One malformed line; the rest of the source is still processed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The process listing failed, timed out, or had no usable rows.
    #[error("process listing produced no usable rows")]
    NoProcessData,

    /// A cumulative counter decreased between two ticks.
    #[error("counter went backwards: {0}")]
    NegativeDelta(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = SampleError> = std::result::Result<T, E>;
