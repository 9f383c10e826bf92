pub mod error;
pub mod state;

pub use error::{Result, SampleError};
pub use state::Snapshot;
