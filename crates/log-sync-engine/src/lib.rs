//! Log synchronization engine.
//!
//! Owns the cursor and runs the fetch loop: bootstrap from the remote index
//! when no cursor exists, then fetch strictly the next sequential file,
//! retrying and resyncing against the index when the store answers 404.

mod engine;
mod error;
mod outcome;
mod resync;

pub use engine::{SyncEngine, SyncMode};
pub use error::{EngineError, EngineResult};
pub use outcome::{FileOutcome, SyncStats};

pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;
