//! Log file identifiers and the durable cursor that records the last file
//! fully processed by the agent.

mod error;
mod file_id;
mod store;

pub use error::{CursorError, CursorResult};
pub use file_id::FileId;
pub use store::CursorStore;
