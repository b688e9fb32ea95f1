//! Remote log store access.
//!
//! [`LogSource`] is the seam the sync engine pulls from. [`HttpLogStore`] is
//! the production implementation; [`IndexService`] validates the bootstrap
//! listing into an [`IndexSnapshot`].

mod error;
mod http;
mod index;
mod source;

pub use error::{RemoteError, RemoteResult};
pub use http::{HttpLogStore, HttpStoreSettings, INDEX_FILE_NAME};
pub use index::{is_valid_listing, IndexService, IndexSnapshot};
pub use source::LogSource;
