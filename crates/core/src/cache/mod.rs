//! Temporary cache medium for uploads awaiting commit.
//!
//! Every upload is written to its own directory under the cache root, named
//! by a token that folds in wall-clock seconds, the process id and a
//! process-wide counter.

mod id;
mod store;

pub use id::{CacheId, sanitize_filename};
pub use store::CacheStore;
