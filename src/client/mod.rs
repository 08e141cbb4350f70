//! Browsing client runtime.
//!
//! - `AppContext`: Index loading, update detection and read-state marking
//! - `Poller`: In-flight guarded periodic refresh

mod context;
mod poller;

pub use context::{AppContext, IndexLoad};
pub use poller::{PollOutcome, Poller};
