//! Storage abstractions for build outputs and client state.
//!
//! The build writes two published documents; the client keeps one private
//! record under a fixed key:
//!
//! ```text
//! {output_dir}/
//! ├── index.json            # Canonical index (rebuilt wholesale)
//! └── feed.xml              # Atom feed of the newest posts
//!
//! {state_dir}/
//! └── {read_state_key}.json # What this client has already seen
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Index, ReadState};

// Re-export for convenience
pub use local::LocalStorage;

/// Published build outputs.
#[async_trait]
pub trait SiteStorage: Send + Sync {
    /// Replace the index document as a whole.
    async fn write_index(&self, index: &Index) -> Result<()>;

    /// Load the last written index, if any.
    async fn load_index(&self) -> Result<Option<Index>>;

    /// Replace the feed document.
    async fn write_feed(&self, feed: &str) -> Result<()>;
}

/// Client-local persistence of the read state.
#[async_trait]
pub trait ReadStateStore: Send + Sync {
    /// Load the saved state; an unreadable record counts as absent.
    async fn load_read_state(&self) -> Result<Option<ReadState>>;

    /// Persist the state, replacing the previous record.
    async fn save_read_state(&self, state: &ReadState) -> Result<()>;
}
