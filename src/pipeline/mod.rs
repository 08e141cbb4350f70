//! Build and detection steps.
//!
//! - `run_build`: Scan the content tree, write the index and the feed
//! - `check_for_updates`: Compare an index with the saved read state

pub mod build;
pub mod diff;
pub mod feed;
pub mod index;

pub use build::{BuildSummary, run_build};
pub use diff::{CheckResult, UpdateKind, UpdateSet, check_for_updates, classify, detect_updates};
pub use feed::{FeedGenerator, escape_xml, generate_feed};
pub use index::{IndexBuilder, build_index, now_iso, sort_posts};
