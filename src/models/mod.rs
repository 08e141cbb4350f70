// src/models/mod.rs

//! Domain models for the prediction index.
//!
//! This module contains the data structures shared by the build pipeline
//! and the browsing client, organized by their primary purpose.

mod config;
mod content;
mod read_state;

// Re-export all public types
pub use config::{
    CacheConfig, ClientConfig, Config, FeedConfig, NotifyConfig, PathsConfig, SiteConfig,
};
pub use content::{Index, LatestPost, Note, Post, Review, Symbol, SymbolMeta};
pub use read_state::{ReadState, SymbolMark};
