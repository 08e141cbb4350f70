//! Cache-strategy engine for the browsing client.
//!
//! - `classify`: Pure mapping of a request onto a strategy
//! - `CacheEngine`: Lifecycle state machine plus strategy dispatch
//! - `CacheStore` / `Fetcher`: Storage and network seams

mod classify;
mod engine;
mod fetch;
mod request;
mod store;

pub use classify::{RequestClass, Scope, classify};
pub use engine::{ActivationReport, CacheEngine, CacheNamespace, ContentClass, Lifecycle};
pub use fetch::{Fetcher, HttpFetcher};
pub use request::{Destination, Request, Response};
pub use store::{CacheStore, MemoryCacheStore};
