//! Canonical index assembly.
//!
//! Collects scanned symbols, orders their posts newest first and stamps
//! the result. Apart from `lastUpdated` the output depends only on the
//! scanned tree, so rebuilding an unchanged tree yields the same symbols.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};

use crate::models::{Index, Post, Symbol};
use crate::services::{ScanReport, ScannedSymbol};

/// Builder for constructing the canonical index.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    symbols: BTreeMap<String, Symbol>,
}

impl IndexBuilder {
    /// Create an empty index builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one scanned symbol, replacing any earlier symbol with the same code.
    pub fn add_symbol(&mut self, scanned: ScannedSymbol) {
        let mut posts = scanned.posts;
        sort_posts(&mut posts);

        self.symbols.insert(
            scanned.code,
            Symbol {
                name: scanned.meta.name,
                description: scanned.meta.description,
                icon: scanned.meta.icon,
                posts,
            },
        );
    }

    /// Add every symbol of a scan.
    pub fn add_report(&mut self, report: ScanReport) {
        for symbol in report.symbols {
            self.add_symbol(symbol);
        }
    }

    /// Build the index stamped with the current time.
    pub fn build(self) -> Index {
        self.build_at(now_iso())
    }

    /// Build the index with an explicit `lastUpdated` value.
    pub fn build_at(self, last_updated: impl Into<String>) -> Index {
        Index {
            last_updated: last_updated.into(),
            symbols: self.symbols,
        }
    }
}

/// Posts newest first (equal dates by folder, descending); notes oldest first.
pub fn sort_posts(posts: &mut [Post]) {
    for post in posts.iter_mut() {
        post.notes.sort_by(|a, b| a.time.cmp(&b.time));
    }
    posts.sort_by(compare_posts);
}

fn compare_posts(a: &Post, b: &Post) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.folder.cmp(&a.folder))
}

/// Millisecond-precision UTC timestamp, e.g. `2026-02-16T10:00:00.000Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build an index from a scan report.
pub fn build_index(report: ScanReport) -> Index {
    let mut builder = IndexBuilder::new();
    builder.add_report(report);
    builder.build()
}
