//! Canonical index document and its parts.
//!
//! The serialized form is the public contract read by browsing clients:
//!
//! ```text
//! { "lastUpdated": "...", "symbols": { "BTC": { "name", "description", "icon", "posts": [...] } } }
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-symbol metadata loaded from `meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl SymbolMeta {
    /// Defaults used when `meta.json` is absent or unreadable.
    pub fn defaults_for(code: &str) -> Self {
        Self {
            name: code.to_string(),
            description: String::new(),
            icon: String::new(),
        }
    }
}

/// A tradable instrument and its predictions, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl Symbol {
    /// Effective date of the newest post, or empty when there are none.
    pub fn latest_post_date(&self) -> &str {
        self.posts.first().map(|p| p.date.as_str()).unwrap_or("")
    }

    /// Greatest note timestamp across every post, or empty.
    pub fn latest_note_time(&self) -> &str {
        self.posts
            .iter()
            .flat_map(|p| p.notes.iter())
            .map(|n| n.time.as_str())
            .max()
            .unwrap_or("")
    }
}

/// A dated prediction document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Effective sort key; a header `date` overrides the folder date.
    pub date: String,
    /// Filesystem-derived identifier used for URLs.
    pub folder: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
    pub path: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}

fn default_format() -> String {
    "md".to_string()
}

/// A timestamped addendum to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// `YYYY-MM-DDTHH:MM`
    pub time: String,
    pub title: String,
    pub path: String,
}

/// Post-hoc accuracy assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub accuracy: f64,
    pub verdict: String,
    pub path: String,
}

/// The canonical index, regenerated wholesale on every build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub last_updated: String,
    pub symbols: BTreeMap<String, Symbol>,
}

/// A post flattened out of its symbol, for cross-symbol listings.
#[derive(Debug, Clone, Copy)]
pub struct LatestPost<'a> {
    pub code: &'a str,
    pub symbol: &'a Symbol,
    pub post: &'a Post,
}

impl Index {
    /// Look up a symbol by code.
    pub fn symbol(&self, code: &str) -> Option<&Symbol> {
        self.symbols.get(code)
    }

    /// Symbols ordered by their newest post, most recent first.
    pub fn sorted_symbols(&self) -> Vec<(&str, &Symbol)> {
        let mut symbols: Vec<(&str, &Symbol)> = self
            .symbols
            .iter()
            .map(|(code, symbol)| (code.as_str(), symbol))
            .collect();
        symbols.sort_by(|(a_code, a), (b_code, b)| {
            b.latest_post_date()
                .cmp(a.latest_post_date())
                .then_with(|| a_code.cmp(b_code))
        });
        symbols
    }

    /// The `count` most recent posts across all symbols.
    pub fn latest_posts(&self, count: usize) -> Vec<LatestPost<'_>> {
        let mut posts: Vec<LatestPost<'_>> = self
            .symbols
            .iter()
            .flat_map(|(code, symbol)| {
                symbol.posts.iter().map(move |post| LatestPost {
                    code: code.as_str(),
                    symbol,
                    post,
                })
            })
            .collect();
        posts.sort_by(compare_latest);
        posts.truncate(count);
        posts
    }

    pub fn post_count(&self) -> usize {
        self.symbols.values().map(|s| s.posts.len()).sum()
    }

    pub fn note_count(&self) -> usize {
        self.symbols
            .values()
            .flat_map(|s| s.posts.iter())
            .map(|p| p.notes.len())
            .sum()
    }

    /// True when both indexes carry the same symbols, ignoring `lastUpdated`.
    pub fn same_content(&self, other: &Index) -> bool {
        self.symbols == other.symbols
    }
}

/// Date descending; ties broken by symbol code, then folder descending.
fn compare_latest(a: &LatestPost<'_>, b: &LatestPost<'_>) -> Ordering {
    b.post
        .date
        .cmp(&a.post.date)
        .then_with(|| a.code.cmp(b.code))
        .then_with(|| b.post.folder.cmp(&a.post.folder))
}
