//! Update detection for read-state driven notifications.
//!
//! Compares the canonical index with what the client has already seen and
//! sorts each symbol into at most one bucket: a new post, or failing that a
//! new note. A new post masks a new note within the same check.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Index, ReadState, Symbol, SymbolMark};

/// Kind of unread change on one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    NewPost,
    NewNote,
}

/// Symbols with unread changes; the two sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSet {
    pub new_posts: BTreeSet<String>,
    pub new_notes: BTreeSet<String>,
}

impl UpdateSet {
    /// Check if any symbol has an unread change.
    pub fn has_updates(&self) -> bool {
        !self.new_posts.is_empty() || !self.new_notes.is_empty()
    }

    /// Whether `code` is in either set.
    pub fn contains(&self, code: &str) -> bool {
        self.new_posts.contains(code) || self.new_notes.contains(code)
    }

    /// Union of both sets, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        self.new_posts
            .union(&self.new_notes)
            .map(String::as_str)
            .collect()
    }

    /// Only notes changed; no symbol has a new post.
    pub fn notes_only(&self) -> bool {
        self.new_posts.is_empty() && !self.new_notes.is_empty()
    }

    pub fn remove(&mut self, code: &str) {
        self.new_posts.remove(code);
        self.new_notes.remove(code);
    }

    pub fn clear(&mut self) {
        self.new_posts.clear();
        self.new_notes.clear();
    }

    fn insert(&mut self, code: &str, kind: UpdateKind) {
        match kind {
            UpdateKind::NewPost => self.new_posts.insert(code.to_string()),
            UpdateKind::NewNote => self.new_notes.insert(code.to_string()),
        };
    }
}

/// Result of one check against the saved read state.
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub updates: UpdateSet,
    /// Present on a cold start; the caller persists it as the new baseline.
    pub baseline: Option<ReadState>,
}

/// Classify one symbol against its saved mark.
pub fn classify(symbol: &Symbol, mark: Option<&SymbolMark>) -> Option<UpdateKind> {
    let latest_post = symbol.latest_post_date();
    let latest_note = symbol.latest_note_time();

    match mark {
        None if !latest_post.is_empty() => Some(UpdateKind::NewPost),
        None => None,
        Some(mark) if latest_post > mark.date.as_str() => Some(UpdateKind::NewPost),
        Some(mark) if latest_note > mark.note_time.as_str() => Some(UpdateKind::NewNote),
        Some(_) => None,
    }
}

/// Classify every symbol of `index` against `state`.
pub fn detect_updates(index: &Index, state: &ReadState) -> UpdateSet {
    let mut updates = UpdateSet::default();
    for (code, symbol) in &index.symbols {
        if let Some(kind) = classify(symbol, state.mark(code)) {
            updates.insert(code, kind);
        }
    }
    updates
}

/// Run a check; with no saved state, report nothing and return a baseline.
pub fn check_for_updates(index: &Index, saved: Option<&ReadState>, now: &str) -> CheckResult {
    match saved {
        Some(state) => CheckResult {
            updates: detect_updates(index, state),
            baseline: None,
        },
        None => CheckResult {
            updates: UpdateSet::default(),
            baseline: Some(ReadState::baseline(index, now)),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{Note, Post};

    fn post(date: &str, notes: &[&str]) -> Post {
        Post {
            date: date.to_string(),
            folder: date.to_string(),
            title: String::new(),
            subtitle: None,
            summary: None,
            format: "md".to_string(),
            path: String::new(),
            tags: Vec::new(),
            notes: notes
                .iter()
                .map(|t| Note {
                    time: t.to_string(),
                    title: String::new(),
                    path: String::new(),
                })
                .collect(),
            review: None,
        }
    }

    fn index(entries: Vec<(&str, Vec<Post>)>, stamp: &str) -> Index {
        let symbols = entries
            .into_iter()
            .map(|(code, posts)| {
                (
                    code.to_string(),
                    Symbol {
                        name: code.to_string(),
                        description: String::new(),
                        icon: String::new(),
                        posts,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        Index {
            last_updated: stamp.to_string(),
            symbols,
        }
    }

    fn mark(date: &str, note_time: &str) -> SymbolMark {
        SymbolMark {
            date: date.to_string(),
            note_time: note_time.to_string(),
        }
    }

    #[test]
    fn test_cold_start_then_new_post() {
        let first = index(vec![("BTC", vec![post("2026-02-16", &[])])], "t1");

        let result = check_for_updates(&first, None, "now");
        assert!(!result.updates.has_updates());
        let baseline = result.baseline.unwrap();
        assert_eq!(baseline.mark("BTC"), Some(&mark("2026-02-16", "")));

        let again = check_for_updates(&first, Some(&baseline), "now");
        assert!(!again.updates.has_updates());
        assert!(again.baseline.is_none());

        let second = index(
            vec![("BTC", vec![post("2026-02-17", &[]), post("2026-02-16", &[])])],
            "t2",
        );
        let updated = check_for_updates(&second, Some(&baseline), "now");
        assert!(updated.updates.new_posts.contains("BTC"));
        assert!(updated.updates.new_notes.is_empty());
    }

    #[test]
    fn test_new_note_only() {
        let saved = ReadState {
            last_checked: String::new(),
            symbols: [("BTC".to_string(), mark("2026-02-16", "2026-02-16T14:30"))].into(),
        };
        let current = index(
            vec![(
                "BTC",
                vec![post("2026-02-16", &["2026-02-16T14:30", "2026-02-16T15:00"])],
            )],
            "t",
        );

        let updates = detect_updates(&current, &saved);
        assert!(updates.new_notes.contains("BTC"));
        assert!(!updates.new_posts.contains("BTC"));
        assert!(updates.notes_only());
    }

    #[test]
    fn test_new_post_masks_new_note() {
        let saved = ReadState {
            last_checked: String::new(),
            symbols: [("BTC".to_string(), mark("2026-02-16", "2026-02-16T14:30"))].into(),
        };
        let current = index(
            vec![(
                "BTC",
                vec![
                    post("2026-02-17", &[]),
                    post("2026-02-16", &["2026-02-16T18:00"]),
                ],
            )],
            "t",
        );

        let updates = detect_updates(&current, &saved);
        assert_eq!(updates.symbols(), vec!["BTC"]);
        assert!(updates.new_notes.is_empty());
    }

    #[test]
    fn test_unknown_symbol_is_new_post() {
        let saved = ReadState::default();
        let current = index(
            vec![("ETH", vec![post("2026-01-01", &[])]), ("SOL", Vec::new())],
            "t",
        );

        let updates = detect_updates(&current, &saved);
        assert!(updates.new_posts.contains("ETH"));
        // No posts, nothing to report
        assert!(!updates.contains("SOL"));
    }

    #[test]
    fn test_older_content_is_not_an_update() {
        let saved = ReadState {
            last_checked: String::new(),
            symbols: [("BTC".to_string(), mark("2026-02-20", "2026-02-20T10:00"))].into(),
        };
        let current = index(
            vec![("BTC", vec![post("2026-02-16", &["2026-02-16T09:00"])])],
            "t",
        );
        assert!(!detect_updates(&current, &saved).has_updates());
    }

    #[test]
    fn test_update_set_helpers() {
        let mut set = UpdateSet::default();
        set.insert("BTC", UpdateKind::NewPost);
        set.insert("ETH", UpdateKind::NewNote);
        assert_eq!(set.symbols(), vec!["BTC", "ETH"]);
        assert!(!set.notes_only());

        set.remove("BTC");
        assert!(set.notes_only());
        set.clear();
        assert!(!set.has_updates());
    }
}
