//! Client-persisted record of what has been seen, per symbol.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Index, Symbol};

/// Last seen post date and note time for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMark {
    #[serde(default)]
    pub date: String,
    #[serde(rename = "noteTime", default)]
    pub note_time: String,
}

impl SymbolMark {
    /// Snapshot of a symbol's newest content.
    pub fn of(symbol: &Symbol) -> Self {
        Self {
            date: symbol.latest_post_date().to_string(),
            note_time: symbol.latest_note_time().to_string(),
        }
    }

    /// Move each field forward to `other`'s value when it is greater.
    ///
    /// Fields compare as ISO-8601 strings and never move backwards.
    pub fn advance(&mut self, other: &SymbolMark) {
        if other.date > self.date {
            self.date = other.date.clone();
        }
        if other.note_time > self.note_time {
            self.note_time = other.note_time.clone();
        }
    }
}

/// Persisted read state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadState {
    #[serde(default)]
    pub last_checked: String,
    #[serde(default, deserialize_with = "drop_legacy_marks")]
    pub symbols: BTreeMap<String, SymbolMark>,
}

impl ReadState {
    /// Baseline covering every symbol of `index`.
    pub fn baseline(index: &Index, now: &str) -> Self {
        Self {
            last_checked: now.to_string(),
            symbols: index
                .symbols
                .iter()
                .map(|(code, symbol)| (code.clone(), SymbolMark::of(symbol)))
                .collect(),
        }
    }

    pub fn mark(&self, code: &str) -> Option<&SymbolMark> {
        self.symbols.get(code)
    }

    /// Advance one symbol's entry, creating it when missing.
    pub fn advance(&mut self, code: &str, seen: &SymbolMark) {
        self.symbols
            .entry(code.to_string())
            .or_default()
            .advance(seen);
    }

    /// Advance every symbol of `index`.
    pub fn advance_all(&mut self, index: &Index) {
        for (code, symbol) in &index.symbols {
            self.advance(code, &SymbolMark::of(symbol));
        }
    }
}

/// Older clients stored a bare date string per symbol; those entries are skipped.
fn drop_legacy_marks<'de, D>(deserializer: D) -> Result<BTreeMap<String, SymbolMark>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StoredMark {
        Current(SymbolMark),
        Legacy(serde_json::Value),
    }

    let raw = BTreeMap::<String, StoredMark>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(code, mark)| match mark {
            StoredMark::Current(mark) => Some((code, mark)),
            StoredMark::Legacy(_) => None,
        })
        .collect())
}
