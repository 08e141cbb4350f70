// src/services/header.rs

//! Document header parsing.
//!
//! A document may open with a delimited block of `key: value` lines:
//!
//! ```text
//! ---
//! title: "BTC weekly outlook"
//! tags: ["btc", "weekly"]
//! ---
//! # Body starts here
//! ```
//!
//! Quoted scalars lose their quotes, bracketed values are parsed as JSON
//! array literals (falling back to the raw text), everything else stays a
//! string. A missing block yields no attributes and the whole file as body.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const DELIMITER: &str = "---";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)\r?$").expect("valid heading pattern"));

/// Why a header block was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderIssue {
    /// Opening delimiter found but never closed.
    Unterminated,
}

impl std::fmt::Display for HeaderIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderIssue::Unterminated => write!(f, "header block is never closed"),
        }
    }
}

/// A parsed document: header attributes plus free-form body.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub attributes: BTreeMap<String, Value>,
    pub body: String,
    /// Set when a header was present but unusable.
    pub issue: Option<HeaderIssue>,
}

impl Document {
    /// Split `raw` into header attributes and body.
    pub fn parse(raw: &str) -> Self {
        let Some(rest) = raw
            .strip_prefix("---\n")
            .or_else(|| raw.strip_prefix("---\r\n"))
        else {
            return Self::plain(raw, None);
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end_matches(['\r', '\n']) == DELIMITER {
                return Self {
                    attributes: parse_block(&rest[..offset]),
                    body: rest[offset + line.len()..].to_string(),
                    issue: None,
                };
            }
            offset += line.len();
        }

        Self::plain(raw, Some(HeaderIssue::Unterminated))
    }

    fn plain(raw: &str, issue: Option<HeaderIssue>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            body: raw.to_string(),
            issue,
        }
    }

    /// Non-empty scalar attribute rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Attribute interpreted as a number, from either a literal or a numeric string.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Attribute interpreted as a list of strings without duplicates.
    ///
    /// A plain scalar counts as a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        let items: Vec<String> = match self.attributes.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };

        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        unique
    }

    /// Title from the header, else the first level-1 heading of the body.
    pub fn title(&self) -> Option<String> {
        self.text("title").or_else(|| first_heading(&self.body))
    }
}

/// First `# Heading` line of a Markdown body.
pub fn first_heading(body: &str) -> Option<String> {
    HEADING
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn parse_block(block: &str) -> BTreeMap<String, Value> {
    let mut attributes = BTreeMap::new();

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };

        let key = key.trim();
        let value = strip_quotes(value.trim());
        attributes.insert(key.to_string(), parse_value(value));
    }

    attributes
}

fn strip_quotes(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_value(value: &str) -> Value {
    if value.starts_with('[') && value.ends_with(']') {
        if let Ok(parsed @ Value::Array(_)) = serde_json::from_str::<Value>(value) {
            return parsed;
        }
    }
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quoted_scalar() {
        let doc = Document::parse("---\ntitle: \"hello\"\nname: 'single'\n---\nbody\n");
        assert_eq!(doc.text("title").as_deref(), Some("hello"));
        assert_eq!(doc.text("name").as_deref(), Some("single"));
        assert_eq!(doc.body, "body\n");
        assert!(doc.issue.is_none());
    }

    #[test]
    fn test_bracketed_array() {
        let doc = Document::parse("---\ntags: [\"a\",\"b\"]\n---\n");
        assert_eq!(doc.list("tags"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_malformed_array_falls_back_to_raw() {
        let doc = Document::parse("---\ntags: [a, b\n---\n");
        assert_eq!(doc.attributes["tags"], Value::String("[a, b".into()));

        let doc = Document::parse("---\ntags: [a, b]\n---\n");
        assert_eq!(doc.attributes["tags"], Value::String("[a, b]".into()));
    }

    #[test]
    fn test_absent_header_is_plain_body() {
        let raw = "# Just a heading\n\ntext";
        let doc = Document::parse(raw);
        assert!(doc.attributes.is_empty());
        assert_eq!(doc.body, raw);
        assert!(doc.issue.is_none());
    }

    #[test]
    fn test_unterminated_header() {
        let raw = "---\ntitle: oops\nno closing line";
        let doc = Document::parse(raw);
        assert!(doc.attributes.is_empty());
        assert_eq!(doc.body, raw);
        assert_eq!(doc.issue, Some(HeaderIssue::Unterminated));
    }

    #[test]
    fn test_crlf_header() {
        let doc = Document::parse("---\r\ntitle: win\r\n---\r\nbody");
        assert_eq!(doc.text("title").as_deref(), Some("win"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_comments_and_colons() {
        let doc = Document::parse("---\n# comment\nnot a pair\nurl: https://x.io/a\n---\n");
        assert_eq!(doc.attributes.len(), 1);
        assert_eq!(doc.text("url").as_deref(), Some("https://x.io/a"));
    }

    #[test]
    fn test_title_resolution() {
        let doc = Document::parse("---\nsummary: s\n---\nintro\n# First\n# Second\n");
        assert_eq!(doc.title().as_deref(), Some("First"));

        let doc = Document::parse("---\ntitle: Header\n---\n# Body\n");
        assert_eq!(doc.title().as_deref(), Some("Header"));

        let doc = Document::parse("## Not level one\n");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_number_accessor() {
        let doc = Document::parse("---\naccuracy: 85.5\nbad: high\n---\n");
        assert_eq!(doc.number("accuracy"), Some(85.5));
        assert_eq!(doc.number("bad"), None);
        assert_eq!(doc.number("missing"), None);
    }

    #[test]
    fn test_list_deduplicates() {
        let doc = Document::parse("---\ntags: [\"btc\", \"btc\", \"macro\"]\n---\n");
        assert_eq!(doc.list("tags"), vec!["btc".to_string(), "macro".to_string()]);
    }
}
