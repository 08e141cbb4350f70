// src/services/scanner.rs

//! Content tree scanner.
//!
//! Walks `root/{symbol}/` and turns every entry into a [`Post`]:
//!
//! ```text
//! predictions/
//! └── BTC/
//!     ├── meta.json                 # optional symbol metadata
//!     ├── 2026-02-16/               # directory layout
//!     │   ├── post.md
//!     │   ├── review.md             # optional
//!     │   └── notes/
//!     │       └── 2026-02-16T14-30.md
//!     └── 2026-02-01.md             # flat legacy layout
//! ```
//!
//! Only a missing root is fatal. Everything else degrades to a warning
//! plus a default or a skipped entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Note, Post, Review, SymbolMeta};
use crate::services::header::Document;

const META_FILE: &str = "meta.json";
const POST_FILE: &str = "post.md";
const REVIEW_FILE: &str = "review.md";
const NOTES_DIR: &str = "notes";
const REVIEW_TYPE: &str = "review";

/// A recoverable problem found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

impl ScanWarning {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        let warning = Self {
            path: path.to_path_buf(),
            message: message.into(),
        };
        log::warn!("{}: {}", warning.path.display(), warning.message);
        warning
    }
}

/// One symbol directory, unsorted.
#[derive(Debug, Clone)]
pub struct ScannedSymbol {
    pub code: String,
    pub meta: SymbolMeta,
    pub posts: Vec<Post>,
}

/// Everything found under the content root.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub symbols: Vec<ScannedSymbol>,
    pub warnings: Vec<ScanWarning>,
}

/// The two supported entry layouts, resolved once per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PostSource {
    /// `{folder}/post.md` with optional review and notes.
    Directory { folder: String, dir: PathBuf },
    /// `{folder}.md` directly under the symbol.
    Flat { folder: String, file: PathBuf },
}

impl PostSource {
    fn from_entry(name: &str, path: PathBuf, is_dir: bool) -> Option<Self> {
        if name == META_FILE {
            return None;
        }
        if is_dir {
            return Some(Self::Directory {
                folder: name.to_string(),
                dir: path,
            });
        }
        name.strip_suffix(".md").map(|stem| Self::Flat {
            folder: stem.to_string(),
            file: path,
        })
    }
}

/// Scanner for a content tree.
pub struct ContentScanner {
    root: PathBuf,
    path_prefix: String,
}

impl ContentScanner {
    /// Create a scanner; published paths are prefixed with the root's name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path_prefix = root
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .unwrap_or("predictions")
            .to_string();
        Self { root, path_prefix }
    }

    /// Override the prefix used in published document paths.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Scan every symbol under the root.
    pub fn scan(&self) -> Result<ScanReport> {
        if !self.root.is_dir() {
            return Err(AppError::ContentRootMissing(self.root.clone()));
        }

        let mut report = ScanReport::default();
        for (code, dir) in sorted_entries(&self.root)?
            .into_iter()
            .filter(|(_, path)| path.is_dir())
        {
            let symbol = self.scan_symbol(&code, &dir, &mut report.warnings);
            log::debug!("Scanned {} ({} posts)", code, symbol.posts.len());
            report.symbols.push(symbol);
        }

        Ok(report)
    }

    fn scan_symbol(&self, code: &str, dir: &Path, warnings: &mut Vec<ScanWarning>) -> ScannedSymbol {
        let meta = load_meta(code, &dir.join(META_FILE), warnings);

        let entries = match sorted_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warnings.push(ScanWarning::new(dir, format!("cannot list entries: {e}")));
                Vec::new()
            }
        };

        let posts = entries
            .into_iter()
            .filter_map(|(name, path)| {
                let is_dir = path.is_dir();
                PostSource::from_entry(&name, path, is_dir)
            })
            .filter_map(|source| self.load_post(code, source, warnings))
            .collect();

        ScannedSymbol {
            code: code.to_string(),
            meta,
            posts,
        }
    }

    fn load_post(
        &self,
        code: &str,
        source: PostSource,
        warnings: &mut Vec<ScanWarning>,
    ) -> Option<Post> {
        let prefix = &self.path_prefix;
        match source {
            PostSource::Directory { folder, dir } => {
                let file = dir.join(POST_FILE);
                if !file.is_file() {
                    // In-progress content
                    return None;
                }
                let doc = read_document(&file, warnings)?;
                let base = format!("{prefix}/{code}/{folder}");
                let notes = self.load_notes(&dir.join(NOTES_DIR), &base, warnings);
                let review = load_review(&dir.join(REVIEW_FILE), &base, warnings);
                Some(build_post(doc, folder, format!("{base}/{POST_FILE}"), notes, review))
            }
            PostSource::Flat { folder, file } => {
                let doc = read_document(&file, warnings)?;
                let path = format!("{prefix}/{code}/{folder}.md");
                Some(build_post(doc, folder, path, Vec::new(), None))
            }
        }
    }

    fn load_notes(&self, dir: &Path, base: &str, warnings: &mut Vec<ScanWarning>) -> Vec<Note> {
        if !dir.is_dir() {
            return Vec::new();
        }

        let entries = match sorted_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warnings.push(ScanWarning::new(dir, format!("cannot list notes: {e}")));
                return Vec::new();
            }
        };

        // Fixed-width timestamps make filename order chronological
        entries
            .into_iter()
            .filter(|(_, path)| path.is_file())
            .filter_map(|(name, path)| {
                let stem = name.strip_suffix(".md")?;
                let doc = read_document(&path, warnings)?;
                Some(Note {
                    time: note_time(stem),
                    title: doc.title().unwrap_or_default(),
                    path: format!("{base}/{NOTES_DIR}/{name}"),
                })
            })
            .collect()
    }
}

fn build_post(
    doc: Document,
    folder: String,
    path: String,
    notes: Vec<Note>,
    review: Option<Review>,
) -> Post {
    let title = doc.title().unwrap_or_else(|| folder.clone());
    Post {
        date: doc.text("date").unwrap_or_else(|| folder.clone()),
        title,
        subtitle: doc.text("subtitle"),
        summary: doc.text("summary"),
        format: "md".to_string(),
        path,
        tags: doc.list("tags"),
        notes,
        review,
        folder,
    }
}

/// `2026-02-16T14-30` becomes `2026-02-16T14:30`.
pub fn note_time(stem: &str) -> String {
    match stem.rsplit_once('-') {
        Some((head, minute))
            if head.contains('T')
                && minute.len() == 2
                && minute.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{head}:{minute}")
        }
        _ => stem.to_string(),
    }
}

fn load_meta(code: &str, path: &Path, warnings: &mut Vec<ScanWarning>) -> SymbolMeta {
    let mut meta = SymbolMeta::defaults_for(code);
    if !path.is_file() {
        return meta;
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(Value::Object(fields)) => {
            let pick = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
            if let Some(name) = pick("name") {
                meta.name = name;
            }
            if let Some(description) = pick("description") {
                meta.description = description;
            }
            if let Some(icon) = pick("icon") {
                meta.icon = icon;
            }
        }
        Ok(_) => warnings.push(ScanWarning::new(path, "not a JSON object, using defaults")),
        Err(e) => warnings.push(ScanWarning::new(path, format!("parse failed, using defaults: {e}"))),
    }

    meta
}

fn load_review(path: &Path, base: &str, warnings: &mut Vec<ScanWarning>) -> Option<Review> {
    if !path.is_file() {
        return None;
    }
    let doc = read_document(path, warnings)?;

    if doc.text("type").as_deref() != Some(REVIEW_TYPE) {
        return None;
    }
    let accuracy = doc.number("accuracy")?;

    Some(Review {
        accuracy,
        verdict: doc.text("verdict").unwrap_or_default(),
        path: format!("{base}/{REVIEW_FILE}"),
    })
}

fn read_document(path: &Path, warnings: &mut Vec<ScanWarning>) -> Option<Document> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let doc = Document::parse(&raw);
            if let Some(issue) = &doc.issue {
                warnings.push(ScanWarning::new(path, format!("{issue}, treating as plain body")));
            }
            Some(doc)
        }
        Err(e) => {
            warnings.push(ScanWarning::new(path, format!("read failed, skipping: {e}")));
            None
        }
    }
}

/// Directory entries as `(name, path)`, sorted by name; hidden entries skipped.
fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        entries.push((name, entry.path()));
    }
    entries.sort();
    Ok(entries)
}
