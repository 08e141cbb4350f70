// src/pipeline/build.rs

//! Build pipeline: content tree → index → feed.

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{FeedGenerator, build_index};
use crate::services::ContentScanner;
use crate::storage::SiteStorage;
use crate::utils::log;

/// Outcome of one build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub last_updated: String,
    pub symbol_count: usize,
    pub post_count: usize,
    pub note_count: usize,
    pub feed_entries: usize,
    pub warning_count: usize,
}

/// Run the full build and write both outputs through `storage`.
///
/// A missing content root aborts before anything is written.
pub async fn run_build(config: &Config, storage: &dyn SiteStorage) -> Result<BuildSummary> {
    log::header("Building prediction index");

    log::step(1, 3, "Scanning content tree");
    let report = ContentScanner::new(&config.paths.content_root).scan()?;
    let warning_count = report.warnings.len();
    for warning in &report.warnings {
        log::sub_item(&format!("{}: {}", warning.path.display(), warning.message));
    }

    log::step(2, 3, "Writing index");
    let index = build_index(report);
    storage.write_index(&index).await?;

    log::step(3, 3, "Writing feed");
    let generator = FeedGenerator::from_config(config);
    let feed = generator.generate(&index);
    storage.write_feed(&feed).await?;

    let summary = BuildSummary {
        last_updated: index.last_updated.clone(),
        symbol_count: index.symbols.len(),
        post_count: index.post_count(),
        note_count: index.note_count(),
        feed_entries: index.latest_posts(config.feed.limit).len(),
        warning_count,
    };

    log::summary(
        "Build",
        &[
            ("Symbols", summary.symbol_count.to_string()),
            ("Posts", summary.post_count.to_string()),
            ("Notes", summary.note_count.to_string()),
            ("Feed entries", summary.feed_entries.to_string()),
            ("Warnings", summary.warning_count.to_string()),
        ],
    );
    log::success(&format!(
        "Generated index: {} symbols, {} notes",
        summary.symbol_count, summary.note_count
    ));

    Ok(summary)
}
