//! Service layer for reading the content tree.
//!
//! This module contains the business logic for:
//! - Document header parsing (`Document`)
//! - Content tree scanning (`ContentScanner`)

pub mod header;
mod scanner;

pub use header::{Document, HeaderIssue};
pub use scanner::{ContentScanner, ScanReport, ScanWarning, ScannedSymbol, note_time};
