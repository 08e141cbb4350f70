//! Atom feed generation.
//!
//! A pure transform of a finished [`Index`]: the newest posts across all
//! symbols become feed entries. The channel `updated` value comes from the
//! newest entry rather than the index stamp, so an unchanged tree yields a
//! byte-identical feed.

use chrono::{DateTime, NaiveDate};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::models::{Config, Index, LatestPost};

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const EPOCH: &str = "1970-01-01T00:00:00Z";

/// Feed writer configured for one site.
#[derive(Debug, Clone)]
pub struct FeedGenerator {
    title: String,
    subtitle: String,
    author: String,
    site_url: String,
    feed_file: String,
    limit: usize,
}

impl FeedGenerator {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.feed.title.clone(),
            subtitle: config.feed.subtitle.clone(),
            author: config.feed.author.clone(),
            site_url: config.site.base_url.trim_end_matches('/').to_string(),
            feed_file: config.paths.feed_file.clone(),
            limit: config.feed.limit,
        }
    }

    /// Deterministic link to a post page.
    pub fn post_link(&self, code: &str, folder: &str) -> String {
        format!(
            "{}/#/{}/{}",
            self.site_url,
            utf8_percent_encode(code, COMPONENT),
            utf8_percent_encode(folder, COMPONENT)
        )
    }

    /// Render the feed document.
    pub fn generate(&self, index: &Index) -> String {
        let entries = index.latest_posts(self.limit);
        let updated = entries
            .first()
            .map(|e| entry_updated(&e.post.date))
            .unwrap_or_else(|| EPOCH.to_string());

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        xml.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        xml.push_str(&format!("  <title>{}</title>\n", escape_xml(&self.title)));
        xml.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&self.subtitle)
        ));
        let site = escape_xml(&self.site_url);
        xml.push_str(&format!("  <link href=\"{site}/\"/>\n"));
        xml.push_str(&format!(
            "  <link rel=\"self\" href=\"{site}/{}\"/>\n",
            escape_xml(&self.feed_file)
        ));
        xml.push_str(&format!("  <id>{site}/</id>\n"));
        xml.push_str(&format!("  <updated>{}</updated>\n", escape_xml(&updated)));
        xml.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&self.author)
        ));

        for entry in &entries {
            self.write_entry(&mut xml, entry);
        }

        xml.push_str("</feed>\n");
        xml
    }

    fn write_entry(&self, xml: &mut String, entry: &LatestPost<'_>) {
        let post = entry.post;
        let link = escape_xml(&self.post_link(entry.code, &post.folder));
        let title = format!("[{}] {}", entry.code, post.title);
        let summary = post.summary.as_deref().unwrap_or(&post.title);

        xml.push_str("  <entry>\n");
        xml.push_str(&format!("    <title>{}</title>\n", escape_xml(&title)));
        xml.push_str(&format!("    <link href=\"{link}\"/>\n"));
        xml.push_str(&format!("    <id>{link}</id>\n"));
        xml.push_str(&format!(
            "    <updated>{}</updated>\n",
            escape_xml(&entry_updated(&post.date))
        ));
        xml.push_str(&format!(
            "    <category term=\"{}\" label=\"{}\"/>\n",
            escape_xml(entry.code),
            escape_xml(&entry.symbol.name)
        ));
        xml.push_str(&format!("    <summary>{}</summary>\n", escape_xml(summary)));
        xml.push_str(&format!(
            "    <author><name>{}</name></author>\n",
            escape_xml(&self.author)
        ));
        xml.push_str("  </entry>\n");
    }
}

/// RFC 3339 timestamp for a post date; unparsable dates pass through.
fn entry_updated(date: &str) -> String {
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return format!("{}T00:00:00Z", day.format("%Y-%m-%d"));
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(date) {
        return stamp.to_rfc3339();
    }
    date.to_string()
}

/// Escape the five XML-reserved characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the feed for `index` using `config`.
pub fn generate_feed(config: &Config, index: &Index) -> String {
    FeedGenerator::from_config(config).generate(index)
}
