//! Request classification.
//!
//! Rules are evaluated in a fixed priority order; the first match decides
//! the strategy. A request matching none of them is left to the network.

use url::Url;

use crate::cache::{Destination, Request};
use crate::utils::same_origin;

/// Strategy bucket of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// The canonical index document: network only, cached copy as last resort
    IndexDocument,
    /// Markdown on the content host: network first
    RemoteMarkdown,
    /// Same-origin page navigation: network first
    Document,
    /// Same-origin script, style or font: cache first
    StaticAsset,
}

/// Where the application is served from.
#[derive(Debug, Clone)]
pub struct Scope {
    pub origin: Url,
    pub content_host: String,
}

impl Scope {
    pub fn new(origin: Url, content_host: impl Into<String>) -> Self {
        Self {
            origin,
            content_host: content_host.into(),
        }
    }
}

/// Classify `request`, or return `None` to leave it unhandled.
pub fn classify(request: &Request, scope: &Scope) -> Option<RequestClass> {
    let url = &request.url;

    if url.path().ends_with("/index.json") || url.as_str().contains("index.json") {
        return Some(RequestClass::IndexDocument);
    }

    if url.host_str() == Some(scope.content_host.as_str()) && url.path().ends_with(".md") {
        return Some(RequestClass::RemoteMarkdown);
    }

    if !same_origin(url, &scope.origin) {
        return None;
    }

    match request.destination {
        Destination::Document => Some(RequestClass::Document),
        d if d.is_hashed_asset() => Some(RequestClass::StaticAsset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new(
            Url::parse("https://example.github.io/").unwrap(),
            "raw.githubusercontent.com",
        )
    }

    fn request(url: &str, destination: Destination) -> Request {
        Request::new(Url::parse(url).unwrap(), destination)
    }

    #[test]
    fn test_index_takes_priority() {
        let req = request(
            "https://example.github.io/site/index.json?t=1",
            Destination::Empty,
        );
        assert_eq!(classify(&req, &scope()), Some(RequestClass::IndexDocument));

        // Even a document-destination request for the index stays an index request
        let req = request("https://example.github.io/index.json", Destination::Document);
        assert_eq!(classify(&req, &scope()), Some(RequestClass::IndexDocument));
    }

    #[test]
    fn test_remote_markdown() {
        let req = request(
            "https://raw.githubusercontent.com/o/r/main/predictions/BTC/2026-02-16/post.md",
            Destination::Empty,
        );
        assert_eq!(classify(&req, &scope()), Some(RequestClass::RemoteMarkdown));

        let req = request(
            "https://raw.githubusercontent.com/o/r/main/meta.json",
            Destination::Empty,
        );
        assert_eq!(classify(&req, &scope()), None);
    }

    #[test]
    fn test_same_origin_only() {
        let doc = request("https://example.github.io/site/", Destination::Document);
        assert_eq!(classify(&doc, &scope()), Some(RequestClass::Document));

        let js = request("https://example.github.io/assets/app-3f2a.js", Destination::Script);
        assert_eq!(classify(&js, &scope()), Some(RequestClass::StaticAsset));

        let font = request("https://example.github.io/assets/x.woff2", Destination::Font);
        assert_eq!(classify(&font, &scope()), Some(RequestClass::StaticAsset));

        let foreign = request("https://cdn.example.com/app.js", Destination::Script);
        assert_eq!(classify(&foreign, &scope()), None);

        let image = request("https://example.github.io/logo.png", Destination::Image);
        assert_eq!(classify(&image, &scope()), None);
    }
}
