//! Request and response values passed through the cache engine.

use url::Url;

use crate::error::Result;

/// What kind of resource a request is for, as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Script,
    Style,
    Font,
    Image,
    /// `fetch()` calls and anything else without a destination
    #[default]
    Empty,
}

impl Destination {
    /// Scripts, styles and fonts carry content-hashed file names.
    pub fn is_hashed_asset(self) -> bool {
        matches!(self, Self::Script | Self::Style | Self::Font)
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    pub fn new(url: Url, destination: Destination) -> Self {
        Self { url, destination }
    }

    /// Parse `url` as a plain `fetch()` request.
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(url)?, Destination::Empty))
    }

    /// Key the response is stored under: the URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    /// Cache key with the query string dropped as well.
    pub fn cache_key_ignoring_search(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.set_query(None);
        url.to_string()
    }
}

/// A response, either live from the network or replayed from a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// Synthesized placeholder returned when neither network nor cache can answer.
    pub fn offline(message: &str) -> Self {
        Self::new(
            503,
            Some("text/plain;charset=UTF-8".to_string()),
            message.as_bytes(),
        )
    }

    /// 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
