//! Utility functions and helpers.

pub mod http;
pub mod log;

use url::Url;

/// Join a path onto a site root, tolerating a trailing slash on either side.
pub fn join_site(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
