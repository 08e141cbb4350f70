//! Network access for the cache engine.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::cache::{Request, Response};
use crate::error::{AppError, Result};

/// Performs the network leg of a request.
///
/// `Err` means the network could not be reached at all; any HTTP status,
/// including 4xx and 5xx, comes back as `Ok`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let url = request.url.as_str();
        let response = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        log::debug!("GET {url} -> {status}");
        Ok(Response::new(status, content_type, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new());
        let request = Request::get(&format!("{}/index.json", server.uri())).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.text(), "{}");
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new());
        let request = Request::get(&format!("{}/missing.md", server.uri())).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.ok());
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let fetcher = HttpFetcher::new(reqwest::Client::new());
        let request = Request::get("http://127.0.0.1:9/index.json").unwrap();
        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }
}
