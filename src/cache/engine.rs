// src/cache/engine.rs

//! Request interception with versioned cache namespaces.
//!
//! The engine moves through `Installing → Activating → Active`. Only an
//! active engine handles requests; before that every request is left to
//! the network, the same as a page not yet claimed by a new worker.

use std::sync::Arc;

use futures::future::join_all;
use url::Url;

use crate::cache::{CacheStore, Fetcher, Request, RequestClass, Response, Scope, classify};
use crate::error::{AppError, Result};
use crate::models::Config;

/// Content class a namespace holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Static,
    Api,
    Content,
}

/// One versioned, class-scoped cache partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNamespace {
    pub name: String,
    pub version: String,
    pub class: ContentClass,
}

impl CacheNamespace {
    pub fn new(prefix: &str, version: &str, class: ContentClass) -> Self {
        Self {
            name: format!("{prefix}-v{version}"),
            version: version.to_string(),
            class,
        }
    }
}

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Installing,
    Activating,
    Active,
}

/// Namespaces removed during activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
}

/// Request interceptor applying per-class freshness strategies.
pub struct CacheEngine {
    state: Lifecycle,
    scope: Scope,
    static_ns: CacheNamespace,
    api_ns: CacheNamespace,
    content_ns: CacheNamespace,
    offline_message: String,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl CacheEngine {
    /// Create an engine in the `Installing` state.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let origin = Url::parse(&config.site.base_url)?;
        let cache = &config.cache;

        Ok(Self {
            state: Lifecycle::Installing,
            scope: Scope::new(origin, config.site.content_host.clone()),
            static_ns: CacheNamespace::new(
                &cache.static_prefix,
                &cache.version,
                ContentClass::Static,
            ),
            api_ns: CacheNamespace::new(&cache.api_prefix, &cache.version, ContentClass::Api),
            content_ns: CacheNamespace::new(
                &cache.content_prefix,
                &cache.version,
                ContentClass::Content,
            ),
            offline_message: cache.offline_message.clone(),
            store,
            fetcher,
        })
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Namespaces of the current version.
    pub fn whitelist(&self) -> [&CacheNamespace; 3] {
        [&self.static_ns, &self.api_ns, &self.content_ns]
    }

    /// Create this version's namespaces and move on without waiting for
    /// any previous engine to finish.
    pub async fn install(&mut self) -> Result<Lifecycle> {
        if self.state != Lifecycle::Installing {
            return Ok(self.state);
        }
        for namespace in self.whitelist() {
            self.store.open(&namespace.name).await?;
        }
        log::debug!("Cache engine installed, skipping wait");
        self.state = Lifecycle::Activating;
        Ok(self.state)
    }

    /// Delete every namespace outside the whitelist, then claim clients.
    pub async fn activate(&mut self) -> Result<ActivationReport> {
        match self.state {
            Lifecycle::Active => return Ok(ActivationReport::default()),
            Lifecycle::Installing => {
                self.install().await?;
            }
            Lifecycle::Activating => {}
        }

        let keep: Vec<&str> = self.whitelist().iter().map(|ns| ns.name.as_str()).collect();
        let stale: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|name| !keep.contains(&name.as_str()))
            .collect();

        let results = join_all(stale.iter().map(|name| self.store.delete(name))).await;
        let mut deleted = Vec::new();
        for (name, result) in stale.into_iter().zip(results) {
            if result? {
                log::info!("Deleted stale cache namespace {name}");
                deleted.push(name);
            }
        }

        self.state = Lifecycle::Active;
        log::debug!("Cache engine active, clients claimed");
        Ok(ActivationReport { deleted })
    }

    /// Install and activate in one go.
    pub async fn start(&mut self) -> Result<ActivationReport> {
        self.install().await?;
        self.activate().await
    }

    /// Handle one request.
    ///
    /// `Ok(None)` means the request is not intercepted and should go
    /// straight to the network. The only error is a failed index fetch with
    /// no cached copy to fall back on.
    pub async fn handle(&self, request: &Request) -> Result<Option<Response>> {
        if self.state != Lifecycle::Active {
            return Ok(None);
        }

        let Some(class) = classify(request, &self.scope) else {
            return Ok(None);
        };
        log::debug!("{:?} {}", class, request.url);

        let response = match class {
            RequestClass::IndexDocument => self.network_only(request).await?,
            RequestClass::RemoteMarkdown => self.network_first(request, &self.content_ns).await,
            RequestClass::Document => self.network_first(request, &self.static_ns).await,
            RequestClass::StaticAsset => self.cache_first(request, &self.static_ns).await,
        };
        Ok(Some(response))
    }

    /// Always go to the network and never persist; a cached copy is only
    /// consulted when the network is unreachable.
    async fn network_only(&self, request: &Request) -> Result<Response> {
        let err = match self.fetcher.fetch(request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        if let Some(cached) = self.lookup(&request.cache_key()).await {
            return Ok(cached);
        }
        if let Some(cached) = self.lookup(&request.cache_key_ignoring_search()).await {
            return Ok(cached);
        }

        log::warn!("Index fetch failed with no cached copy: {err}");
        Err(match err {
            AppError::Fetch { .. } => err,
            other => AppError::fetch(request.url.as_str(), other),
        })
    }

    async fn network_first(&self, request: &Request, namespace: &CacheNamespace) -> Response {
        let key = request.cache_key();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.persist(namespace, &key, &response).await;
                response
            }
            Err(e) => {
                log::debug!("Network failed for {key}: {e}");
                match self.lookup(&key).await {
                    Some(cached) => cached,
                    None => Response::offline(&self.offline_message),
                }
            }
        }
    }

    async fn cache_first(&self, request: &Request, namespace: &CacheNamespace) -> Response {
        let key = request.cache_key();
        if let Some(cached) = self.lookup(&key).await {
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.persist(namespace, &key, &response).await;
                response
            }
            Err(e) => {
                log::debug!("Network failed for {key}: {e}");
                Response::offline(&self.offline_message)
            }
        }
    }

    /// Store a copy of a successful response; failures only cost the copy.
    async fn persist(&self, namespace: &CacheNamespace, key: &str, response: &Response) {
        if !response.ok() {
            return;
        }
        if let Err(e) = self.store.put(&namespace.name, key, response.clone()).await {
            log::warn!("Failed to cache {key} in {}: {e}", namespace.name);
        }
    }

    async fn lookup(&self, key: &str) -> Option<Response> {
        self.store.match_any(key).await.unwrap_or_else(|e| {
            log::warn!("Cache lookup failed for {key}: {e}");
            None
        })
    }
}
