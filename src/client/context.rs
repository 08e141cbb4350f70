// src/client/context.rs

//! Application context shared by every client component.
//!
//! Constructed once and passed by reference (or `Arc`) to whatever needs
//! the index, the read state or notification delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::cache::{CacheEngine, Fetcher, HttpFetcher, MemoryCacheStore, Request, Response};
use crate::error::{AppError, Result};
use crate::models::{Config, Index, ReadState, SymbolMark};
use crate::notify::{
    DispatchOutcome, NotificationDispatcher, NotificationSink, Permission, PermissionPrompt,
};
use crate::pipeline::{UpdateSet, check_for_updates, now_iso};
use crate::storage::ReadStateStore;
use crate::utils::{http, join_site};

/// Result of one index load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLoad {
    /// A different document was fetched and now backs the context
    Replaced,
    /// The fetched document matched the one in memory
    Unchanged,
    /// A later load failed; the previous index stays in place
    KeptPrevious,
}

/// Explicit client state: config, transport, persisted read state and
/// the in-memory index with its unread updates.
pub struct AppContext {
    config: Config,
    engine: CacheEngine,
    fetcher: Arc<dyn Fetcher>,
    read_state: Arc<dyn ReadStateStore>,
    sink: Arc<dyn NotificationSink>,
    dispatcher: Mutex<NotificationDispatcher>,
    index: RwLock<Option<Index>>,
    updates: RwLock<UpdateSet>,
    initialized: AtomicBool,
}

impl AppContext {
    /// Assemble a context from an already started engine.
    pub fn new(
        config: Config,
        engine: CacheEngine,
        fetcher: Arc<dyn Fetcher>,
        read_state: Arc<dyn ReadStateStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(config.notify.clone());
        Self {
            config,
            engine,
            fetcher,
            read_state,
            sink,
            dispatcher: Mutex::new(dispatcher),
            index: RwLock::new(None),
            updates: RwLock::new(UpdateSet::default()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Context over HTTP with an in-memory cache, engine started.
    pub async fn connect(
        config: Config,
        read_state: Arc<dyn ReadStateStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let client = http::create_client(&config.client)?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client));
        let mut engine =
            CacheEngine::from_config(&config, Arc::new(MemoryCacheStore::new()), fetcher.clone())?;
        engine.start().await?;
        Ok(Self::new(config, engine, fetcher, read_state, sink))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a request through the engine, or straight to the network
    /// when the engine leaves it alone.
    pub async fn fetch(&self, request: &Request) -> Result<Response> {
        match self.engine.handle(request).await? {
            Some(response) => Ok(response),
            None => self.fetcher.fetch(request).await,
        }
    }

    async fn fetch_ok(&self, url: &str) -> Result<Response> {
        let response = self.fetch(&Request::get(url)?).await?;
        if !response.ok() {
            return Err(AppError::fetch(url, format!("status {}", response.status)));
        }
        Ok(response)
    }

    /// Fetch the index with a cache-busting query.
    ///
    /// Errors surface only while no load has succeeded yet; later failures
    /// are logged and the previous index is kept.
    pub async fn load_index(&self) -> Result<IndexLoad> {
        let first_load = !self.initialized.load(Ordering::SeqCst);

        match self.fetch_index().await {
            Ok(fetched) => {
                self.initialized.store(true, Ordering::SeqCst);
                let mut current = self.index.write().await;
                if current.as_ref() == Some(&fetched) {
                    return Ok(IndexLoad::Unchanged);
                }
                log::debug!("Index replaced, lastUpdated {}", fetched.last_updated);
                *current = Some(fetched);
                Ok(IndexLoad::Replaced)
            }
            Err(e) if first_load => Err(e),
            Err(e) => {
                log::warn!("Index refresh failed, keeping previous: {e}");
                Ok(IndexLoad::KeptPrevious)
            }
        }
    }

    async fn fetch_index(&self) -> Result<Index> {
        let url = format!(
            "{}?t={}",
            join_site(&self.config.site.base_url, &self.config.paths.index_file),
            Utc::now().timestamp_millis()
        );
        let response = self.fetch_ok(&url).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Fetch a Markdown document relative to the site root.
    pub async fn load_markdown(&self, path: &str) -> Result<String> {
        let url = join_site(&self.config.site.base_url, path);
        Ok(self.fetch_ok(&url).await?.text())
    }

    /// Install an index directly, e.g. one read from disk.
    pub async fn set_index(&self, index: Index) {
        self.initialized.store(true, Ordering::SeqCst);
        *self.index.write().await = Some(index);
    }

    /// Snapshot of the current index.
    pub async fn index(&self) -> Option<Index> {
        self.index.read().await.clone()
    }

    /// Compare the current index with the saved read state.
    ///
    /// With no saved state the current index becomes the baseline and
    /// nothing is reported.
    pub async fn check_for_updates(&self) -> Result<UpdateSet> {
        let Some(index) = self.index().await else {
            return Ok(UpdateSet::default());
        };

        let saved = self.read_state.load_read_state().await?;
        let result = check_for_updates(&index, saved.as_ref(), &now_iso());
        if let Some(baseline) = &result.baseline {
            log::info!("No read state yet, saving baseline of {} symbols", baseline.symbols.len());
            self.read_state.save_read_state(baseline).await?;
        }

        *self.updates.write().await = result.updates.clone();
        Ok(result.updates)
    }

    /// Mark every symbol of the current index as read.
    pub async fn mark_all_read(&self) -> Result<()> {
        let Some(index) = self.index().await else {
            return Ok(());
        };

        let mut state = self.read_state.load_read_state().await?.unwrap_or_default();
        state.advance_all(&index);
        state.last_checked = now_iso();
        self.read_state.save_read_state(&state).await?;

        self.updates.write().await.clear();
        Ok(())
    }

    /// Mark one symbol as read; `false` when the index does not know it.
    pub async fn mark_symbol_read(&self, code: &str) -> Result<bool> {
        let mark = self
            .index
            .read()
            .await
            .as_ref()
            .and_then(|index| index.symbol(code))
            .map(SymbolMark::of);
        self.updates.write().await.remove(code);

        let Some(mark) = mark else {
            return Ok(false);
        };

        let mut state: ReadState = self.read_state.load_read_state().await?.unwrap_or_default();
        state.advance(code, &mark);
        state.last_checked = now_iso();
        self.read_state.save_read_state(&state).await?;
        Ok(true)
    }

    pub async fn is_symbol_updated(&self, code: &str) -> bool {
        self.updates.read().await.contains(code)
    }

    /// Unread updates found by the last check.
    pub async fn updates(&self) -> UpdateSet {
        self.updates.read().await.clone()
    }

    pub async fn has_updates(&self) -> bool {
        self.updates.read().await.has_updates()
    }

    pub async fn request_permission(&self, prompt: &dyn PermissionPrompt) -> Permission {
        self.dispatcher.lock().await.request_permission(prompt).await
    }

    /// Notify about the updates of the last check.
    pub async fn notify(&self) -> Result<DispatchOutcome> {
        let stamp = match self.index.read().await.as_ref() {
            Some(index) => index.last_updated.clone(),
            None => return Ok(DispatchOutcome::NothingNew),
        };
        let updates = self.updates().await;

        self.dispatcher
            .lock()
            .await
            .dispatch(&updates, &stamp, self.sink.as_ref())
            .await
    }
}
