//! Shared application state.
//!
//! Every component is constructed once at startup and owned here; handlers
//! receive it through axum's `State` extractor.

use std::sync::Arc;

use quire_core::{AppConfig, LiveCache, RateLimiter, Store};

use crate::notify::{MailContext, Notifier};
use crate::reload::{ContentLoader, Reloader, SourcePuller};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub cache: LiveCache,
    pub store: Store,
    pub reloader: Arc<Reloader>,
    /// Guards comment submission, keyed by client IP.
    pub comment_limiter: RateLimiter,
    /// Guards subscription requests, keyed by `sub:<ip>`.
    pub subscribe_limiter: RateLimiter,
    pub notifier: Arc<dyn Notifier>,
    pub mail: MailContext,
}

impl AppState {
    pub fn new(
        config: AppConfig, store: Store, loader: Arc<dyn ContentLoader>, puller: Arc<dyn SourcePuller>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cache = LiveCache::default();
        let mail = MailContext::from_config(&config);
        let reloader = Arc::new(Reloader::new(
            cache.clone(),
            store.clone(),
            loader,
            puller,
            notifier.clone(),
            mail.clone(),
        ));
        let comment_limiter = RateLimiter::new(config.rate_limit_capacity, config.rate_limit_window());
        let subscribe_limiter = RateLimiter::new(config.rate_limit_capacity, config.rate_limit_window());

        Self { config, cache, store, reloader, comment_limiter, subscribe_limiter, notifier, mail }
    }
}
