use crate::tokens::{TokenCache, TokenScheme};
use crate::transport::Transport;
use crate::Result;
use reqwest::cookie::Jar;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

/// Client for one wiki session.
///
/// Owns the token cache and (through its transport) the cookie store for its
/// whole lifetime. Safe to share across tasks: token population and invalidation
/// happen under one lock.
pub struct MediawikiClient {
    pub(crate) api_url: Url,
    pub(crate) index_url: Url,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cookies: Option<Arc<Jar>>,
    pub(crate) tokens: Mutex<TokenCache>,
    pub(crate) token_scheme: TokenScheme,
    pub(crate) logged_in: AtomicBool,
}

impl MediawikiClient {
    /// Create a client for the given `api.php` URL with default settings.
    pub fn new(api_url: &str) -> Result<Self> {
        crate::client::builder::MediawikiClientBuilder::new(api_url).build()
    }

    pub fn builder(api_url: impl Into<String>) -> crate::client::builder::MediawikiClientBuilder {
        crate::client::builder::MediawikiClientBuilder::new(api_url)
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    pub fn token_scheme(&self) -> TokenScheme {
        self.token_scheme
    }

    /// Whether a login or account creation has succeeded on this instance.
    ///
    /// Observational only; it never gates calls.
    pub fn logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    /// The session cookie store, when the transport exposes one.
    pub fn cookies(&self) -> Option<Arc<Jar>> {
        self.cookies.clone()
    }

    /// Drop every cached token.
    pub async fn clear_tokens(&self) {
        self.tokens.lock().await.clear();
        debug!("token cache cleared");
    }

    /// Cached token of `token_type`, without fetching.
    pub async fn cached_token(&self, token_type: &str) -> Option<String> {
        self.tokens.lock().await.get(token_type).map(str::to_string)
    }

    /// The session changed: later calls need fresh tokens.
    pub(crate) async fn mark_logged_in(&self) {
        self.logged_in.store(true, Ordering::SeqCst);
        self.clear_tokens().await;
    }
}
