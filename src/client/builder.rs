use crate::client::core::MediawikiClient;
use crate::tokens::{TokenCache, TokenScheme};
use crate::transport::{HttpTransport, Transport, TransportConfig};
use crate::{Error, ErrorContext, Result};
use reqwest::cookie::Jar;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Builder for creating clients with custom configuration.
///
/// Environment defaults (used when not set explicitly):
/// - `MEDIAWIKI_HTTP_TIMEOUT_SECS` (default 30)
/// - `MEDIAWIKI_PROXY_URL`
/// - `MEDIAWIKI_USER_AGENT`
pub struct MediawikiClientBuilder {
    api_url: String,
    index_url: Option<String>,
    token_scheme: TokenScheme,
    transport_config: TransportConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl MediawikiClientBuilder {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            index_url: None,
            token_scheme: TokenScheme::default(),
            transport_config: TransportConfig::default(),
            transport: None,
        }
    }

    /// Override the `index.php` URL used for raw page fetches.
    ///
    /// Defaults to the API URL with its last path segment replaced by `index.php`.
    pub fn index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = Some(url.into());
        self
    }

    pub fn token_scheme(mut self, scheme: TokenScheme) -> Self {
        self.token_scheme = scheme;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.timeout = Some(timeout);
        self
    }

    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.transport_config.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport_config.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport_config
            .headers
            .push((name.into(), value.into()));
        self
    }

    /// Share an existing cookie store instead of starting with an empty session.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.transport_config.cookie_jar = Some(jar);
        self
    }

    /// Plug in a custom transport. Transport options set on this builder are then ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<MediawikiClient> {
        let api_url = parse_url(&self.api_url, "builder.api_url")?;
        let index_url = match &self.index_url {
            Some(raw) => parse_url(raw, "builder.index_url")?,
            None => default_index_url(&api_url)?,
        };

        let (transport, cookies): (Arc<dyn Transport>, Option<Arc<Jar>>) = match self.transport {
            Some(transport) => (transport, self.transport_config.cookie_jar),
            None => {
                let http = HttpTransport::new(self.transport_config)?;
                let cookies = http.cookies();
                (Arc::new(http), Some(cookies))
            }
        };

        Ok(MediawikiClient {
            api_url,
            index_url,
            transport,
            cookies,
            tokens: Mutex::new(TokenCache::new()),
            token_scheme: self.token_scheme,
            logged_in: AtomicBool::new(false),
        })
    }
}

fn parse_url(raw: &str, field: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL: {}", e),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(raw)
                .with_source("client_builder"),
        )
    })
}

fn default_index_url(api_url: &Url) -> Result<Url> {
    api_url.join("index.php").map_err(|e| {
        Error::configuration_with_context(
            format!("cannot derive index.php URL: {}", e),
            ErrorContext::new()
                .with_field_path("builder.api_url")
                .with_details(api_url.as_str())
                .with_source("client_builder"),
        )
    })
}
