use super::{RawResponse, Transport, TransportError, TransportRequest};
use crate::action::HttpMethod;
use crate::Result;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Proxy;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = concat!("mediawiki-api-rs/", env!("CARGO_PKG_VERSION"));

/// Knobs for the default reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub timeout: Option<Duration>,
    pub proxy_url: Option<String>,
    pub user_agent: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Externally supplied cookie store; a fresh one is created when absent.
    pub cookie_jar: Option<Arc<Jar>>,
}

pub struct HttpTransport {
    client: reqwest::Client,
    cookies: Arc<Jar>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        // Env-overridable defaults, explicit config wins.
        let timeout = config.timeout.unwrap_or_else(|| {
            Duration::from_secs(
                env::var("MEDIAWIKI_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(30),
            )
        });
        let user_agent = config
            .user_agent
            .or_else(|| env::var("MEDIAWIKI_USER_AGENT").ok())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let cookies = config.cookie_jar.unwrap_or_default();

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Other(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Other(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .cookie_provider(cookies.clone());

        if let Some(proxy_url) = config
            .proxy_url
            .or_else(|| env::var("MEDIAWIKI_PROXY_URL").ok())
        {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client, cookies })
    }

    /// The session cookie store shared by every request of this transport.
    pub fn cookies(&self) -> Arc<Jar> {
        self.cookies.clone()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let TransportRequest {
            method,
            url,
            params,
        } = request;

        debug!(
            method = method.as_str(),
            url = url.as_str(),
            fields = params.fields.len(),
            multipart = params.file.is_some(),
            "sending wiki request"
        );

        let builder = match method {
            HttpMethod::Get => self.client.get(url).query(&params.fields),
            HttpMethod::Post => match params.file {
                Some((field, file)) => {
                    let mut form = Form::new();
                    for (k, v) in params.fields {
                        form = form.text(k, v);
                    }
                    let part = Part::bytes(file.bytes.to_vec())
                        .file_name(file.file_name)
                        .mime_str(&file.mime)
                        .map_err(TransportError::Http)?;
                    self.client.post(url).multipart(form.part(field, part))
                }
                None => self.client.post(url).form(&params.fields),
            },
        };

        let resp = builder.send().await.map_err(TransportError::Http)?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(TransportError::Http)?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
