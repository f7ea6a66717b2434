//! HTTP transport seam.
//!
//! The dispatcher only needs "send these parameters with this method to this URL
//! over the shared session". [`HttpTransport`] does that with reqwest and a shared
//! cookie jar; tests or embedders may plug in their own [`Transport`].

pub mod http;

pub use http::{HttpTransport, TransportConfig};

use crate::action::{CompiledParams, HttpMethod};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use url::Url;

/// One outgoing request. GET parameters go to the query string, POST ones to the body.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub params: CompiledParams,
}

/// Status, headers and body bytes of a completed request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests over one shared session (cookie store).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
