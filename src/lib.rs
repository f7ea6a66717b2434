//! # mediawiki-api
//!
//! MediaWiki 动作 API 的会话客户端：令牌管理、Cookie 会话与响应信封解包。
//!
//! Session-aware client for the MediaWiki action API (`api.php`).
//!
//! ## Overview
//!
//! Talking to `api.php` involves three recurring chores this crate takes care of:
//!
//! - **Tokens**: state-changing actions need an anti-forgery token of the right
//!   type. Tokens are fetched on demand, cached per type and refreshed once
//!   automatically when the server reports them stale (`badtoken`).
//! - **Session**: every request goes through one shared cookie store, so a
//!   login carries over to later calls.
//! - **Envelopes**: payloads are nested under action-specific keys
//!   (`{"query": {"pages": ...}}`); [`Response::data`] unwraps them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediawiki_api::MediawikiClient;
//!
//! #[tokio::main]
//! async fn main() -> mediawiki_api::Result<()> {
//!     let client = MediawikiClient::new("https://wiki.example.org/w/api.php")?;
//!     client.log_in("Bot", "secret").await?;
//!
//!     client.create_page("Sandbox", "Hello from Rust").await?;
//!     let text = client.get_wikitext("Sandbox").await?;
//!     assert_eq!(text, "Hello from Rust");
//!
//!     let pages = client
//!         .list("allpages", [("aplimit", "10")])
//!         .await?;
//!     println!("{}", pages.data());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | The client, its builder and the convenience operations |
//! | [`action`] | Action definitions and parameter compilation |
//! | [`response`] | Envelope-aware response accessor |
//! | [`tokens`] | Token cache and token fetching conventions |
//! | [`transport`] | HTTP transport seam and the reqwest implementation |
//! | [`error`] | Error taxonomy |

pub mod action;
pub mod client;
pub mod response;
pub mod tokens;
pub mod transport;

// Re-export main types for convenience
pub use action::{Action, HttpMethod, ParamValue, Params, TokenRequirement, UploadFile};
pub use client::{AuthOutcome, MediawikiClient, MediawikiClientBuilder};
pub use response::Response;
pub use tokens::{TokenCache, TokenScheme};
pub use transport::{HttpTransport, RawResponse, Transport, TransportRequest};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{ApiError, Error, ErrorContext};
