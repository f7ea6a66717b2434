//! Mock wiki server setup for integration tests

#![allow(dead_code)]

use mediawiki_api::{MediawikiClient, TokenScheme};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const MOCK_TOKEN: &str = "token123";

/// Test fixture that manages a mock `api.php`
pub struct MockWiki {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockWiki {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn api_url(&self) -> String {
        format!("{}/api.php", self.base_url)
    }

    pub fn client(&self) -> MediawikiClient {
        self.client_with_scheme(TokenScheme::ActionTokens)
    }

    pub fn client_with_scheme(&self, scheme: TokenScheme) -> MediawikiClient {
        MediawikiClient::builder(self.api_url())
            .token_scheme(scheme)
            .build()
            .expect("client builds against mock server")
    }

    /// Unbuilt mock for an `api.php` request carrying `params` plus `format=json`.
    /// GET params are matched in the query string, POST params in the form body.
    pub async fn stub_api_request(&self, method: &str, params: &[(&str, &str)]) -> Mock {
        let mut matchers: Vec<Matcher> = params
            .iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
            .collect();
        matchers.push(Matcher::UrlEncoded("format".into(), "json".into()));

        let mut server = self.server.lock().await;
        let mock = server.mock(method, Matcher::Regex(r"^/api\.php".to_string()));
        if method == "GET" {
            mock.match_query(Matcher::AllOf(matchers))
        } else {
            mock.match_body(Matcher::AllOf(matchers))
        }
    }

    /// Action request carrying the mock token.
    pub async fn stub_action_request(&self, action: &str, params: &[(&str, &str)]) -> Mock {
        let mut all = vec![("action", action), ("token", MOCK_TOKEN)];
        all.extend_from_slice(params);
        self.stub_api_request("POST", &all).await
    }

    /// Legacy `action=tokens` fetch answering with the mock token and an optional warning.
    pub async fn stub_token_request(&self, token_type: &str, warning: Option<&str>) -> Mock {
        let mut body = serde_json::json!({
            "tokens": { format!("{}token", token_type): MOCK_TOKEN }
        });
        if let Some(warning) = warning {
            body["warnings"] = serde_json::json!({ "tokens": { "*": warning } });
        }
        self.stub_api_request("GET", &[("action", "tokens"), ("type", token_type)])
            .await
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// `action=query&meta=tokens` fetch answering with the mock token.
    pub async fn stub_meta_token_request(&self, token_type: &str) -> Mock {
        let body = serde_json::json!({
            "batchcomplete": "",
            "query": { "tokens": { format!("{}token", token_type): MOCK_TOKEN } }
        });
        self.stub_api_request(
            "GET",
            &[("action", "query"), ("meta", "tokens"), ("type", token_type)],
        )
        .await
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
    }
}
