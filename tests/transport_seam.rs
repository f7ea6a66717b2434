//! Tests against a scripted in-process transport: request ordering, wire
//! parameters and token sharing between concurrent callers.

use async_trait::async_trait;
use bytes::Bytes;
use mediawiki_api::action::HttpMethod;
use mediawiki_api::{MediawikiClient, RawResponse, Transport, TransportRequest};
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every request and answers from a queue, or from `fallback` when empty.
struct ScriptedTransport {
    requests: Mutex<Vec<TransportRequest>>,
    replies: Mutex<VecDeque<Value>>,
    fallback: Value,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Value>, fallback: Value) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
            fallback,
            delay: None,
        })
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn actions(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.params.get("action").unwrap_or("").to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> mediawiki_api::Result<RawResponse> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let body = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(RawResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }
}

fn client_with(transport: Arc<ScriptedTransport>) -> MediawikiClient {
    MediawikiClient::builder("https://wiki.example.org/w/api.php")
        .transport(transport)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_token_fetch_precedes_action() {
    let transport = ScriptedTransport::new(
        vec![json!({ "tokens": { "edittoken": "abc+\\" } })],
        json!({ "edit": { "result": "Success" } }),
    );
    let client = client_with(transport.clone());

    client
        .edit([("title", "Foo"), ("text", "bar")])
        .await
        .unwrap();

    assert_eq!(transport.actions(), vec!["tokens", "edit"]);
    let requests = transport.requests();
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].params.get("type"), Some("edit"));
    assert_eq!(requests[1].method, HttpMethod::Post);
    assert_eq!(requests[1].params.get("token"), Some("abc+\\"));
    assert_eq!(requests[1].params.get("format"), Some("json"));
}

#[tokio::test]
async fn test_false_parameters_never_reach_the_wire() {
    let transport = ScriptedTransport::new(vec![], json!({ "query": {} }));
    let client = client_with(transport.clone());

    client
        .query([("titles", "Foo"), ("redirects", "")])
        .await
        .unwrap();
    client
        .action(
            "query",
            mediawiki_api::Params::new()
                .with("token_type", false)
                .with("http_method", "GET")
                .with("redirects", false),
        )
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].params.get("redirects"), Some(""));
    assert_eq!(requests[1].params.get("redirects"), None);
    assert!(requests.iter().all(|r| r.params.get("token_type").is_none()));
    assert!(requests.iter().all(|r| r.params.get("http_method").is_none()));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_token_fetch() {
    let transport = Arc::new(ScriptedTransport {
        requests: Mutex::new(Vec::new()),
        replies: Mutex::new(vec![json!({ "tokens": { "deletetoken": "t1" } })].into()),
        fallback: json!({ "delete": { "title": "Foo" } }),
        delay: Some(Duration::from_millis(10)),
    });
    let client = Arc::new(client_with(transport.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.delete_page("Foo", "cleanup").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let actions = transport.actions();
    assert_eq!(actions.iter().filter(|a| *a == "tokens").count(), 1);
    assert_eq!(actions.iter().filter(|a| *a == "delete").count(), 4);
    assert!(transport
        .requests()
        .iter()
        .filter(|r| r.params.get("action") == Some("delete"))
        .all(|r| r.params.get("token") == Some("t1")));
}

#[tokio::test]
async fn test_badtoken_retry_uses_new_token() {
    let transport = ScriptedTransport::new(
        vec![
            json!({ "tokens": { "edittoken": "old" } }),
            json!({ "error": { "code": "badtoken", "info": "Invalid token" } }),
            json!({ "tokens": { "edittoken": "new" } }),
        ],
        json!({ "edit": { "result": "Success" } }),
    );
    let client = client_with(transport.clone());

    client.edit([("title", "Foo")]).await.unwrap();

    let requests = transport.requests();
    assert_eq!(transport.actions(), vec!["tokens", "edit", "tokens", "edit"]);
    assert_eq!(requests[1].params.get("token"), Some("old"));
    assert_eq!(requests[3].params.get("token"), Some("new"));
    assert_eq!(client.cached_token("edit").await.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_other_api_errors_are_not_retried() {
    let transport = ScriptedTransport::new(
        vec![json!({ "tokens": { "edittoken": "t1" } })],
        json!({ "error": { "code": "missingtitle", "info": "The page you specified doesn't exist." } }),
    );
    let client = client_with(transport.clone());

    let err = client.edit([("title", "Foo")]).await.unwrap_err();

    assert_eq!(err.api_error().map(|e| e.code.as_str()), Some("missingtitle"));
    assert_eq!(transport.actions(), vec!["tokens", "edit"]);
    assert_eq!(client.cached_token("edit").await.as_deref(), Some("t1"));
}
