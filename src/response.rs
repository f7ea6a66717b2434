//! Parsed API responses.
//!
//! Depending on the action, the real payload of a response sits a level or two
//! below the root object (an envelope). [`Response::data`] unwraps it:
//!
//! ```rust
//! use mediawiki_api::Response;
//! use serde_json::json;
//!
//! let body = json!({ "query": { "userinfo": { "some": "data" } } });
//! let response = Response::from_json(body, ["query", "userinfo"]);
//! assert_eq!(response.data(), &json!({ "some": "data" }));
//! ```

use crate::transport::RawResponse;
use crate::Result;
use reqwest::header::HeaderMap;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Value,
    envelope: Vec<String>,
}

impl Response {
    /// Parse a raw transport response body as JSON.
    pub fn from_raw(raw: RawResponse, envelope: Vec<String>) -> Result<Self> {
        let body = serde_json::from_slice(&raw.body)?;
        Ok(Self {
            status: raw.status,
            headers: raw.headers,
            body,
            envelope,
        })
    }

    pub(crate) fn from_parts(
        status: u16,
        headers: HeaderMap,
        body: Value,
        envelope: Vec<String>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            envelope,
        }
    }

    /// Wrap an already-parsed body (status 200, no headers).
    pub fn from_json<I, S>(body: Value, envelope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body,
            envelope: envelope.into_iter().map(Into::into).collect(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn envelope(&self) -> &[String] {
        &self.envelope
    }

    /// The whole parsed body, envelope included.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Accessor for root object values, bypassing the envelope.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The main payload, removed from its envelope.
    ///
    /// Unwrapping stops at the first envelope key missing from the current object
    /// and yields the deepest object reached. Non-object bodies are returned as-is.
    pub fn data(&self) -> &Value {
        let mut current = &self.body;
        for key in &self.envelope {
            match current {
                Value::Object(map) => match map.get(key) {
                    Some(next) => current = next,
                    None => break,
                },
                _ => break,
            }
        }
        current
    }

    /// String field of the unwrapped payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data().get(key).and_then(Value::as_str)
    }

    /// Warning messages from every module, flattened in order.
    pub fn warnings(&self) -> Vec<String> {
        self.flatten("warnings")
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }

    /// Error messages from every module, flattened in order.
    pub fn errors(&self) -> Vec<String> {
        self.flatten("errors")
    }

    fn flatten(&self, key: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(section) = self.body.get(key) {
            collect_leaves(section, &mut out);
        }
        out
    }
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::String(s) => out.push(s.clone()),
        Value::Null => {}
        other => out.push(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_body() -> Value {
        json!({ "query": { "result": "success" } })
    }

    #[test]
    fn test_data_without_envelope() {
        let response = Response::from_json(query_body(), Vec::<String>::new());
        assert_eq!(response.data(), &query_body());
    }

    #[test]
    fn test_data_single_level_envelope() {
        let response = Response::from_json(query_body(), ["query"]);
        assert_eq!(response.data(), &json!({ "result": "success" }));
    }

    #[test]
    fn test_data_multi_level_envelope() {
        let response = Response::from_json(query_body(), ["query", "result"]);
        assert_eq!(response.data(), &json!("success"));
    }

    #[test]
    fn test_data_partial_envelope() {
        let response = Response::from_json(query_body(), ["query", "missing"]);
        assert_eq!(response.data(), &json!({ "result": "success" }));
    }

    #[test]
    fn test_data_stops_at_scalar() {
        let response = Response::from_json(query_body(), ["query", "result", "deeper"]);
        assert_eq!(response.data(), &json!("success"));
    }

    #[test]
    fn test_data_array_body_ignores_envelope() {
        let response = Response::from_json(json!(["something"]), ["what", "ever"]);
        assert_eq!(response.data(), &json!(["something"]));
    }

    #[test]
    fn test_no_warnings() {
        let response = Response::from_json(query_body(), ["query"]);
        assert!(response.warnings().is_empty());
        assert!(!response.has_warnings());
    }

    #[test]
    fn test_warnings_are_flattened() {
        let body = json!({
            "warnings": {
                "main": { "*": "sorta bad message" },
                "tokens": { "*": ["first", "second"] }
            }
        });
        let response = Response::from_json(body, Vec::<String>::new());
        assert_eq!(
            response.warnings(),
            vec!["sorta bad message", "first", "second"]
        );
        assert!(response.has_warnings());
    }

    #[test]
    fn test_errors_are_flattened() {
        let body = json!({ "errors": { "main": { "*": "broken" } } });
        let response = Response::from_json(body, Vec::<String>::new());
        assert_eq!(response.errors(), vec!["broken"]);
    }

    #[test]
    fn test_root_accessor_bypasses_envelope() {
        let body = json!({ "edit": { "result": "Success" }, "batchcomplete": "" });
        let response = Response::from_json(body, ["edit"]);
        assert_eq!(response.get("batchcomplete"), Some(&json!("")));
        assert_eq!(response.data_str("result"), Some("Success"));
    }
}
