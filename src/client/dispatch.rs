//! 动作分发：令牌注入、请求执行、结果分类与过期令牌的单次重试。
//!
//! Action dispatch: token injection, request execution, outcome classification
//! and the single retry on a stale token.

use crate::action::{Action, Params};
use crate::error::ApiError;
use crate::response::Response;
use crate::tokens::{check_token_warnings, extract_token};
use crate::transport::TransportRequest;
use crate::{Error, Result};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::core::MediawikiClient;

/// Header the server sets when a request failed at the API level.
pub(crate) const API_ERROR_HEADER: &str = "mediawiki-api-error";

impl MediawikiClient {
    /// Perform an action. `params` may carry the control keys `http_method`,
    /// `token_type` (`false` for none) and `envelope`.
    pub async fn action(&self, name: &str, params: impl Into<Params>) -> Result<Response> {
        let action = Action::from_params(name, params.into())?;
        self.dispatch(action).await
    }

    /// Perform an action, retrying exactly once if the server rejects its token
    /// as stale. The retry starts from an emptied token cache.
    pub async fn dispatch(&self, action: Action) -> Result<Response> {
        action.validate()?;

        let token = self.token_for(&action).await?;
        match self.send_action(&action, token.as_deref()).await {
            Err(e) if e.is_bad_token() => {
                let cleared = self.tokens.lock().await.invalidate(token.as_deref());
                warn!(
                    action = action.name(),
                    cache_cleared = cleared,
                    "stale token rejected, retrying once"
                );
                let token = self.token_for(&action).await?;
                self.send_action(&action, token.as_deref()).await
            }
            other => other,
        }
    }

    /// Token for `token_type`, fetched only when not cached.
    pub async fn resolve_token(&self, token_type: &str) -> Result<String> {
        let mut cache = self.tokens.lock().await;
        if let Some(token) = cache.get(token_type) {
            debug!(token_type, "token cache hit");
            return Ok(token.to_string());
        }

        debug!(token_type, "token cache miss, fetching");
        let fetch = self.token_scheme.fetch_action(token_type);
        let response = self.send_action(&fetch, None).await?;
        check_token_warnings(&response)?;
        let token = extract_token(&response, token_type)?;
        cache.insert(token_type, token.clone());
        Ok(token)
    }

    async fn token_for(&self, action: &Action) -> Result<Option<String>> {
        match self.token_scheme.token_type_for(action) {
            Some(token_type) => Ok(Some(self.resolve_token(&token_type).await?)),
            None => Ok(None),
        }
    }

    /// One attempt: compile, send, classify. No retry.
    async fn send_action(&self, action: &Action, token: Option<&str>) -> Result<Response> {
        let client_request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let request = TransportRequest {
            method: action.http_method(),
            url: self.api_url.clone(),
            params: action.compile(token),
        };

        debug!(
            action = action.name(),
            method = action.http_method().as_str(),
            with_token = token.is_some(),
            envelope = ?action.envelope_path(),
            client_request_id = client_request_id.as_str(),
            "dispatching wiki action"
        );

        let raw = self.transport.send(request).await?;
        let status = raw.status;

        if status >= 400 {
            info!(
                action = action.name(),
                http_status = status,
                client_request_id = client_request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "wiki action failed at HTTP level"
            );
            return Err(Error::Http { status });
        }

        let flagged = raw.header(API_ERROR_HEADER).is_some();
        let body = serde_json::from_slice::<Value>(&raw.body);
        if let Some(api_error) = api_error_of(flagged, body.as_ref().ok()) {
            info!(
                action = action.name(),
                api_code = api_error.code.as_str(),
                api_info = api_error.info.as_str(),
                client_request_id = client_request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "wiki action returned an API error"
            );
            return Err(Error::Api(api_error));
        }

        let response = Response::from_parts(status, raw.headers, body?, action.envelope_path());
        debug!(
            action = action.name(),
            http_status = status,
            warnings = response.warnings().len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "wiki action completed"
        );
        Ok(response)
    }

    /// GET a non-API URL over the same session and return the body text.
    pub(crate) async fn fetch_text(&self, request: TransportRequest) -> Result<String> {
        let raw = self.transport.send(request).await?;
        if raw.status >= 400 {
            info!(http_status = raw.status, "raw fetch failed at HTTP level");
            return Err(Error::Http { status: raw.status });
        }
        Ok(raw.text())
    }
}

/// API-level failure signalled by the error header or an `error` key in the body.
///
/// With the header set, an unparsable body still yields an error with default code/info.
fn api_error_of(flagged: bool, body: Option<&Value>) -> Option<ApiError> {
    let error = body.and_then(|b| b.get("error"));
    if flagged || error.is_some() {
        Some(ApiError::from_value(error))
    } else {
        None
    }
}
