use crate::action::{Params, ENVELOPE_KEY, HTTP_METHOD_KEY, TOKEN_TYPE_KEY};
use crate::response::Response;
use crate::Result;

use super::core::MediawikiClient;

impl MediawikiClient {
    /// `action=query` over GET without a token. Caller params override those defaults.
    pub async fn query(&self, params: impl Into<Params>) -> Result<Response> {
        let defaults = Params::new()
            .with(HTTP_METHOD_KEY, "GET")
            .with(TOKEN_TYPE_KEY, false);
        self.action("query", defaults.merge(params.into())).await
    }

    /// `list=<subtype>` query, unwrapped to `query.<subtype>`.
    pub async fn list(&self, subtype: &str, params: impl Into<Params>) -> Result<Response> {
        self.subquery("list", subtype, params.into()).await
    }

    /// `meta=<subtype>` query, unwrapped to `query.<subtype>`.
    pub async fn meta(&self, subtype: &str, params: impl Into<Params>) -> Result<Response> {
        self.subquery("meta", subtype, params.into()).await
    }

    /// `prop=<subtype>` query, unwrapped to `query.<subtype>`.
    pub async fn prop(&self, subtype: &str, params: impl Into<Params>) -> Result<Response> {
        self.subquery("prop", subtype, params.into()).await
    }

    async fn subquery(&self, kind: &str, subtype: &str, params: Params) -> Result<Response> {
        let params = params
            .with(kind, subtype)
            .with(ENVELOPE_KEY, vec!["query", subtype]);
        self.query(params).await
    }
}
