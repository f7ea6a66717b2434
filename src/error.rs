use crate::response::Response;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for configuration and request-building failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field or parameter that caused the error (e.g., "builder.api_url", "params.file")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the rejected value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "action")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// API-level failure reported by the wiki with a 2xx HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub info: String,
}

impl ApiError {
    pub const DEFAULT_CODE: &'static str = "000";
    pub const DEFAULT_INFO: &'static str = "unknown API error";

    /// Build from the `error` object of a response body. Missing fields fall back to defaults.
    pub fn from_value(error: Option<&serde_json::Value>) -> Self {
        let field = |name: &str| {
            error
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            code: field("code").unwrap_or_else(|| Self::DEFAULT_CODE.to_string()),
            info: field("info").unwrap_or_else(|| Self::DEFAULT_INFO.to_string()),
        }
    }

    /// The server rejected the token as expired or invalid.
    pub fn is_bad_token(&self) -> bool {
        self.code == "badtoken"
    }
}

impl Default for ApiError {
    fn default() -> Self {
        Self::from_value(None)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.info, self.code)
    }
}

impl std::error::Error for ApiError {}

/// Unified error type for the MediaWiki API client
#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected HTTP response ({status})")]
    Http { status: u16 },

    #[error("{0}")]
    Api(ApiError),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Login error: {0}")]
    Login(String),

    #[error("Account creation error: {0}")]
    CreateAccount(String),

    /// The edit was rejected; the full response is kept for inspection.
    #[error("Edit error: check the response data for details")]
    Edit(Box<Response>),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of a failed request, if the failure was an HTTP one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Http { status } => Some(*status),
            _ => None,
        }
    }

    /// True for the stale-token case the dispatcher recovers from on its own.
    pub fn is_bad_token(&self) -> bool {
        self.api_error().map(ApiError::is_bad_token).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_defaults_without_data() {
        let err = ApiError::default();
        assert_eq!(err.code, "000");
        assert_eq!(err.info, "unknown API error");
        assert_eq!(err.to_string(), "unknown API error (000)");
    }

    #[test]
    fn test_api_error_from_body() {
        let body = json!({ "code": "badtoken", "info": "Invalid CSRF token." });
        let err = ApiError::from_value(Some(&body));
        assert!(err.is_bad_token());
        assert_eq!(err.to_string(), "Invalid CSRF token. (badtoken)");
    }

    #[test]
    fn test_api_error_partial_fields() {
        let body = json!({ "code": "missingtitle" });
        let err = ApiError::from_value(Some(&body));
        assert_eq!(err.code, "missingtitle");
        assert_eq!(err.info, "unknown API error");
    }

    #[test]
    fn test_http_error_display() {
        let err = Error::Http { status: 403 };
        assert_eq!(err.to_string(), "unexpected HTTP response (403)");
        assert_eq!(err.http_status(), Some(403));
        assert!(!err.is_bad_token());
    }

    #[test]
    fn test_configuration_error_context() {
        let err = Error::configuration_with_context(
            "invalid API URL",
            ErrorContext::new()
                .with_field_path("builder.api_url")
                .with_source("client_builder"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid API URL (field: builder.api_url, source: client_builder)"
        );
        assert!(err.context().is_some());
    }
}
