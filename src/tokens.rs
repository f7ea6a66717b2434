//! 令牌缓存：按类型缓存防伪令牌，支持整体失效。
//!
//! Per-client token cache and token fetching conventions.
//!
//! State-changing actions must carry an anti-forgery token of a given type
//! (`csrf`, `edit`, `watch`, `createaccount`, ...). Tokens are fetched lazily,
//! cached per type for the lifetime of the session and dropped all at once when
//! the session changes (login, account creation) or the server reports a stale
//! token.
//!
//! ## Token schemes
//!
//! | Scheme | Fetch call | Default type |
//! |--------|------------|--------------|
//! | [`TokenScheme::ActionTokens`] | `action=tokens&type=<t>` | the action name |
//! | [`TokenScheme::MetaTokens`] | `action=query&meta=tokens&type=<t>` | `csrf` |

use crate::action::{Action, TokenRequirement};
use crate::response::Response;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Warning emitted when the server does not know the requested token type.
static UNRECOGNIZED_TOKEN_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Unrecognized values? for parameter 'type'").expect("static pattern"));

/// How tokens are fetched and which type an action gets when it does not name one.
///
/// `MetaTokens` is the mode to use against current servers; `action=tokens` has
/// been deprecated upstream and only older wikis still depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenScheme {
    /// `action=tokens`, token type defaults to the action name.
    #[default]
    ActionTokens,
    /// `action=query&meta=tokens`, token type defaults to `csrf`.
    MetaTokens,
}

impl TokenScheme {
    /// Token type an action needs, or `None` when it needs no token.
    pub fn token_type_for(&self, action: &Action) -> Option<String> {
        match action.token_requirement() {
            TokenRequirement::None => None,
            TokenRequirement::Type(t) => Some(t.clone()),
            TokenRequirement::Default => Some(match self {
                TokenScheme::ActionTokens => action.name().to_string(),
                TokenScheme::MetaTokens => "csrf".to_string(),
            }),
        }
    }

    /// The internal call that fetches a token of `token_type`.
    pub fn fetch_action(&self, token_type: &str) -> Action {
        match self {
            TokenScheme::ActionTokens => Action::new("tokens")
                .get()
                .no_token()
                .param("type", token_type)
                .envelope(["tokens"]),
            TokenScheme::MetaTokens => Action::new("query")
                .get()
                .no_token()
                .param("meta", "tokens")
                .param("type", token_type)
                .envelope(["query", "tokens"]),
        }
    }
}

/// Fail when the server rejected the token type; other warnings (deprecation
/// notices and the like) are ignored.
pub fn check_token_warnings(response: &Response) -> Result<()> {
    let warnings = response.warnings();
    if warnings.iter().any(|w| UNRECOGNIZED_TOKEN_TYPE.is_match(w)) {
        return Err(Error::Token(warnings.join(", ")));
    }
    Ok(())
}

/// Pull `<type>token` out of an unwrapped token response.
pub fn extract_token(response: &Response, token_type: &str) -> Result<String> {
    let field = format!("{}token", token_type);
    response
        .data_str(&field)
        .map(str::to_string)
        .ok_or_else(|| Error::Token(format!("no '{}' in token response", field)))
}

/// Token type → last fetched token.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: HashMap<String, String>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token_type: &str) -> Option<&str> {
        self.tokens.get(token_type).map(String::as_str)
    }

    pub fn insert(&mut self, token_type: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(token_type.into(), token.into());
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.tokens.values().any(|t| t == token)
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Clear everything, but only if `stale` is still cached.
    ///
    /// Returns false when another caller already invalidated the cache, so a
    /// token fetched after that invalidation survives.
    pub fn invalidate(&mut self, stale: Option<&str>) -> bool {
        match stale {
            Some(token) if !self.contains_token(token) => false,
            _ => {
                self.clear();
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
