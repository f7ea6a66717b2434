//! Action definitions and parameter compilation.
//!
//! An [`Action`] describes a single call to `api.php`: the action name, the HTTP
//! method, which token (if any) it needs and the envelope its payload is nested in.
//! Actions are built per call and never persisted.

use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use std::path::Path;

/// Reserved parameter keys that control dispatch instead of being sent.
pub const HTTP_METHOD_KEY: &str = "http_method";
pub const TOKEN_TYPE_KEY: &str = "token_type";
pub const ENVELOPE_KEY: &str = "envelope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            _ => None,
        }
    }
}

/// Which token an action must carry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenRequirement {
    /// Resolved by the client's [`TokenScheme`](crate::tokens::TokenScheme).
    #[default]
    Default,
    /// No token is fetched or sent.
    None,
    /// An explicit token type, e.g. `watch`.
    Type(String),
}

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: "application/octet-stream".to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read a file from disk. The file name sent is the last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read upload file: {}", e),
                ErrorContext::new()
                    .with_field_path("params.file")
                    .with_details(path.display().to_string())
                    .with_source("upload_file"),
            )
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// A single parameter value.
///
/// `Bool(false)` means "omit the parameter entirely"; lists are joined with `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
    File(UploadFile),
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        ParamValue::Text(v.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::List(v)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(v: Vec<&str>) -> Self {
        ParamValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(v: [&str; N]) -> Self {
        ParamValue::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<UploadFile> for ParamValue {
    fn from(v: UploadFile) -> Self {
        ParamValue::File(v)
    }
}

macro_rules! numeric_param {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                ParamValue::Text(v.to_string())
            }
        })*
    };
}

numeric_param!(u32, u64, i32, i64, usize);

/// Ordered parameter set. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Merge `other` into `self`; values from `other` win.
    pub fn merge(mut self, other: Params) -> Self {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile into wire form: omitted `false`s, `|`-joined lists, at most one file.
    pub fn compile(&self) -> CompiledParams {
        let mut compiled = CompiledParams::default();
        for (key, value) in &self.entries {
            match value {
                ParamValue::Bool(false) => {}
                ParamValue::Bool(true) => compiled.push(key, "true"),
                ParamValue::Text(s) => compiled.push(key, s),
                ParamValue::List(items) => compiled.push(key, &items.join("|")),
                ParamValue::File(file) => compiled.file = Some((key.clone(), file.clone())),
            }
        }
        compiled
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: Into<ParamValue>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Parameters ready for the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledParams {
    pub fields: Vec<(String, String)>,
    pub file: Option<(String, UploadFile)>,
}

impl CompiledParams {
    fn push(&mut self, key: &str, value: &str) {
        self.fields.retain(|(k, _)| k != key);
        self.fields.push((key.to_string(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A named remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    name: String,
    method: HttpMethod,
    token: TokenRequirement,
    envelope: Option<Vec<String>>,
    params: Params,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::default(),
            token: TokenRequirement::default(),
            envelope: None,
            params: Params::new(),
        }
    }

    /// Build an action from a parameter set that may carry the reserved control
    /// keys `http_method`, `token_type` and `envelope`. Those keys are removed.
    pub fn from_params(name: impl Into<String>, mut params: Params) -> Result<Self> {
        let mut action = Action::new(name);

        if let Some(value) = params.remove(HTTP_METHOD_KEY) {
            let method = match &value {
                ParamValue::Text(s) => HttpMethod::parse(s),
                _ => None,
            };
            action.method = method.ok_or_else(|| control_key_error(HTTP_METHOD_KEY, &value))?;
        }

        if let Some(value) = params.remove(TOKEN_TYPE_KEY) {
            action.token = match value {
                ParamValue::Bool(false) => TokenRequirement::None,
                ParamValue::Bool(true) => TokenRequirement::Default,
                ParamValue::Text(t) => TokenRequirement::Type(t),
                other => return Err(control_key_error(TOKEN_TYPE_KEY, &other)),
            };
        }

        if let Some(value) = params.remove(ENVELOPE_KEY) {
            action.envelope = match value {
                ParamValue::List(path) => Some(path),
                ParamValue::Text(key) => Some(vec![key]),
                other => return Err(control_key_error(ENVELOPE_KEY, &other)),
            };
        }

        action.params = params;
        Ok(action)
    }

    pub fn get(mut self) -> Self {
        self.method = HttpMethod::Get;
        self
    }

    pub fn post(mut self) -> Self {
        self.method = HttpMethod::Post;
        self
    }

    pub fn no_token(mut self) -> Self {
        self.token = TokenRequirement::None;
        self
    }

    pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token = TokenRequirement::Type(token_type.into());
        self
    }

    pub fn envelope<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.envelope = Some(path.into_iter().map(Into::into).collect());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = std::mem::take(&mut self.params).merge(params);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn http_method(&self) -> HttpMethod {
        self.method
    }

    pub fn token_requirement(&self) -> &TokenRequirement {
        &self.token
    }

    /// Envelope path, defaulting to `[name]`.
    pub fn envelope_path(&self) -> Vec<String> {
        self.envelope
            .clone()
            .unwrap_or_else(|| vec![self.name.clone()])
    }

    pub fn parameters(&self) -> &Params {
        &self.params
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let valid = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::configuration_with_context(
                "action name must be a non-empty identifier",
                ErrorContext::new()
                    .with_field_path("action.name")
                    .with_details(self.name.clone())
                    .with_source("action"),
            ));
        }

        // A query string cannot carry a file part.
        if self.method == HttpMethod::Get {
            if let Some((key, _)) = self
                .params
                .iter()
                .find(|(_, v)| matches!(v, ParamValue::File(_)))
            {
                return Err(Error::configuration_with_context(
                    "file parameters require POST",
                    ErrorContext::new()
                        .with_field_path(format!("params.{}", key))
                        .with_details(self.name.clone())
                        .with_source("action"),
                ));
            }
        }
        Ok(())
    }

    /// Compile the wire parameters, injecting `token` and the fixed `action`/`format` pair.
    pub fn compile(&self, token: Option<&str>) -> CompiledParams {
        let mut params = self.params.clone();
        if let Some(token) = token {
            params.insert("token", token);
        }
        let mut compiled = params.compile();
        compiled.push("action", &self.name);
        compiled.push("format", "json");
        compiled
    }
}

fn control_key_error(key: &str, value: &ParamValue) -> Error {
    Error::configuration_with_context(
        format!("invalid value for control key '{}'", key),
        ErrorContext::new()
            .with_field_path(format!("params.{}", key))
            .with_details(format!("{:?}", value))
            .with_source("action"),
    )
}
