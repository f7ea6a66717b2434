//! Login and account creation.
//!
//! Both legacy flows are a two-step token exchange: the first call answers
//! `NeedToken` with a token, the second call repeats the request carrying it.
//! The exchange is a bounded loop; a second `NeedToken` is terminal.

use crate::action::{Action, Params};
use crate::response::Response;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::core::MediawikiClient;

/// Initial attempt plus one token-armed retry.
const MAX_EXCHANGE_ATTEMPTS: usize = 2;

/// Placeholder return URL; required by the server but never followed.
const CREATE_RETURN_URL: &str = "http://example.com";

/// Result of one login / legacy account-creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    NeedToken(String),
    Other(String),
}

#[derive(Debug, Default, Deserialize)]
struct AuthData {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl AuthOutcome {
    pub fn from_data(data: &Value) -> Self {
        if !data.is_object() {
            return AuthOutcome::Other(String::new());
        }
        let parsed = AuthData::deserialize(data).unwrap_or_default();
        match (parsed.result.as_deref(), parsed.token) {
            (Some("Success"), _) => AuthOutcome::Success,
            (Some("NeedToken"), Some(token)) => AuthOutcome::NeedToken(token),
            (Some(other), _) => AuthOutcome::Other(other.to_string()),
            (None, _) => AuthOutcome::Other(String::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParamInfo {
    modules: Vec<ParamInfoModule>,
}

#[derive(Debug, Deserialize)]
struct ParamInfoModule {
    parameters: Vec<ParamInfoParameter>,
}

#[derive(Debug, Deserialize)]
struct ParamInfoParameter {
    name: String,
}

/// Which account-creation protocol the server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateAccountProtocol {
    /// Token-based create-then-confirm (`requests` parameter declared).
    AuthManager,
    /// `NeedToken` / `Success` exchange.
    Legacy,
}

impl MediawikiClient {
    /// Log in. On success the client is marked logged in and the token cache is cleared.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<Response> {
        self.token_exchange("log in", Error::Login, |token| {
            let action = Action::new("login")
                .no_token()
                .param("lgname", username)
                .param("lgpassword", password);
            match token {
                Some(t) => action.param("lgtoken", t),
                None => action,
            }
        })
        .await
    }

    /// Create an account, picking the protocol from the server's declared parameters.
    pub async fn create_account(&self, username: &str, password: &str) -> Result<Response> {
        match self.create_account_protocol().await? {
            CreateAccountProtocol::AuthManager => {
                self.create_account_with_token(username, password).await
            }
            CreateAccountProtocol::Legacy => {
                self.token_exchange("create account", Error::CreateAccount, |token| {
                    let action = Action::new("createaccount")
                        .no_token()
                        .param("name", username)
                        .param("password", password);
                    match token {
                        Some(t) => action.param("token", t),
                        None => action,
                    }
                })
                .await
            }
        }
    }

    async fn create_account_protocol(&self) -> Result<CreateAccountProtocol> {
        let response = self
            .dispatch(
                Action::new("paraminfo")
                    .no_token()
                    .param("modules", "createaccount"),
            )
            .await?;

        let info = ParamInfo::deserialize(response.data())
            .map_err(|_| Error::CreateAccount("unexpected API response format".to_string()))?;
        let module = info
            .modules
            .first()
            .ok_or_else(|| Error::CreateAccount("unexpected API response format".to_string()))?;

        let protocol = if module.parameters.iter().any(|p| p.name == "requests") {
            CreateAccountProtocol::AuthManager
        } else {
            CreateAccountProtocol::Legacy
        };
        debug!(protocol = ?protocol, "account creation protocol detected");
        Ok(protocol)
    }

    async fn create_account_with_token(&self, username: &str, password: &str) -> Result<Response> {
        let tokens = self
            .meta("tokens", Params::new().with("type", "createaccount"))
            .await?;
        let token = tokens
            .data_str("createaccounttoken")
            .map(str::to_string)
            .ok_or_else(|| {
                Error::CreateAccount("failed to get createaccount API token".to_string())
            })?;

        let response = self
            .dispatch(
                Action::new("createaccount")
                    .no_token()
                    .param("username", username)
                    .param("password", password)
                    .param("retype", password)
                    .param("createreturnurl", CREATE_RETURN_URL)
                    .param("createtoken", token),
            )
            .await?;

        if response.data_str("status") != Some("PASS") {
            let message = response
                .data_str("message")
                .or_else(|| response.data_str("status"))
                .unwrap_or_default()
                .to_string();
            info!(message = message.as_str(), "account creation rejected");
            return Err(Error::CreateAccount(message));
        }

        self.mark_logged_in().await;
        Ok(response)
    }

    /// Run a `NeedToken` exchange: at most one retry, carrying the returned token.
    async fn token_exchange<F>(
        &self,
        what: &str,
        fail: fn(String) -> Error,
        build: F,
    ) -> Result<Response>
    where
        F: Fn(Option<&str>) -> Action,
    {
        let mut sent_token: Option<String> = None;

        for _ in 0..MAX_EXCHANGE_ATTEMPTS {
            let response = self.dispatch(build(sent_token.as_deref())).await?;
            match AuthOutcome::from_data(response.data()) {
                AuthOutcome::Success => {
                    self.mark_logged_in().await;
                    return Ok(response);
                }
                AuthOutcome::NeedToken(token) => {
                    if sent_token.is_some() {
                        break;
                    }
                    debug!(what, "server requested a token, retrying with it");
                    sent_token = Some(token);
                }
                AuthOutcome::Other(result) => {
                    info!(what, result = result.as_str(), "token exchange failed");
                    return Err(fail(result));
                }
            }
        }

        Err(fail(format!(
            "failed to {} with the returned token '{}'",
            what,
            sent_token.unwrap_or_default()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_outcome_variants() {
        assert_eq!(
            AuthOutcome::from_data(&json!({ "result": "Success" })),
            AuthOutcome::Success
        );
        assert_eq!(
            AuthOutcome::from_data(&json!({ "result": "NeedToken", "token": "456" })),
            AuthOutcome::NeedToken("456".into())
        );
        assert_eq!(
            AuthOutcome::from_data(&json!({ "result": "EmptyPass" })),
            AuthOutcome::Other("EmptyPass".into())
        );
    }

    #[test]
    fn test_need_token_without_token_is_terminal() {
        assert_eq!(
            AuthOutcome::from_data(&json!({ "result": "NeedToken" })),
            AuthOutcome::Other("NeedToken".into())
        );
    }

    #[test]
    fn test_array_payload_is_not_an_outcome() {
        assert_eq!(
            AuthOutcome::from_data(&json!(["Success"])),
            AuthOutcome::Other(String::new())
        );
        assert_eq!(
            AuthOutcome::from_data(&json!(["NeedToken", "abc"])),
            AuthOutcome::Other(String::new())
        );
    }

    #[test]
    fn test_non_object_data() {
        assert_eq!(
            AuthOutcome::from_data(&json!(["x"])),
            AuthOutcome::Other(String::new())
        );
    }
}
