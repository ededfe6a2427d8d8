//! Configuration types for the Slack adapter.
//!
//! The options bag can be deserialized from a host's configuration file or
//! assembled programmatically through
//! [`SlackAdapter::builder`](crate::SlackAdapter::builder).
//!
//! # Example Configuration
//!
//! ```yaml
//! adapters:
//!   slack:
//!     verification_token: ${SLACK_VERIFICATION_TOKEN}
//!     bot_token: ${SLACK_BOT_TOKEN:-}
//!     client_id: "12345.67890"
//!     client_secret: ${SLACK_CLIENT_SECRET:-}
//!     scopes: [bot, chat:write]
//!     redirect_uri: https://example.com/install/auth
//! ```
//!
//! Multi-workspace deployments leave `bot_token` unset and install a
//! [`TokenResolver`] instead; the resolver is consulted per team id and is
//! not part of the serialized configuration.

use std::sync::Arc;

use braze_core::{ApiResult, ConfigError};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Default Slack Web API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Async per-team bot-token lookup for multi-workspace deployments.
pub type TokenResolver = Arc<dyn Fn(&str) -> BoxFuture<'static, ApiResult<String>> + Send + Sync>;

/// Slack adapter configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackAdapterOptions {
    /// Token used to validate that inbound requests originate from Slack.
    pub verification_token: String,

    /// Static bot token for single-workspace deployments.
    pub bot_token: Option<String>,

    /// Per-team token lookup for multi-workspace deployments.
    #[serde(skip)]
    pub token_resolver: Option<TokenResolver>,

    /// OAuth client id.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// OAuth scopes requested at install time.
    pub scopes: Vec<String>,

    /// URI Slack redirects to after the OAuth flow completes.
    pub redirect_uri: String,

    /// Web API endpoint. Overridable for tests.
    pub api_base_url: String,
}

impl Default for SlackAdapterOptions {
    fn default() -> Self {
        Self {
            verification_token: String::new(),
            bot_token: None,
            token_resolver: None,
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
            redirect_uri: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for SlackAdapterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAdapterOptions")
            .field("verification_token", &"<redacted>")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("token_resolver", &self.token_resolver.is_some())
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl SlackAdapterOptions {
    /// Checks that the options bag is usable.
    ///
    /// The verification token and redirect URI are hard requirements; a
    /// missing token source (neither `bot_token` nor `token_resolver`) is
    /// legal so an adapter can serve pure OAuth installation flows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verification_token.trim().is_empty() {
            return Err(ConfigError::MissingOption("verification_token"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ConfigError::MissingOption("redirect_uri"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".into()));
        }
        Ok(())
    }

    /// Returns whether any bot-token source is configured.
    pub fn has_token_source(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty()) || self.token_resolver.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_options() {
        let yaml = r#"
verification_token: vtok
bot_token: xoxb-abc
client_id: "12345.67890"
client_secret: shh
scopes:
  - bot
  - chat:write
redirect_uri: https://example.com/install/auth
"#;

        let options: SlackAdapterOptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options.verification_token, "vtok");
        assert_eq!(options.bot_token.as_deref(), Some("xoxb-abc"));
        assert_eq!(options.scopes, vec!["bot", "chat:write"]);
        assert_eq!(options.api_base_url, DEFAULT_API_BASE_URL);
        assert!(options.validate().is_ok());
        assert!(options.has_token_source());
    }

    #[test]
    fn test_validate_requires_verification_token() {
        let options = SlackAdapterOptions {
            redirect_uri: "https://example.com/auth".into(),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::MissingOption("verification_token"))
        ));
    }

    #[test]
    fn test_validate_requires_redirect_uri() {
        let options = SlackAdapterOptions {
            verification_token: "vtok".into(),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::MissingOption("redirect_uri"))
        ));
    }

    #[test]
    fn test_token_source_detection() {
        let mut options = SlackAdapterOptions::default();
        assert!(!options.has_token_source());

        options.bot_token = Some(String::new());
        assert!(!options.has_token_source());

        options.token_resolver = Some(Arc::new(|team: &str| {
            let team = team.to_string();
            Box::pin(async move { Ok(format!("xoxb-{team}")) })
        }));
        assert!(options.has_token_source());
    }
}
