//! Typed responses for the Web API methods the adapter calls.

use serde::{Deserialize, Serialize};

/// Response of `auth.test` — the identity of the calling token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTestResponse {
    /// Workspace name.
    #[serde(default)]
    pub team: Option<String>,
    /// Workspace id.
    #[serde(default)]
    pub team_id: Option<String>,
    /// User name of the token's identity.
    #[serde(default)]
    pub user: Option<String>,
    /// User id of the token's identity.
    pub user_id: String,
    /// Bot id, when the token belongs to a bot.
    #[serde(default)]
    pub bot_id: Option<String>,
}

/// Response of `chat.postMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    /// Channel the message landed in.
    pub channel: String,
    /// Timestamp id of the delivered message.
    pub ts: String,
}

/// Response of `chat.postEphemeral`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostEphemeralResponse {
    /// Timestamp id of the ephemeral message.
    pub message_ts: String,
}

/// Response of `oauth.v2.access` — the outcome of code validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthAccessResponse {
    /// Bot access token granted to the app.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type (`bot`).
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes actually granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// User id of the installed bot.
    #[serde(default)]
    pub bot_user_id: Option<String>,
    /// Installed app id.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Workspace the app was installed into.
    #[serde(default)]
    pub team: Option<OauthTeam>,
    /// The installing user.
    #[serde(default)]
    pub authed_user: Option<OauthAuthedUser>,
}

/// Workspace reference in an OAuth response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthTeam {
    /// Workspace id.
    pub id: String,
    /// Workspace name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Installing-user reference in an OAuth response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthAuthedUser {
    /// User id.
    pub id: String,
    /// User token, when user scopes were requested.
    #[serde(default)]
    pub access_token: Option<String>,
    /// User scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
}
