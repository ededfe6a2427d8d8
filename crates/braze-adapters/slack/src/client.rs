//! Thin Slack Web API client.
//!
//! [`SlackWebClient`] wraps one bot token and exposes exactly the call
//! surface the adapter needs. Every method is a single HTTP round trip;
//! Slack's `ok: false` envelope is surfaced as
//! [`ApiError::Platform`].

use braze_core::{ApiError, ApiResult};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::model::api::{
    AuthTestResponse, OauthAccessResponse, PostEphemeralResponse, PostMessageResponse,
};
use crate::model::message::OutboundMessage;

/// A Web API client bound to one bot token.
#[derive(Clone)]
pub struct SlackWebClient {
    http: Client,
    token: String,
    base_url: String,
}

impl SlackWebClient {
    /// Creates a client from a shared HTTP client, token, and endpoint.
    pub fn new(http: Client, token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    /// Returns the bot token this client authenticates with.
    pub fn token(&self) -> &str {
        &self.token
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), method)
    }

    /// Calls an arbitrary Web API method with a JSON body.
    pub async fn call(&self, method: &str, params: Value) -> ApiResult<Value> {
        debug!(method = %method, "Calling Slack Web API");

        let response = self
            .http
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .json(&params)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    /// Calls a Web API method with a form body and no bearer token.
    ///
    /// `oauth.v2.access` authenticates through its own client credentials.
    pub async fn call_form(&self, method: &str, fields: &[(&str, &str)]) -> ApiResult<Value> {
        debug!(method = %method, "Calling Slack Web API (form)");

        let response = self
            .http
            .post(self.method_url(method))
            .form(fields)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> ApiResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Transport(format!(
                "HTTP {} error: {}",
                status.as_u16(),
                body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if body.get("ok").and_then(Value::as_bool) == Some(false) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(ApiError::Platform { code });
        }

        Ok(body)
    }

    /// Posts a message via `chat.postMessage`.
    pub async fn chat_post_message(
        &self,
        message: &OutboundMessage,
    ) -> ApiResult<PostMessageResponse> {
        let body = self
            .call("chat.postMessage", serde_json::to_value(message)?)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Posts an ephemeral message via `chat.postEphemeral`.
    pub async fn chat_post_ephemeral(
        &self,
        message: &OutboundMessage,
    ) -> ApiResult<PostEphemeralResponse> {
        let body = self
            .call("chat.postEphemeral", serde_json::to_value(message)?)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Replaces a delivered message via `chat.update`.
    pub async fn chat_update(&self, channel: &str, ts: &str, text: &str) -> ApiResult<()> {
        self.call(
            "chat.update",
            json!({ "channel": channel, "ts": ts, "text": text }),
        )
        .await?;
        Ok(())
    }

    /// Deletes a delivered message via `chat.delete`.
    pub async fn chat_delete(&self, channel: &str, ts: &str) -> ApiResult<()> {
        self.call("chat.delete", json!({ "channel": channel, "ts": ts }))
            .await?;
        Ok(())
    }

    /// Returns the identity behind this client's token via `auth.test`.
    pub async fn auth_test(&self) -> ApiResult<AuthTestResponse> {
        let body = self.call("auth.test", json!({})).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Exchanges an OAuth code for tokens via `oauth.v2.access`.
    pub async fn oauth_v2_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> ApiResult<OauthAccessResponse> {
        let body = self
            .call_form(
                "oauth.v2.access",
                &[
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                ],
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}

impl std::fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebClient")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
