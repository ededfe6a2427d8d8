//! The Slack adapter.
//!
//! Bridges the framework contracts in `braze-core` with Slack's Web API and
//! event model. The adapter owns the verification/token configuration, a
//! per-team cache of [`SlackWebClient`]s, and (after [`init`]) the host it
//! dispatches turns into.
//!
//! # Programmatic Usage
//!
//! ```rust,ignore
//! let adapter = SlackAdapter::builder()
//!     .verification_token(std::env::var("SLACK_VERIFICATION_TOKEN")?)
//!     .bot_token(std::env::var("SLACK_BOT_TOKEN")?)
//!     .redirect_uri("https://example.com/install/auth")
//!     .build()?;
//!
//! adapter
//!     .init(
//!         BotHost::new(handler_fn(|ctx| Box::pin(on_turn(ctx))))
//!             .use_middleware(SlackEventMiddleware)
//!             .use_middleware(SlackMessageTypeMiddleware),
//!     )
//!     .await;
//!
//! slack::server::serve(adapter, "0.0.0.0:3000").await?;
//! ```
//!
//! [`init`]: SlackAdapter::init

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use braze_core::{
    Activity, ActivityType, AdapterError, AdapterResult, ApiError, ApiResult, BotAdapter,
    BotHandler, BotHost, ConfigError, ConversationReference, ResourceResponse, TurnContext,
};
use reqwest::ClientBuilder;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::SlackWebClient;
use crate::config::{SlackAdapterOptions, TokenResolver};
use crate::model::api::OauthAccessResponse;
use crate::model::event::InboundPayload;
use crate::model::message::OutboundMessage;

/// Cache key used when a static bot token is configured.
const STATIC_TOKEN_KEY: &str = "default";

// =============================================================================
// Inbound Reply
// =============================================================================

/// What the HTTP layer should answer for one processed inbound request.
///
/// Keeps [`SlackAdapter::process_activity`] transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReply {
    /// HTTP status to answer with.
    pub status: u16,
    /// Response body, when one is required (e.g. a challenge echo).
    pub body: Option<String>,
}

impl InboundReply {
    /// Empty 200 reply.
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }

    /// 200 reply with a body.
    pub fn ok_with(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: Some(body.into()),
        }
    }

    /// 401 reply for requests that fail token verification.
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            body: Some("invalid verification token".into()),
        }
    }
}

// =============================================================================
// Slack Adapter
// =============================================================================

/// Adapter bridging the framework activity model to Slack.
pub struct SlackAdapter {
    options: SlackAdapterOptions,
    http: reqwest::Client,
    /// Resolved Web API clients by team id.
    clients: RwLock<HashMap<String, Arc<SlackWebClient>>>,
    /// Host attached via [`init`](Self::init).
    host: RwLock<Option<Arc<BotHost>>>,
}

impl std::fmt::Debug for SlackAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAdapter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SlackAdapter {
    /// Creates an adapter from an options bag.
    ///
    /// Fails when the verification token or redirect URI is missing. A
    /// missing token source is tolerated (OAuth-only operation) but logged.
    pub fn new(options: SlackAdapterOptions) -> Result<Arc<Self>, ConfigError> {
        options.validate()?;

        if !options.has_token_source() {
            warn!(
                "Neither bot_token nor token_resolver configured; \
                 only OAuth operations will succeed"
            );
        }

        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Arc::new(Self {
            options,
            http,
            clients: RwLock::new(HashMap::new()),
            host: RwLock::new(None),
        }))
    }

    /// Creates an adapter builder.
    pub fn builder() -> SlackAdapterBuilder {
        SlackAdapterBuilder::default()
    }

    /// Returns the adapter configuration.
    pub fn options(&self) -> &SlackAdapterOptions {
        &self.options
    }

    /// Attaches the host whose pipeline inbound activities run through.
    ///
    /// Must be called before [`process_activity`](Self::process_activity).
    pub async fn init(&self, host: BotHost) {
        info!("Slack adapter initialized");
        *self.host.write().await = Some(Arc::new(host));
    }

    async fn host(&self) -> AdapterResult<Arc<BotHost>> {
        self.host.read().await.clone().ok_or(AdapterError::NotInitialized(
            "call init() with a BotHost before processing activities",
        ))
    }

    /// Returns a Web API client for the team an activity belongs to.
    ///
    /// With a static `bot_token` the same client serves every team.
    /// Otherwise the configured [`TokenResolver`] is consulted once per team
    /// and the resulting client cached.
    pub async fn get_api(&self, activity: &Activity) -> ApiResult<Arc<SlackWebClient>> {
        let (key, team) = if self.options.bot_token.as_deref().is_some_and(|t| !t.is_empty()) {
            (STATIC_TOKEN_KEY.to_string(), None)
        } else {
            let team = activity
                .conversation
                .property("team")
                .map(String::from)
                .ok_or_else(|| ApiError::NoToken {
                    team: "unknown".into(),
                })?;
            (team.clone(), Some(team))
        };

        if let Some(client) = self.clients.read().await.get(&key) {
            return Ok(Arc::clone(client));
        }

        let token = match (&self.options.bot_token, &team) {
            (Some(token), _) if !token.is_empty() => token.clone(),
            (_, Some(team)) => {
                let resolver = self
                    .options
                    .token_resolver
                    .as_ref()
                    .ok_or_else(|| ApiError::NoToken { team: team.clone() })?;
                resolver(team).await?
            }
            _ => {
                return Err(ApiError::NoToken {
                    team: "unknown".into(),
                });
            }
        };

        let client = Arc::new(SlackWebClient::new(
            self.http.clone(),
            token,
            &self.options.api_base_url,
        ));
        self.clients
            .write()
            .await
            .insert(key.clone(), Arc::clone(&client));
        debug!(team = %key, "Cached Slack Web API client");
        Ok(client)
    }

    /// Builds the OAuth install link users follow to add the bot to a
    /// workspace.
    pub fn get_install_link(&self) -> Result<String, ConfigError> {
        let client_id = self
            .options
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingOption("client_id"))?;

        let scope = self.options.scopes.join(",");
        let query = serde_urlencoded::to_string([
            ("client_id", client_id),
            ("scope", scope.as_str()),
            ("redirect_uri", self.options.redirect_uri.as_str()),
        ])
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(format!("https://slack.com/oauth/v2/authorize?{query}"))
    }

    /// Exchanges an OAuth completion code for tokens.
    pub async fn validate_oauth_code(&self, code: &str) -> AdapterResult<OauthAccessResponse> {
        let client_id = self
            .options
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingOption("client_id"))?;
        let client_secret = self
            .options
            .client_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingOption("client_secret"))?;

        let client = SlackWebClient::new(self.http.clone(), "", &self.options.api_base_url);
        let access = client
            .oauth_v2_access(client_id, client_secret, code, &self.options.redirect_uri)
            .await?;
        Ok(access)
    }

    /// Translates an outbound activity into `chat.postMessage` parameters.
    ///
    /// The activity's `channel_data` (when it is a JSON object) seeds the
    /// message; conversation id, thread, and text are overlaid on top.
    fn activity_to_slack(activity: &Activity) -> AdapterResult<OutboundMessage> {
        let mut message: OutboundMessage = match &activity.channel_data {
            Some(data) if data.is_object() => serde_json::from_value(data.clone())
                .map_err(|e| AdapterError::parse(e.to_string()))?,
            _ => OutboundMessage::default(),
        };

        if message.channel.is_empty() {
            message.channel = activity.conversation.id.clone();
        }
        if message.thread_ts.is_none() {
            message.thread_ts = activity
                .conversation
                .property("thread_ts")
                .map(String::from);
        }
        if let Some(text) = &activity.text {
            message.text = Some(text.clone());
        }

        if message.channel.is_empty() {
            return Err(AdapterError::MissingActivityField("conversation.id"));
        }
        Ok(message)
    }

    /// Accepts one inbound Slack HTTP request and runs the host pipeline.
    ///
    /// Handshakes (`ssl_check`, `url_verification`) are answered without
    /// reaching the host. A verification-token mismatch is answered with
    /// 401 and never dispatched.
    pub async fn process_activity(
        self: &Arc<Self>,
        content_type: &str,
        body: &str,
    ) -> AdapterResult<InboundReply> {
        let payload = InboundPayload::parse(content_type, body)?;

        if payload.token() != Some(self.options.verification_token.as_str()) {
            warn!("Rejected inbound request: verification token mismatch");
            return Ok(InboundReply::unauthorized());
        }

        match &payload {
            InboundPayload::SslCheck { .. } => return Ok(InboundReply::ok()),
            InboundPayload::UrlVerification { challenge, .. } => {
                debug!("Answering Events API url_verification handshake");
                return Ok(InboundReply::ok_with(challenge.clone()));
            }
            _ => {}
        }

        // Classified payloads always carry an activity from here on.
        let activity = payload
            .to_activity()
            .ok_or_else(|| AdapterError::parse("payload carries no activity"))?;

        let host = self.host().await?;
        let adapter: Arc<dyn BotAdapter> = Arc::clone(self) as Arc<dyn BotAdapter>;
        let mut ctx = TurnContext::new(adapter, activity);

        debug!(
            activity_type = %ctx.activity.activity_type,
            conversation = %ctx.activity.conversation.id,
            "Dispatching inbound Slack activity"
        );
        host.run_turn(&mut ctx).await?;

        Ok(InboundReply::ok())
    }
}

#[async_trait]
impl BotAdapter for SlackAdapter {
    async fn send_activities(
        &self,
        ctx: &TurnContext,
        activities: &[Activity],
    ) -> AdapterResult<Vec<ResourceResponse>> {
        let mut responses = Vec::with_capacity(activities.len());

        for activity in activities {
            if activity.activity_type != ActivityType::Message {
                debug!(
                    activity_type = %activity.activity_type,
                    "Skipping non-message activity"
                );
                responses.push(ResourceResponse::default());
                continue;
            }

            let message = Self::activity_to_slack(activity)?;
            let api = self.get_api(&ctx.activity).await?;

            let id = if message.ephemeral {
                api.chat_post_ephemeral(&message).await?.message_ts
            } else {
                api.chat_post_message(&message).await?.ts
            };
            responses.push(ResourceResponse { id });
        }

        Ok(responses)
    }

    async fn update_activity(&self, ctx: &TurnContext, activity: &Activity) -> AdapterResult<()> {
        let ts = activity
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AdapterError::MissingActivityField("id"))?;
        if activity.conversation.id.is_empty() {
            return Err(AdapterError::MissingActivityField("conversation.id"));
        }

        let api = self.get_api(&ctx.activity).await?;
        api.chat_update(
            &activity.conversation.id,
            ts,
            activity.text.as_deref().unwrap_or_default(),
        )
        .await?;
        Ok(())
    }

    async fn delete_activity(
        &self,
        ctx: &TurnContext,
        reference: &ConversationReference,
    ) -> AdapterResult<()> {
        let ts = reference
            .activity_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AdapterError::MissingActivityField("activityId"))?;
        if reference.conversation.id.is_empty() {
            return Err(AdapterError::MissingActivityField("conversation.id"));
        }

        let api = self.get_api(&ctx.activity).await?;
        api.chat_delete(&reference.conversation.id, ts).await?;
        Ok(())
    }

    async fn continue_conversation(
        self: Arc<Self>,
        reference: &ConversationReference,
        logic: BotHandler,
    ) -> AdapterResult<()> {
        let activity = reference.continuation_activity();
        let adapter: Arc<dyn BotAdapter> = self;
        let mut ctx = TurnContext::new(adapter, activity);
        logic.on_turn(&mut ctx).await
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`SlackAdapter`].
#[derive(Default)]
pub struct SlackAdapterBuilder {
    options: SlackAdapterOptions,
}

impl SlackAdapterBuilder {
    /// Sets the verification token (required).
    pub fn verification_token(mut self, token: impl Into<String>) -> Self {
        self.options.verification_token = token.into();
        self
    }

    /// Sets a static bot token for single-workspace deployments.
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.options.bot_token = Some(token.into());
        self
    }

    /// Installs a per-team token resolver for multi-workspace deployments.
    pub fn token_resolver(mut self, resolver: TokenResolver) -> Self {
        self.options.token_resolver = Some(resolver);
        self
    }

    /// Sets the OAuth client id.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.options.client_id = Some(id.into());
        self
    }

    /// Sets the OAuth client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.options.client_secret = Some(secret.into());
        self
    }

    /// Adds one requested OAuth scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.options.scopes.push(scope.into());
        self
    }

    /// Replaces the requested OAuth scopes.
    pub fn scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the OAuth redirect URI (required).
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.options.redirect_uri = uri.into();
        self
    }

    /// Overrides the Web API endpoint (tests).
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.options.api_base_url = url.into();
        self
    }

    /// Builds the adapter, validating the assembled options.
    pub fn build(self) -> Result<Arc<SlackAdapter>, ConfigError> {
        SlackAdapter::new(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braze_core::{ChannelAccount, ConversationAccount, TurnHandler, handler_fn};
    use serde_json::json;
    use std::sync::Mutex;

    fn adapter() -> Arc<SlackAdapter> {
        SlackAdapter::builder()
            .verification_token("vtok")
            .bot_token("xoxb-test")
            .client_id("12345.67890")
            .client_secret("shh")
            .scopes(["bot", "chat:write"])
            .redirect_uri("https://example.com/install/auth")
            .build()
            .unwrap()
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl TurnHandler for Recorder {
        async fn on_turn(&self, ctx: &mut TurnContext) -> AdapterResult<()> {
            self.0
                .lock()
                .unwrap()
                .push(ctx.activity.text.clone().unwrap_or_default());
            Ok(())
        }
    }

    #[test]
    fn construction_requires_verification_token() {
        let err = SlackAdapter::builder()
            .redirect_uri("https://example.com/auth")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption("verification_token")));
    }

    #[test]
    fn install_link_carries_oauth_parameters() {
        let link = adapter().get_install_link().unwrap();
        assert!(link.starts_with("https://slack.com/oauth/v2/authorize?"));
        assert!(link.contains("client_id=12345.67890"));
        assert!(link.contains("scope=bot%2Cchat%3Awrite"));
        assert!(link.contains("redirect_uri=https%3A%2F%2Fexample.com%2Finstall%2Fauth"));
    }

    #[test]
    fn install_link_requires_client_id() {
        let adapter = SlackAdapter::builder()
            .verification_token("vtok")
            .bot_token("xoxb-test")
            .redirect_uri("https://example.com/auth")
            .build()
            .unwrap();
        assert!(matches!(
            adapter.get_install_link(),
            Err(ConfigError::MissingOption("client_id"))
        ));
    }

    #[test]
    fn activity_to_slack_overlays_channel_data() {
        let mut conversation = ConversationAccount::new("C123");
        conversation.set_property("thread_ts", "1700000000.000001");

        let activity = Activity {
            activity_type: ActivityType::Message,
            conversation,
            text: Some("updated text".into()),
            channel_data: Some(json!({
                "blocks": [{"type": "section"}],
                "text": "seed text",
                "unfurl_links": false,
            })),
            ..Default::default()
        };

        let message = SlackAdapter::activity_to_slack(&activity).unwrap();
        assert_eq!(message.channel, "C123");
        assert_eq!(message.text.as_deref(), Some("updated text"));
        assert_eq!(message.thread_ts.as_deref(), Some("1700000000.000001"));
        assert!(message.blocks.is_some());
        assert_eq!(message.extra["unfurl_links"], json!(false));
    }

    #[test]
    fn activity_to_slack_requires_a_channel() {
        let activity = Activity::message("no destination");
        assert!(matches!(
            SlackAdapter::activity_to_slack(&activity),
            Err(AdapterError::MissingActivityField("conversation.id"))
        ));
    }

    #[tokio::test]
    async fn get_api_with_static_token_ignores_team() {
        let adapter = adapter();
        let activity = Activity::message("x");
        let api = adapter.get_api(&activity).await.unwrap();
        assert_eq!(api.token(), "xoxb-test");
    }

    #[tokio::test]
    async fn get_api_resolves_and_caches_per_team() {
        let calls = Arc::new(Mutex::new(0_usize));
        let calls_in_resolver = Arc::clone(&calls);
        let adapter = SlackAdapter::builder()
            .verification_token("vtok")
            .token_resolver(Arc::new(move |team: &str| {
                *calls_in_resolver.lock().unwrap() += 1;
                let team = team.to_string();
                Box::pin(async move { Ok(format!("xoxb-{team}")) })
            }))
            .redirect_uri("https://example.com/auth")
            .build()
            .unwrap();

        let mut activity = Activity::message("x");
        activity.conversation = ConversationAccount::new("C1");
        activity.conversation.set_property("team", "T42");

        let first = adapter.get_api(&activity).await.unwrap();
        let second = adapter.get_api(&activity).await.unwrap();
        assert_eq!(first.token(), "xoxb-T42");
        assert_eq!(second.token(), "xoxb-T42");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn get_api_without_token_source_fails() {
        let adapter = SlackAdapter::builder()
            .verification_token("vtok")
            .redirect_uri("https://example.com/auth")
            .build()
            .unwrap();

        let mut activity = Activity::message("x");
        activity.conversation.set_property("team", "T42");
        assert!(matches!(
            adapter.get_api(&activity).await,
            Err(ApiError::NoToken { .. })
        ));
    }

    #[tokio::test]
    async fn process_activity_answers_url_verification() {
        let reply = adapter()
            .process_activity(
                "application/json",
                r#"{"type":"url_verification","token":"vtok","challenge":"chal-123"}"#,
            )
            .await
            .unwrap();
        assert_eq!(reply, InboundReply::ok_with("chal-123"));
    }

    #[tokio::test]
    async fn process_activity_rejects_bad_token() {
        let adapter = adapter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        adapter
            .init(BotHost::new(Arc::new(Recorder(Arc::clone(&seen)))))
            .await;

        let reply = adapter
            .process_activity(
                "application/json",
                r#"{"type":"url_verification","token":"wrong","challenge":"chal"}"#,
            )
            .await
            .unwrap();
        assert_eq!(reply.status, 401);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn process_activity_requires_init() {
        let body = json!({
            "type": "event_callback",
            "token": "vtok",
            "team_id": "T1",
            "event": {"type": "message", "user": "U1", "text": "hi", "channel": "C1", "ts": "1.2"}
        })
        .to_string();

        let err = adapter()
            .process_activity("application/json", &body)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotInitialized(_)));
    }

    #[tokio::test]
    async fn process_activity_dispatches_through_the_host() {
        let adapter = adapter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        adapter
            .init(BotHost::new(Arc::new(Recorder(Arc::clone(&seen)))))
            .await;

        let body = json!({
            "type": "event_callback",
            "token": "vtok",
            "team_id": "T1",
            "event": {
                "type": "message",
                "user": "U1",
                "text": "hello there",
                "channel": "C1",
                "ts": "1700000000.000100"
            }
        })
        .to_string();

        let reply = adapter
            .process_activity("application/json", &body)
            .await
            .unwrap();
        assert_eq!(reply, InboundReply::ok());
        assert_eq!(*seen.lock().unwrap(), ["hello there"]);
    }

    #[tokio::test]
    async fn continue_conversation_runs_logic_with_the_reference() {
        let adapter = adapter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_logic = Arc::clone(&seen);

        let reference = ConversationReference {
            activity_id: Some("1700000000.000100".into()),
            user: Some(ChannelAccount::new("U1")),
            bot: Some(ChannelAccount::new("B1")),
            conversation: ConversationAccount::new("C1"),
            channel_id: "slack".into(),
        };

        let logic = handler_fn(move |ctx| {
            let seen = Arc::clone(&seen_in_logic);
            let conversation = ctx.activity.conversation.id.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(conversation);
                Ok(())
            })
        });

        Arc::clone(&adapter)
            .continue_conversation(&reference, logic)
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), ["C1"]);
    }

    #[tokio::test]
    async fn update_and_delete_require_ids() {
        let adapter = adapter();
        let ctx_activity = Activity::message("inbound");
        let adapter_dyn: Arc<dyn BotAdapter> = Arc::clone(&adapter) as Arc<dyn BotAdapter>;
        let ctx = TurnContext::new(adapter_dyn, ctx_activity);

        let mut no_id = Activity::message("edit");
        no_id.conversation = ConversationAccount::new("C1");
        assert!(matches!(
            adapter.update_activity(&ctx, &no_id).await,
            Err(AdapterError::MissingActivityField("id"))
        ));

        let reference = ConversationReference {
            conversation: ConversationAccount::new("C1"),
            ..Default::default()
        };
        assert!(matches!(
            adapter.delete_activity(&ctx, &reference).await,
            Err(AdapterError::MissingActivityField("activityId"))
        ));
    }
}
