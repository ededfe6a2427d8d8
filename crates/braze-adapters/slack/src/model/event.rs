//! Inbound event model.
//!
//! Slack delivers three families of HTTP payloads to an app:
//!
//! - JSON Events API envelopes (`url_verification`, `event_callback`),
//! - form-encoded slash command invocations (a `command` field),
//! - form-encoded interactive payloads (a `payload` field holding JSON).
//!
//! [`InboundPayload::parse`] classifies a raw body into one of these and
//! each family knows how to normalize itself into a framework
//! [`Activity`]. Every family echoes the app's verification token, exposed
//! through [`InboundPayload::token`].

use braze_core::{
    Activity, ActivityType, AdapterError, AdapterResult, ChannelAccount, ConversationAccount,
};
use serde::Deserialize;
use serde_json::Value;

use crate::CHANNEL_ID;

/// One inbound Slack HTTP payload, classified.
#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// Slack probing the endpoint's TLS setup.
    SslCheck {
        /// Echoed verification token.
        token: Option<String>,
    },
    /// Events API endpoint handshake; the challenge must be echoed back.
    UrlVerification {
        /// Echoed verification token.
        token: String,
        /// Challenge string to echo.
        challenge: String,
    },
    /// An Events API delivery.
    EventCallback(EventCallback),
    /// A slash command invocation.
    SlashCommand(SlashCommand),
    /// An interactive component payload (buttons, menus, dialogs).
    Interactive(InteractivePayload),
}

impl InboundPayload {
    /// Classifies a raw HTTP body.
    pub fn parse(content_type: &str, body: &str) -> AdapterResult<Self> {
        if content_type.contains("application/json") {
            Self::parse_json(body)
        } else {
            Self::parse_form(body)
        }
    }

    fn parse_json(body: &str) -> AdapterResult<Self> {
        let raw: Value =
            serde_json::from_str(body).map_err(|e| AdapterError::parse(e.to_string()))?;

        match raw.get("type").and_then(Value::as_str) {
            Some("url_verification") => Ok(Self::UrlVerification {
                token: string_field(&raw, "token"),
                challenge: string_field(&raw, "challenge"),
            }),
            Some("ssl_check") => Ok(Self::SslCheck {
                token: raw.get("token").and_then(Value::as_str).map(String::from),
            }),
            Some("event_callback") => {
                let callback: EventCallback = serde_json::from_value(raw.clone())
                    .map_err(|e| AdapterError::parse(e.to_string()))?;
                Ok(Self::EventCallback(EventCallback { raw, ..callback }))
            }
            Some(other) => Err(AdapterError::parse(format!(
                "unknown envelope type '{other}'"
            ))),
            None => Err(AdapterError::parse("envelope has no type field")),
        }
    }

    fn parse_form(body: &str) -> AdapterResult<Self> {
        let fields: Vec<(String, String)> = serde_urlencoded::from_str(body)
            .map_err(|e| AdapterError::parse(e.to_string()))?;

        let lookup = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        if lookup("ssl_check").is_some() {
            return Ok(Self::SslCheck {
                token: lookup("token").map(String::from),
            });
        }

        if let Some(payload) = lookup("payload") {
            let raw: Value =
                serde_json::from_str(payload).map_err(|e| AdapterError::parse(e.to_string()))?;
            let parsed: InteractivePayload = serde_json::from_value(raw.clone())
                .map_err(|e| AdapterError::parse(e.to_string()))?;
            return Ok(Self::Interactive(InteractivePayload { raw, ..parsed }));
        }

        if lookup("command").is_some() {
            let command: SlashCommand = serde_urlencoded::from_str(body)
                .map_err(|e| AdapterError::parse(e.to_string()))?;
            return Ok(Self::SlashCommand(command));
        }

        Err(AdapterError::parse(
            "form body is neither a slash command nor an interactive payload",
        ))
    }

    /// Returns the verification token echoed with this payload.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::SslCheck { token } => token.as_deref(),
            Self::UrlVerification { token, .. } => Some(token),
            Self::EventCallback(cb) => Some(&cb.token),
            Self::SlashCommand(cmd) => Some(&cmd.token),
            Self::Interactive(payload) => Some(&payload.token),
        }
    }

    /// Normalizes the payload into an activity.
    ///
    /// Only event deliveries, slash commands, and interactive payloads carry
    /// an activity; handshakes return `None`.
    pub fn to_activity(&self) -> Option<Activity> {
        match self {
            Self::SslCheck { .. } | Self::UrlVerification { .. } => None,
            Self::EventCallback(cb) => Some(cb.to_activity()),
            Self::SlashCommand(cmd) => Some(cmd.to_activity()),
            Self::Interactive(payload) => Some(payload.to_activity()),
        }
    }
}

// =============================================================================
// Events API
// =============================================================================

/// An Events API `event_callback` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventCallback {
    /// Echoed verification token.
    pub token: String,
    /// Workspace the event happened in.
    pub team_id: String,
    /// App id the delivery is addressed to.
    pub api_app_id: Option<String>,
    /// The wrapped event, verbatim.
    pub event: Value,
    /// Delivery id.
    pub event_id: Option<String>,
    /// Delivery time (epoch seconds).
    pub event_time: Option<i64>,
    /// Bot/user authorizations for this delivery.
    pub authorizations: Vec<Value>,
    /// The whole envelope, verbatim. Becomes the activity's channel data.
    #[serde(skip)]
    pub raw: Value,
}

impl EventCallback {
    /// Returns the inner event's `type`.
    pub fn event_type(&self) -> Option<&str> {
        self.event.get("type").and_then(Value::as_str)
    }

    /// Returns the bot user id this delivery was authorized for.
    fn authorized_user(&self) -> Option<&str> {
        self.authorizations
            .first()
            .and_then(|a| a.get("user_id"))
            .and_then(Value::as_str)
    }

    /// Normalizes the callback into an activity.
    ///
    /// Plain `message` events (no subtype) become [`ActivityType::Message`];
    /// everything else starts as [`ActivityType::Event`] and is reclassified
    /// by [`SlackEventMiddleware`](crate::middleware::SlackEventMiddleware).
    pub fn to_activity(&self) -> Activity {
        let event = &self.event;
        let ts = event.get("ts").and_then(Value::as_str);
        let channel = event
            .get("channel")
            .and_then(Value::as_str)
            .or_else(|| event.get("channel_id").and_then(Value::as_str))
            .unwrap_or_default();

        let mut conversation = ConversationAccount::new(channel);
        conversation.set_property("team", self.team_id.clone());
        if let Some(thread_ts) = event.get("thread_ts").and_then(Value::as_str) {
            conversation.set_property("thread_ts", thread_ts);
        }

        // Bot-authored events carry bot_id instead of user.
        let from_id = event
            .get("bot_id")
            .and_then(Value::as_str)
            .or_else(|| event.get("user").and_then(Value::as_str))
            .unwrap_or_default();

        let is_plain_message =
            self.event_type() == Some("message") && event.get("subtype").is_none();

        Activity {
            activity_type: if is_plain_message {
                ActivityType::Message
            } else {
                ActivityType::Event
            },
            id: ts
                .map(String::from)
                .or_else(|| self.event_id.clone())
                .or_else(|| Some(uuid::Uuid::new_v4().to_string())),
            timestamp: ts
                .map(String::from)
                .or_else(|| self.event_time.map(|t| t.to_string())),
            channel_id: CHANNEL_ID.to_string(),
            from: ChannelAccount::new(from_id),
            recipient: self.authorized_user().map(ChannelAccount::new),
            conversation,
            text: if is_plain_message {
                event.get("text").and_then(Value::as_str).map(String::from)
            } else {
                None
            },
            value: None,
            channel_data: Some(self.raw.clone()),
        }
    }
}

// =============================================================================
// Slash Commands
// =============================================================================

/// A slash command invocation, decoded from its form body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    /// Echoed verification token.
    pub token: String,
    /// Workspace the command was invoked in.
    pub team_id: String,
    /// Channel the command was invoked in.
    pub channel_id: String,
    /// Channel name.
    pub channel_name: Option<String>,
    /// Invoking user.
    pub user_id: String,
    /// Invoking user's name.
    pub user_name: Option<String>,
    /// The command itself (with leading slash).
    pub command: String,
    /// Everything typed after the command.
    pub text: String,
    /// One-time URL for delayed responses.
    pub response_url: Option<String>,
    /// Trigger id for opening modals.
    pub trigger_id: Option<String>,
}

impl SlashCommand {
    /// Normalizes the command into an activity.
    pub fn to_activity(&self) -> Activity {
        let mut conversation = ConversationAccount::new(self.channel_id.clone());
        conversation.set_property("team", self.team_id.clone());

        Activity {
            activity_type: ActivityType::Event,
            id: Some(uuid::Uuid::new_v4().to_string()),
            timestamp: None,
            channel_id: CHANNEL_ID.to_string(),
            from: ChannelAccount::new(self.user_id.clone()),
            recipient: None,
            conversation,
            text: Some(self.text.clone()),
            value: None,
            channel_data: serde_json::to_value(SlashCommandData {
                command: &self.command,
                text: &self.text,
                response_url: self.response_url.as_deref(),
                trigger_id: self.trigger_id.as_deref(),
            })
            .ok(),
        }
    }
}

#[derive(serde::Serialize)]
struct SlashCommandData<'a> {
    command: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger_id: Option<&'a str>,
}

// =============================================================================
// Interactive Payloads
// =============================================================================

/// Reference object (`{"id": ...}`) used throughout interactive payloads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdRef {
    /// Referenced id.
    pub id: String,
    /// Display name, when present.
    pub name: Option<String>,
}

/// An interactive component payload (`block_actions`,
/// `interactive_message`, `dialog_submission`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InteractivePayload {
    /// Payload kind.
    #[serde(rename = "type")]
    pub payload_type: String,
    /// Echoed verification token.
    pub token: String,
    /// Workspace reference.
    pub team: Option<IdRef>,
    /// Acting user.
    pub user: Option<IdRef>,
    /// Channel the interaction happened in.
    pub channel: Option<IdRef>,
    /// Triggered actions.
    pub actions: Vec<Value>,
    /// One-time URL for responses.
    pub response_url: Option<String>,
    /// Trigger id for opening modals.
    pub trigger_id: Option<String>,
    /// The whole payload, verbatim. Becomes the activity's channel data.
    #[serde(skip)]
    pub raw: Value,
}

impl InteractivePayload {
    /// Normalizes the payload into an activity.
    ///
    /// The triggered actions land in the activity's `value` so hosts can
    /// dispatch on them without digging through channel data.
    pub fn to_activity(&self) -> Activity {
        let mut conversation = ConversationAccount::new(
            self.channel.as_ref().map(|c| c.id.clone()).unwrap_or_default(),
        );
        if let Some(team) = &self.team {
            conversation.set_property("team", team.id.clone());
        }

        Activity {
            activity_type: ActivityType::Event,
            id: Some(uuid::Uuid::new_v4().to_string()),
            timestamp: None,
            channel_id: CHANNEL_ID.to_string(),
            from: ChannelAccount::new(self.user.as_ref().map(|u| u.id.clone()).unwrap_or_default()),
            recipient: None,
            conversation,
            text: None,
            value: Some(Value::Array(self.actions.clone())),
            channel_data: Some(self.raw.clone()),
        }
    }
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
