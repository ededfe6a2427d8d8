//! The activity model.
//!
//! An [`Activity`] is the single unit of inbound and outbound communication
//! between a host and an adapter. Adapters normalize platform events into
//! activities on the way in and translate activities back into platform API
//! calls on the way out.
//!
//! A [`ConversationReference`] is the opaque handle an application stores to
//! resume a conversation later via
//! [`BotAdapter::continue_conversation`](crate::adapter::BotAdapter::continue_conversation).

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Activity Type
// =============================================================================

/// Classification of an activity.
///
/// The well-known variants cover what every adapter understands; platform
/// middleware may rewrite the type to a free-form platform event name, which
/// is preserved through [`ActivityType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    /// A user-visible message.
    Message,
    /// A raw platform event.
    Event,
    /// An update to a previously sent message.
    MessageUpdate,
    /// A deletion of a previously sent message.
    MessageDelete,
    /// Membership or conversation metadata changed.
    ConversationUpdate,
    /// Any other type, carried verbatim.
    Other(String),
}

impl Default for ActivityType {
    fn default() -> Self {
        Self::Message
    }
}

impl ActivityType {
    /// Returns the wire name of this activity type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Message => "message",
            Self::Event => "event",
            Self::MessageUpdate => "messageUpdate",
            Self::MessageDelete => "messageDelete",
            Self::ConversationUpdate => "conversationUpdate",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ActivityType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "message" => Self::Message,
            "event" => Self::Event,
            "messageUpdate" => Self::MessageUpdate,
            "messageDelete" => Self::MessageDelete,
            "conversationUpdate" => Self::ConversationUpdate,
            _ => Self::Other(s),
        }
    }
}

impl From<ActivityType> for String {
    fn from(t: ActivityType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// A user or bot account on a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelAccount {
    /// Platform-assigned account id.
    pub id: String,

    /// Display name, when the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    /// Creates an account with the given id and no display name.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// The conversation an activity belongs to.
///
/// Platform-specific routing details that have no generic field (for Slack:
/// the `thread_ts` of a threaded reply) travel in the flattened `properties`
/// map so they survive serialization round trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationAccount {
    /// Platform-assigned conversation id (for Slack: the channel id).
    pub id: String,

    /// Whether the conversation has more than two participants.
    pub is_group: bool,

    /// Display name, when the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Additional platform-specific routing properties.
    #[serde(flatten)]
    pub properties: serde_json::Map<String, Value>,
}

impl ConversationAccount {
    /// Creates a conversation account with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Returns a routing property as a string, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Sets a routing property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }
}

// =============================================================================
// Activity
// =============================================================================

/// A single inbound or outbound message unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    /// Activity classification.
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Platform-assigned activity id (for Slack: the message `ts`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Platform timestamp, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Channel name the adapter serves (e.g. `"slack"`).
    pub channel_id: String,

    /// The sender.
    pub from: ChannelAccount,

    /// The addressee, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,

    /// The conversation this activity belongs to.
    pub conversation: ConversationAccount,

    /// Plain-text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Structured payload from interactive components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// The raw platform payload this activity was normalized from, or
    /// platform-specific delivery options on the way out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<Value>,
}

impl Activity {
    /// Creates an outbound message activity with the given text.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Creates a reply to this activity.
    ///
    /// The reply is stamped with this activity's conversation and channel,
    /// and sender/recipient are swapped.
    pub fn create_reply(&self, text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            channel_id: self.channel_id.clone(),
            from: self.recipient.clone().unwrap_or_default(),
            recipient: Some(self.from.clone()),
            conversation: self.conversation.clone(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Extracts the conversation reference identifying this activity's thread.
    pub fn conversation_reference(&self) -> ConversationReference {
        ConversationReference {
            activity_id: self.id.clone(),
            user: Some(self.from.clone()),
            bot: self.recipient.clone(),
            conversation: self.conversation.clone(),
            channel_id: self.channel_id.clone(),
        }
    }
}

// =============================================================================
// Conversation Reference
// =============================================================================

/// An opaque handle identifying a conversation thread for later resumption.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationReference {
    /// Id of the activity the reference was captured from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,

    /// The user side of the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ChannelAccount>,

    /// The bot side of the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot: Option<ChannelAccount>,

    /// The conversation itself.
    pub conversation: ConversationAccount,

    /// Channel name the reference belongs to.
    pub channel_id: String,
}

impl ConversationReference {
    /// Builds the synthetic activity used to restart a turn in this
    /// conversation.
    pub fn continuation_activity(&self) -> Activity {
        Activity {
            activity_type: ActivityType::Event,
            channel_id: self.channel_id.clone(),
            from: self.user.clone().unwrap_or_default(),
            recipient: self.bot.clone(),
            conversation: self.conversation.clone(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Resource Response
// =============================================================================

/// Delivery receipt for one sent activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceResponse {
    /// Platform-assigned id of the delivered activity.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            id: Some("1700000000.000100".into()),
            channel_id: "slack".into(),
            from: ChannelAccount::new("U123"),
            recipient: Some(ChannelAccount::new("B999")),
            conversation: ConversationAccount::new("C456"),
            text: Some("hello".into()),
            ..Default::default()
        }
    }

    #[test]
    fn activity_type_round_trips_unknown_names() {
        let t: ActivityType = "reaction_added".to_string().into();
        assert_eq!(t, ActivityType::Other("reaction_added".into()));
        assert_eq!(String::from(t), "reaction_added");
        assert_eq!(
            ActivityType::from("message".to_string()),
            ActivityType::Message
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_value(inbound()).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["channelId"], "slack");
        assert_eq!(json["conversation"]["id"], "C456");
        // Optional fields stay off the wire entirely.
        assert!(json.get("channelData").is_none());
    }

    #[test]
    fn conversation_properties_flatten() {
        let mut conv = ConversationAccount::new("C456");
        conv.set_property("thread_ts", "1700000000.000100");
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["thread_ts"], "1700000000.000100");

        let back: ConversationAccount = serde_json::from_value(json).unwrap();
        assert_eq!(back.property("thread_ts"), Some("1700000000.000100"));
    }

    #[test]
    fn reply_swaps_parties_and_keeps_conversation() {
        let reply = inbound().create_reply("hi there");
        assert_eq!(reply.from.id, "B999");
        assert_eq!(reply.recipient.as_ref().unwrap().id, "U123");
        assert_eq!(reply.conversation.id, "C456");
        assert_eq!(reply.text.as_deref(), Some("hi there"));
        assert!(reply.id.is_none());
    }

    #[test]
    fn reference_round_trip() {
        let reference = inbound().conversation_reference();
        assert_eq!(reference.activity_id.as_deref(), Some("1700000000.000100"));
        assert_eq!(reference.conversation.id, "C456");

        let activity = reference.continuation_activity();
        assert_eq!(activity.activity_type, ActivityType::Event);
        assert_eq!(activity.conversation.id, "C456");
        assert_eq!(activity.from.id, "U123");
    }
}
