//! Outbound message shape for `chat.postMessage` and friends.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters of an outbound Slack message.
///
/// Built by the adapter from an activity: the activity's `channel_data` (when
/// it is a JSON object) seeds the message so hosts can pass Block Kit
/// payloads and any other `chat.postMessage` argument through untouched, then
/// the activity's conversation and text are overlaid on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutboundMessage {
    /// Target channel id.
    pub channel: String,

    /// Message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Thread to reply into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    /// Block Kit blocks, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,

    /// Legacy attachments, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Value>,

    /// Target user for ephemeral delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Routes the message to `chat.postEphemeral` instead of
    /// `chat.postMessage`. Never serialized; it only selects the method.
    #[serde(skip_serializing)]
    pub ephemeral: bool,

    /// Any further `chat.postMessage` arguments, passed through verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
