//! Per-turn context.
//!
//! A [`TurnContext`] carries the current activity through the middleware
//! pipeline and into the host's handler, and exposes the reply surface that
//! delegates back to the adapter that created the turn.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::activity::{Activity, ConversationReference, ResourceResponse};
use crate::adapter::BotAdapter;
use crate::error::AdapterResult;

/// Per-request context object carrying the current activity and reply
/// channel.
pub struct TurnContext {
    adapter: Arc<dyn BotAdapter>,
    /// The activity this turn was started with. Middleware may rewrite it.
    pub activity: Activity,
    /// String-keyed state bag shared by middleware and the handler for the
    /// duration of the turn.
    state: HashMap<String, Value>,
    responded: bool,
}

impl TurnContext {
    /// Creates a context for one turn.
    pub fn new(adapter: Arc<dyn BotAdapter>, activity: Activity) -> Self {
        Self {
            adapter,
            activity,
            state: HashMap::new(),
            responded: false,
        }
    }

    /// Returns the adapter that created this turn.
    pub fn adapter(&self) -> &Arc<dyn BotAdapter> {
        &self.adapter
    }

    /// Returns whether any activity has been sent during this turn.
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Reads a turn-state value.
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Writes a turn-state value.
    pub fn set_state(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Sends a single activity.
    ///
    /// An activity without a conversation or channel is stamped with the
    /// inbound activity's before delivery.
    pub async fn send_activity(
        &mut self,
        mut activity: Activity,
    ) -> AdapterResult<Option<ResourceResponse>> {
        if activity.conversation.id.is_empty() {
            activity.conversation = self.activity.conversation.clone();
        }
        if activity.channel_id.is_empty() {
            activity.channel_id = self.activity.channel_id.clone();
        }

        debug!(conversation = %activity.conversation.id, "Sending activity");
        let adapter = Arc::clone(&self.adapter);
        let mut responses = adapter
            .send_activities(&*self, std::slice::from_ref(&activity))
            .await?;
        self.responded = true;
        Ok(responses.pop())
    }

    /// Sends a plain-text reply to the inbound activity.
    pub async fn reply_text(&mut self, text: &str) -> AdapterResult<Option<ResourceResponse>> {
        let reply = self.activity.create_reply(text);
        self.send_activity(reply).await
    }

    /// Replaces a previously sent activity.
    pub async fn update_activity(&self, activity: &Activity) -> AdapterResult<()> {
        let adapter = Arc::clone(&self.adapter);
        adapter.update_activity(self, activity).await
    }

    /// Retracts a previously sent activity.
    pub async fn delete_activity(&self, reference: &ConversationReference) -> AdapterResult<()> {
        let adapter = Arc::clone(&self.adapter);
        adapter.delete_activity(self, reference).await
    }
}
