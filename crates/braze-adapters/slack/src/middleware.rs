//! Slack-aware middleware.
//!
//! The adapter normalizes inbound payloads conservatively: anything that is
//! not a plain user message arrives as [`ActivityType::Event`]. These
//! middlewares refine that picture before application logic runs:
//!
//! - [`SlackEventMiddleware`] reclassifies Events API deliveries by their
//!   inner event type,
//! - [`SlackMessageTypeMiddleware`] labels each turn with a Slack-flavored
//!   message category (direct message, mention, slash command, ...),
//! - [`SlackIdentifyBotsMiddleware`] flags turns authored by other bots.

use async_trait::async_trait;
use braze_core::{Activity, ActivityType, AdapterResult, Middleware, Next, TurnContext};
use serde_json::Value;
use tracing::trace;

/// Turn-state key holding the Slack message category as a string.
pub const SLACK_EVENT_TYPE: &str = "slack_event_type";

/// Turn-state key set to `true` when the sender is a bot.
pub const FROM_BOT: &str = "from_bot";

// =============================================================================
// Event Reclassification
// =============================================================================

/// Rewrites Events API deliveries to carry their inner event type.
///
/// A delivery normalized as a generic event keeps its raw envelope in
/// `channel_data`; this middleware lifts the wrapped event's type (or
/// subtype, when present) into the activity type so handlers can match on
/// `reaction_added`, `member_joined_channel`, and so on directly.
pub struct SlackEventMiddleware;

#[async_trait]
impl Middleware for SlackEventMiddleware {
    async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> AdapterResult<()> {
        if ctx.activity.activity_type == ActivityType::Event {
            if let Some(event) = envelope_event(&ctx.activity) {
                let name = event
                    .get("subtype")
                    .or_else(|| event.get("type"))
                    .and_then(Value::as_str);
                if let Some(name) = name {
                    trace!(event_type = %name, "Reclassified Slack event");
                    ctx.activity.activity_type = name.to_string().into();
                }
            }
        }
        next.run(ctx).await
    }
}

/// Returns the wrapped event of an Events API envelope, if the activity
/// carries one.
fn envelope_event(activity: &Activity) -> Option<&Value> {
    let data = activity.channel_data.as_ref()?;
    if data.get("type").and_then(Value::as_str) != Some("event_callback") {
        return None;
    }
    data.get("event")
}

// =============================================================================
// Message Categorization
// =============================================================================

/// Labels each turn with a Slack message category.
///
/// The category lands in turn state under [`SLACK_EVENT_TYPE`]:
///
/// - `slash_command` for slash command invocations,
/// - `block_actions` / `interactive_message` for interactive payloads,
/// - `direct_message` for messages in a DM conversation,
/// - `direct_mention` for messages opening with an `@bot` mention (the
///   mention is stripped from the text),
/// - `mention` for messages mentioning the bot elsewhere,
/// - `message` for everything else.
pub struct SlackMessageTypeMiddleware;

#[async_trait]
impl Middleware for SlackMessageTypeMiddleware {
    async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> AdapterResult<()> {
        let (category, stripped_text) = categorize(&ctx.activity);
        if let Some(text) = stripped_text {
            ctx.activity.text = Some(text);
        }
        trace!(category = %category, "Categorized Slack message");
        ctx.set_state(SLACK_EVENT_TYPE, category);
        next.run(ctx).await
    }
}

fn categorize(activity: &Activity) -> (String, Option<String>) {
    if let Some(data) = &activity.channel_data {
        if data.get("command").is_some() {
            return ("slash_command".into(), None);
        }
        if let Some(kind) = data.get("type").and_then(Value::as_str) {
            if kind == "block_actions" || kind == "interactive_message" {
                return (kind.into(), None);
            }
        }
    }

    if activity.activity_type != ActivityType::Message {
        return ("message".into(), None);
    }

    // Slack DM channel ids start with 'D'.
    if activity.conversation.id.starts_with('D') {
        return ("direct_message".into(), None);
    }

    if let (Some(text), Some(recipient)) = (&activity.text, &activity.recipient) {
        if let Some(stripped) = strip_leading_mention(text, &recipient.id) {
            return ("direct_mention".into(), Some(stripped));
        }
        if text.contains(&format!("<@{}", recipient.id)) {
            return ("mention".into(), None);
        }
    }

    ("message".into(), None)
}

/// Removes a leading `<@USER>` or `<@USER|name>` mention, returning the rest
/// of the text.
fn strip_leading_mention(text: &str, user_id: &str) -> Option<String> {
    let rest = text
        .trim_start()
        .strip_prefix(&format!("<@{user_id}"))?;
    let (label, tail) = rest.split_once('>')?;
    if !(label.is_empty() || label.starts_with('|')) {
        return None;
    }
    Some(tail.trim_start().to_string())
}

// =============================================================================
// Bot Identification
// =============================================================================

/// Flags turns authored by another bot.
///
/// Slack events authored by bots carry a `bot_id`; when one is present the
/// turn state gains [`FROM_BOT`]` = true` so applications can avoid reply
/// loops.
pub struct SlackIdentifyBotsMiddleware;

#[async_trait]
impl Middleware for SlackIdentifyBotsMiddleware {
    async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> AdapterResult<()> {
        let bot_id = ctx.activity.channel_data.as_ref().and_then(|data| {
            data.get("event")
                .and_then(|e| e.get("bot_id"))
                .or_else(|| data.get("bot_id"))
                .and_then(Value::as_str)
        });

        if let Some(bot_id) = bot_id {
            trace!(bot_id = %bot_id, "Turn authored by a bot");
            ctx.set_state(FROM_BOT, true);
        }
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SlackAdapter;
    use braze_core::{
        BotAdapter, ChannelAccount, ConversationAccount, MiddlewareSet, TurnHandler,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn ctx(activity: Activity) -> TurnContext {
        let adapter = SlackAdapter::builder()
            .verification_token("vtok")
            .bot_token("xoxb-test")
            .redirect_uri("https://example.com/auth")
            .build()
            .unwrap();
        TurnContext::new(adapter as Arc<dyn BotAdapter>, activity)
    }

    struct Capture {
        state: Arc<Mutex<Option<(ActivityType, Option<String>, Option<Value>, Option<Value>)>>>,
    }

    #[async_trait]
    impl TurnHandler for Capture {
        async fn on_turn(&self, ctx: &mut TurnContext) -> AdapterResult<()> {
            *self.state.lock().unwrap() = Some((
                ctx.activity.activity_type.clone(),
                ctx.activity.text.clone(),
                ctx.get_state(SLACK_EVENT_TYPE).cloned(),
                ctx.get_state(FROM_BOT).cloned(),
            ));
            Ok(())
        }
    }

    async fn run_all(
        activity: Activity,
    ) -> (ActivityType, Option<String>, Option<Value>, Option<Value>) {
        let state = Arc::new(Mutex::new(None));
        let endpoint = Capture {
            state: Arc::clone(&state),
        };

        let mut set = MiddlewareSet::new();
        set.use_middleware(SlackEventMiddleware);
        set.use_middleware(SlackMessageTypeMiddleware);
        set.use_middleware(SlackIdentifyBotsMiddleware);

        let mut ctx = ctx(activity);
        set.run(&mut ctx, &endpoint).await.unwrap();
        let got = state.lock().unwrap().take();
        got.unwrap()
    }

    fn message_in(channel: &str, text: &str) -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            conversation: ConversationAccount::new(channel),
            recipient: Some(ChannelAccount::new("UBOT")),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn plain_channel_message_is_message() {
        let (_, text, category, from_bot) = run_all(message_in("C1", "hello")).await;
        assert_eq!(category, Some(json!("message")));
        assert_eq!(text.as_deref(), Some("hello"));
        assert!(from_bot.is_none());
    }

    #[tokio::test]
    async fn dm_channel_is_direct_message() {
        let (_, _, category, _) = run_all(message_in("D1", "hello")).await;
        assert_eq!(category, Some(json!("direct_message")));
    }

    #[tokio::test]
    async fn leading_mention_is_direct_mention_and_stripped() {
        let (_, text, category, _) = run_all(message_in("C1", "<@UBOT> deploy prod")).await;
        assert_eq!(category, Some(json!("direct_mention")));
        assert_eq!(text.as_deref(), Some("deploy prod"));

        let (_, text, category, _) =
            run_all(message_in("C1", "<@UBOT|brazebot> deploy prod")).await;
        assert_eq!(category, Some(json!("direct_mention")));
        assert_eq!(text.as_deref(), Some("deploy prod"));
    }

    #[tokio::test]
    async fn embedded_mention_is_mention() {
        let (_, text, category, _) = run_all(message_in("C1", "ask <@UBOT> about it")).await;
        assert_eq!(category, Some(json!("mention")));
        assert_eq!(text.as_deref(), Some("ask <@UBOT> about it"));
    }

    #[tokio::test]
    async fn mention_of_someone_else_is_message() {
        let (_, _, category, _) = run_all(message_in("C1", "<@UOTHER> hello")).await;
        assert_eq!(category, Some(json!("message")));
    }

    #[tokio::test]
    async fn events_are_reclassified_by_inner_type() {
        let activity = Activity {
            activity_type: ActivityType::Event,
            conversation: ConversationAccount::new("C1"),
            channel_data: Some(json!({
                "type": "event_callback",
                "event": {"type": "reaction_added", "user": "U1"}
            })),
            ..Default::default()
        };

        let (activity_type, _, category, _) = run_all(activity).await;
        assert_eq!(activity_type, ActivityType::Other("reaction_added".into()));
        assert_eq!(category, Some(json!("message")));
    }

    #[tokio::test]
    async fn message_subtypes_use_the_subtype() {
        let activity = Activity {
            activity_type: ActivityType::Event,
            conversation: ConversationAccount::new("C1"),
            channel_data: Some(json!({
                "type": "event_callback",
                "event": {"type": "message", "subtype": "message_changed"}
            })),
            ..Default::default()
        };

        let (activity_type, _, _, _) = run_all(activity).await;
        assert_eq!(
            activity_type,
            ActivityType::Other("message_changed".into())
        );
    }

    #[tokio::test]
    async fn slash_commands_are_labeled() {
        let activity = Activity {
            activity_type: ActivityType::Event,
            conversation: ConversationAccount::new("C1"),
            channel_data: Some(json!({"command": "/deploy", "text": "prod"})),
            ..Default::default()
        };

        let (_, _, category, _) = run_all(activity).await;
        assert_eq!(category, Some(json!("slash_command")));
    }

    #[tokio::test]
    async fn block_actions_are_labeled() {
        let activity = Activity {
            activity_type: ActivityType::Event,
            conversation: ConversationAccount::new("C1"),
            channel_data: Some(json!({"type": "block_actions", "actions": []})),
            ..Default::default()
        };

        let (_, _, category, _) = run_all(activity).await;
        assert_eq!(category, Some(json!("block_actions")));
    }

    #[tokio::test]
    async fn bot_authored_events_are_flagged() {
        let activity = Activity {
            activity_type: ActivityType::Event,
            conversation: ConversationAccount::new("C1"),
            channel_data: Some(json!({
                "type": "event_callback",
                "event": {"type": "message", "subtype": "bot_message", "bot_id": "B9"}
            })),
            ..Default::default()
        };

        let (_, _, _, from_bot) = run_all(activity).await;
        assert_eq!(from_bot, Some(json!(true)));
    }
}
