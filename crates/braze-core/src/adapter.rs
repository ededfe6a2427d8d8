//! Adapter and turn-handler contracts.
//!
//! A [`BotAdapter`] bridges one messaging platform with the activity model:
//! it delivers outbound activities, edits or retracts previously delivered
//! ones, and can restart a conversation from a stored
//! [`ConversationReference`]. Hosts never talk to a platform API directly;
//! they go through the adapter owned by the current [`TurnContext`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::activity::{Activity, ConversationReference, ResourceResponse};
use crate::context::TurnContext;
use crate::error::AdapterResult;

// =============================================================================
// Turn Handler
// =============================================================================

/// The host's per-turn endpoint.
///
/// Invoked once per inbound activity after the middleware pipeline, and
/// directly (without middleware) when a conversation is resumed.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    /// Handles one turn.
    async fn on_turn(&self, ctx: &mut TurnContext) -> AdapterResult<()>;
}

/// A shared, type-erased turn handler.
pub type BotHandler = Arc<dyn TurnHandler>;

/// Wraps a closure returning a boxed future into a [`BotHandler`].
///
/// ```rust,ignore
/// async fn echo(ctx: &mut TurnContext) -> AdapterResult<()> {
///     let text = ctx.activity.text.clone().unwrap_or_default();
///     ctx.reply_text(&text).await?;
///     Ok(())
/// }
///
/// let handler = handler_fn(|ctx| Box::pin(echo(ctx)));
/// ```
pub fn handler_fn<F>(f: F) -> BotHandler
where
    F: for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, AdapterResult<()>>
        + Send
        + Sync
        + 'static,
{
    struct FnHandler<F>(F);

    #[async_trait]
    impl<F> TurnHandler for FnHandler<F>
    where
        F: for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, AdapterResult<()>> + Send + Sync,
    {
        async fn on_turn(&self, ctx: &mut TurnContext) -> AdapterResult<()> {
            (self.0)(ctx).await
        }
    }

    Arc::new(FnHandler(f))
}

// =============================================================================
// Bot Adapter
// =============================================================================

/// The core adapter trait.
///
/// Each platform adapter implements the four per-turn I/O operations; the
/// rest of its surface (event ingestion, OAuth, serving) is
/// platform-specific and lives on the concrete type.
#[async_trait]
pub trait BotAdapter: Send + Sync {
    /// Delivers a batch of outbound activities in order.
    ///
    /// Returns one [`ResourceResponse`] per delivered activity. Activities
    /// the platform cannot deliver (e.g. non-message types) may be skipped;
    /// skipped activities yield a response with an empty id.
    async fn send_activities(
        &self,
        ctx: &TurnContext,
        activities: &[Activity],
    ) -> AdapterResult<Vec<ResourceResponse>>;

    /// Replaces the content of a previously delivered activity.
    async fn update_activity(&self, ctx: &TurnContext, activity: &Activity) -> AdapterResult<()>;

    /// Retracts a previously delivered activity.
    async fn delete_activity(
        &self,
        ctx: &TurnContext,
        reference: &ConversationReference,
    ) -> AdapterResult<()>;

    /// Resumes a conversation from a stored reference.
    ///
    /// Builds a continuation turn and runs `logic` against it. Middleware is
    /// not applied; the reference was captured from a turn that already ran
    /// the pipeline.
    async fn continue_conversation(
        self: Arc<Self>,
        reference: &ConversationReference,
        logic: BotHandler,
    ) -> AdapterResult<()>;
}
