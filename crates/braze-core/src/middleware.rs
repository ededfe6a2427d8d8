//! Middleware pipeline and the bot host.
//!
//! Middleware intercepts each inbound turn before the host's handler runs.
//! Each stage receives the mutable [`TurnContext`] and a [`Next`] that
//! resumes the remaining chain; a stage that does not call
//! [`Next::run`] short-circuits the turn.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::adapter::{BotHandler, TurnHandler};
use crate::context::TurnContext;
use crate::error::AdapterResult;

// =============================================================================
// Middleware
// =============================================================================

/// One interception point in the inbound-turn pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Processes the turn and optionally resumes the chain.
    async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> AdapterResult<()>;
}

/// The remaining pipeline after the current middleware.
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn TurnHandler,
}

impl Next<'_> {
    /// Runs the rest of the pipeline, ending with the host's handler.
    pub async fn run(self, ctx: &mut TurnContext) -> AdapterResult<()> {
        match self.stack.split_first() {
            Some((middleware, rest)) => {
                middleware
                    .on_turn(
                        ctx,
                        Next {
                            stack: rest,
                            endpoint: self.endpoint,
                        },
                    )
                    .await
            }
            None => self.endpoint.on_turn(ctx).await,
        }
    }
}

/// An ordered set of middleware.
#[derive(Default)]
pub struct MiddlewareSet {
    stack: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the end of the pipeline.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    /// Returns the number of registered middleware.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Runs the pipeline against one turn, ending with `endpoint`.
    pub async fn run(&self, ctx: &mut TurnContext, endpoint: &dyn TurnHandler) -> AdapterResult<()> {
        Next {
            stack: &self.stack,
            endpoint,
        }
        .run(ctx)
        .await
    }
}

// =============================================================================
// Bot Host
// =============================================================================

/// The host an adapter is initialized with: a middleware pipeline plus the
/// turn endpoint.
pub struct BotHost {
    middleware: MiddlewareSet,
    handler: BotHandler,
}

impl BotHost {
    /// Creates a host with the given endpoint and no middleware.
    pub fn new(handler: BotHandler) -> Self {
        Self {
            middleware: MiddlewareSet::new(),
            handler,
        }
    }

    /// Appends a middleware to the host's pipeline.
    pub fn use_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.use_middleware(middleware);
        self
    }

    /// Returns the host's endpoint.
    pub fn handler(&self) -> &BotHandler {
        &self.handler
    }

    /// Runs one turn through the pipeline and the endpoint.
    pub async fn run_turn(&self, ctx: &mut TurnContext) -> AdapterResult<()> {
        trace!(activity_type = %ctx.activity.activity_type, "Running turn");
        self.middleware.run(ctx, self.handler.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, ConversationReference, ResourceResponse};
    use crate::adapter::BotAdapter;
    use serde_json::json;

    struct NullAdapter;

    #[async_trait]
    impl BotAdapter for NullAdapter {
        async fn send_activities(
            &self,
            _ctx: &TurnContext,
            activities: &[Activity],
        ) -> AdapterResult<Vec<ResourceResponse>> {
            Ok(activities.iter().map(|_| ResourceResponse::default()).collect())
        }

        async fn update_activity(
            &self,
            _ctx: &TurnContext,
            _activity: &Activity,
        ) -> AdapterResult<()> {
            Ok(())
        }

        async fn delete_activity(
            &self,
            _ctx: &TurnContext,
            _reference: &ConversationReference,
        ) -> AdapterResult<()> {
            Ok(())
        }

        async fn continue_conversation(
            self: Arc<Self>,
            _reference: &ConversationReference,
            _logic: BotHandler,
        ) -> AdapterResult<()> {
            Ok(())
        }
    }

    struct Tag(&'static str);

    #[async_trait]
    impl Middleware for Tag {
        async fn on_turn(&self, ctx: &mut TurnContext, next: Next<'_>) -> AdapterResult<()> {
            push_trace(ctx, self.0);
            next.run(ctx).await
        }
    }

    struct Gate;

    #[async_trait]
    impl Middleware for Gate {
        async fn on_turn(&self, ctx: &mut TurnContext, _next: Next<'_>) -> AdapterResult<()> {
            push_trace(ctx, "gate");
            Ok(())
        }
    }

    struct Endpoint;

    #[async_trait]
    impl TurnHandler for Endpoint {
        async fn on_turn(&self, ctx: &mut TurnContext) -> AdapterResult<()> {
            push_trace(ctx, "endpoint");
            Ok(())
        }
    }

    fn push_trace(ctx: &mut TurnContext, label: &str) {
        let mut trace = ctx
            .get_state("trace")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();
        trace.push(json!(label));
        ctx.set_state("trace", trace);
    }

    fn trace_of(ctx: &TurnContext) -> Vec<String> {
        ctx.get_state("trace")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .iter()
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn ctx() -> TurnContext {
        TurnContext::new(Arc::new(NullAdapter), Activity::message("hi"))
    }

    #[tokio::test]
    async fn middleware_runs_in_registration_order() {
        let host = BotHost::new(Arc::new(Endpoint))
            .use_middleware(Tag("first"))
            .use_middleware(Tag("second"));

        let mut ctx = ctx();
        host.run_turn(&mut ctx).await.unwrap();
        assert_eq!(trace_of(&ctx), ["first", "second", "endpoint"]);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let host = BotHost::new(Arc::new(Endpoint))
            .use_middleware(Tag("first"))
            .use_middleware(Gate)
            .use_middleware(Tag("never"));

        let mut ctx = ctx();
        host.run_turn(&mut ctx).await.unwrap();
        assert_eq!(trace_of(&ctx), ["first", "gate"]);
    }

    #[tokio::test]
    async fn empty_pipeline_reaches_endpoint() {
        let host = BotHost::new(Arc::new(Endpoint));
        let mut ctx = ctx();
        host.run_turn(&mut ctx).await.unwrap();
        assert_eq!(trace_of(&ctx), ["endpoint"]);
    }
}
