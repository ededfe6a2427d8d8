//! # Braze
//!
//! A small, adapter-centric bot framework for Rust.
//!
//! ## Overview
//!
//! Braze keeps the framework surface deliberately thin: a shared activity
//! model, a per-turn context, and a middleware pipeline. Everything
//! platform-specific lives in adapter crates (e.g. `braze-adapter-slack`)
//! that translate between a platform's wire formats and the shared model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   activities   ┌────────────────┐   turns   ┌─────────────┐
//! │ Platform │───────────────▶│    Adapter     │──────────▶│   BotHost   │
//! │   APIs   │◀───────────────│ (per platform) │◀──────────│ middleware  │
//! └──────────┘   API calls    └────────────────┘  replies  │  + handler  │
//!                                                          └─────────────┘
//! ```
//!
//! - **Adapter**: normalizes inbound platform events into [`core::Activity`]
//!   values and delivers outbound activities back to the platform
//! - **BotHost**: the middleware pipeline plus the application's turn
//!   handler, attached to an adapter at initialization
//! - **TurnContext**: per-request context carrying the activity and the
//!   reply surface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use braze::prelude::*;
//!
//! let host = BotHost::new(handler_fn(|ctx| {
//!     Box::pin(async move {
//!         let text = ctx.activity.text.clone().unwrap_or_default();
//!         ctx.reply_text(&text).await?;
//!         Ok(())
//!     })
//! }));
//! ```

pub use braze_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use braze::prelude::*;
/// ```
pub mod prelude {
    pub use braze_core::{
        Activity, ActivityType, AdapterError, AdapterResult, BotAdapter, BotHandler, BotHost,
        ChannelAccount, ConversationAccount, ConversationReference, Middleware, MiddlewareSet,
        Next, ResourceResponse, TurnContext, TurnHandler, handler_fn,
    };
}
