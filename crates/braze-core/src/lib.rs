//! # Braze Core
//!
//! Framework contracts shared by Braze adapters and the hosts that embed
//! them.
//!
//! ## Overview
//!
//! The core vocabulary is deliberately small:
//!
//! - [`Activity`] — the single unit of inbound/outbound communication
//! - [`TurnContext`] — per-request context carrying the activity and the
//!   reply surface
//! - [`ConversationReference`] — opaque handle for resuming a conversation
//! - [`BotAdapter`] — the per-turn I/O contract adapters implement
//! - [`Middleware`] / [`MiddlewareSet`] — the inbound interception pipeline
//! - [`BotHost`] — middleware plus the turn endpoint, handed to an adapter
//!   at initialization
//!
//! Everything platform-specific (event normalization, Web API calls, OAuth)
//! lives in the adapter crates.

mod activity;
mod adapter;
mod context;
mod error;
mod middleware;

pub use activity::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, ConversationReference,
    ResourceResponse,
};
pub use adapter::{BotAdapter, BotHandler, TurnHandler, handler_fn};
pub use context::TurnContext;
pub use error::{AdapterError, AdapterResult, ApiError, ApiResult, ConfigError};
pub use middleware::{BotHost, Middleware, MiddlewareSet, Next};
