//! # Braze Adapter for Slack
//!
//! This crate connects the Braze bot-framework contracts to Slack.
//!
//! ## Overview
//!
//! The adapter handles:
//!
//! - Receiving Events API deliveries, slash commands, and interactive
//!   payloads over HTTP and normalizing them into framework activities
//! - Sending, updating, and deleting messages through Slack's Web API
//! - Single-workspace (static bot token) and multi-workspace (per-team
//!   token resolver plus OAuth install flow) operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use braze_adapter_slack::{SlackAdapter, SlackEventMiddleware, server};
//! use braze_core::{BotHost, handler_fn};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let adapter = SlackAdapter::builder()
//!         .verification_token(std::env::var("SLACK_VERIFICATION_TOKEN")?)
//!         .bot_token(std::env::var("SLACK_BOT_TOKEN")?)
//!         .redirect_uri("https://example.com/install/auth")
//!         .build()?;
//!
//!     let host = BotHost::new(handler_fn(|ctx| {
//!         Box::pin(async move {
//!             let text = ctx.activity.text.clone().unwrap_or_default();
//!             ctx.reply_text(&text).await?;
//!             Ok(())
//!         })
//!     }))
//!     .use_middleware(SlackEventMiddleware);
//!
//!     adapter.init(host).await;
//!     server::serve(adapter, "0.0.0.0:3000").await?.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Middleware
//!
//! Three Slack-aware middlewares refine inbound turns before application
//! logic runs:
//!
//! - [`SlackEventMiddleware`]: reclassify Events API deliveries by their
//!   inner event type
//! - [`SlackMessageTypeMiddleware`]: label turns as direct message,
//!   mention, slash command, and so on
//! - [`SlackIdentifyBotsMiddleware`]: flag turns authored by other bots

mod adapter;

pub mod client;
pub mod config;
pub mod middleware;
pub mod model;
pub mod server;

/// Channel name this adapter stamps on every activity.
pub const CHANNEL_ID: &str = "slack";

pub use adapter::{InboundReply, SlackAdapter, SlackAdapterBuilder};
pub use client::SlackWebClient;
pub use config::{SlackAdapterOptions, TokenResolver};
pub use middleware::{
    FROM_BOT, SLACK_EVENT_TYPE, SlackEventMiddleware, SlackIdentifyBotsMiddleware,
    SlackMessageTypeMiddleware,
};
pub use model::{InboundPayload, OutboundMessage};
pub use server::{ServeHandle, router, serve};
