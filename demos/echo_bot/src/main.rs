//! Echo Bot Demo
//!
//! A minimal Slack bot built on the Braze framework. It echoes every
//! direct message and direct mention back to the sender, and answers the
//! `/ping` category check with `pong`.
//!
//! # Usage
//!
//! ```bash
//! SLACK_VERIFICATION_TOKEN=... SLACK_BOT_TOKEN=xoxb-... \
//!     cargo run --package echo-bot
//! ```
//!
//! Point a Slack app's Events API request URL at
//! `http://<host>:3000/api/messages`.

use anyhow::Result;
use braze::prelude::*;
use braze_adapter_slack::{
    FROM_BOT, SLACK_EVENT_TYPE, SlackAdapter, SlackEventMiddleware,
    SlackIdentifyBotsMiddleware, SlackMessageTypeMiddleware, server,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "A Slack echo bot")]
struct Args {
    /// Token Slack echoes with every request.
    #[arg(long, env = "SLACK_VERIFICATION_TOKEN")]
    verification_token: String,

    /// Bot token for a single-workspace installation.
    #[arg(long, env = "SLACK_BOT_TOKEN")]
    bot_token: String,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// OAuth redirect URI (only needed for multi-workspace installs).
    #[arg(long, default_value = "http://localhost:3000/install/auth")]
    redirect_uri: String,
}

/// Handles one turn: echo messages, answer pings, ignore other bots.
async fn echo(ctx: &mut TurnContext) -> AdapterResult<()> {
    if ctx.get_state(FROM_BOT).is_some() {
        return Ok(());
    }

    let category = ctx
        .get_state(SLACK_EVENT_TYPE)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let text = ctx.activity.text.clone().unwrap_or_default();

    match category.as_str() {
        "direct_message" | "direct_mention" => {
            if text.trim() == "ping" {
                ctx.reply_text("pong").await?;
            } else if !text.is_empty() {
                ctx.reply_text(&text).await?;
            }
        }
        "slash_command" => {
            ctx.reply_text(&format!("you said: {text}")).await?;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let adapter = SlackAdapter::builder()
        .verification_token(args.verification_token)
        .bot_token(args.bot_token)
        .redirect_uri(args.redirect_uri)
        .build()?;

    let host = BotHost::new(handler_fn(|ctx| Box::pin(echo(ctx))))
        .use_middleware(SlackEventMiddleware)
        .use_middleware(SlackMessageTypeMiddleware)
        .use_middleware(SlackIdentifyBotsMiddleware);
    adapter.init(host).await;

    let handle = server::serve(adapter, &args.listen).await?;
    info!(addr = %handle.local_addr(), "Echo bot ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    handle.shutdown().await;
    Ok(())
}
