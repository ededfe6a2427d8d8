//! Wire models: inbound event payloads, outbound messages, and typed Web
//! API responses.

pub mod api;
pub mod event;
pub mod message;

pub use api::{
    AuthTestResponse, OauthAccessResponse, OauthAuthedUser, OauthTeam, PostEphemeralResponse,
    PostMessageResponse,
};
pub use event::{EventCallback, IdRef, InboundPayload, InteractivePayload, SlashCommand};
pub use message::OutboundMessage;
