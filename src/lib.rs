// wally library - family-friendly chat relay

pub mod cli;
pub mod core;
mod error;
mod server;

pub use crate::core::{
    Audit, Chat, ChatRequest, ChatResponse, Event, Moderation, OpenAi, Relay, Role, Turn, Verdict,
};
pub use error::Error;
pub use server::Server;
