// core logic - moderation, completion relay, and request orchestration

pub mod audit;
mod chat;
mod moderation;
pub mod persona;
pub mod relay;

pub use audit::{Audit, Event, TracingAudit};
pub use chat::{Chat, ChatRequest, ChatResponse, DEFAULT_TIMEOUT, timestamp};
pub use moderation::{Moderation, Verdict};
pub use relay::{OpenAi, Relay, Role, Turn};
