// audit trail for moderation and upstream decisions

use tracing::{info, warn};

/// One decision point in the request lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Blocked {
        caller_id: String,
        display_name: String,
        prompt: String,
        reason: String,
    },
    UpstreamCall {
        caller_id: String,
        display_name: String,
        prompt: String,
        history_len: usize,
    },
    UpstreamSuccess {
        caller_id: String,
        response_len: usize,
    },
    UpstreamFailure {
        caller_id: String,
        error: String,
    },
    /// Body did not decode; a fallback went out without calling upstream.
    Unreadable {
        caller_id: Option<String>,
        error: String,
    },
}

pub trait Audit: Send + Sync {
    fn record(&self, event: Event);
}

/// Default sink: structured `tracing` events under the `wally::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl Audit for TracingAudit {
    fn record(&self, event: Event) {
        match event {
            Event::Blocked {
                caller_id,
                display_name,
                prompt,
                reason,
            } => warn!(
                target: "wally::audit",
                %caller_id, %display_name, %prompt, %reason,
                "blocked inappropriate content"
            ),
            Event::UpstreamCall {
                caller_id,
                display_name,
                prompt,
                history_len,
            } => info!(
                target: "wally::audit",
                %caller_id, %display_name, %prompt, history_len,
                "calling upstream"
            ),
            Event::UpstreamSuccess {
                caller_id,
                response_len,
            } => info!(
                target: "wally::audit",
                %caller_id, response_len,
                "upstream success"
            ),
            Event::UpstreamFailure { caller_id, error } => warn!(
                target: "wally::audit",
                %caller_id, %error,
                "upstream failed, sending fallback"
            ),
            Event::Unreadable { caller_id, error } => warn!(
                target: "wally::audit",
                caller_id = caller_id.as_deref().unwrap_or("-"),
                %error,
                "unreadable chat request, sending fallback"
            ),
        }
    }
}
