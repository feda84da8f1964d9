// request orchestration - validate, moderate, relay, and always hand back an envelope

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::Error;
use crate::core::audit::{Audit, Event, TracingAudit};
use crate::core::moderation::Moderation;
use crate::core::persona;
use crate::core::relay::{Relay, Turn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: Option<String>,
    pub child_id: Option<String>,
    pub user_name: Option<String>,
    pub conversation_history: Option<Vec<Turn>>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            child_id: Some(child_id.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.conversation_history = Some(history);
        self
    }
}

/// The one response shape for every handled outcome. Callers read the flags,
/// not the status code, to tell a degraded reply from a real one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: String,
    #[serde(rename = "childId", default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub safety_flagged: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub safety_checked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub openai_used: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub error_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ChatResponse {
    fn new(response: String, child_id: Option<String>, user_name: Option<String>) -> Self {
        Self {
            response,
            timestamp: timestamp(),
            child_id,
            user_name,
            safety_flagged: false,
            safety_checked: false,
            openai_used: false,
            error_fallback: false,
            error_message: None,
        }
    }

    fn fallback(
        child_id: Option<String>,
        user_name: Option<String>,
        prompt: Option<&str>,
        error: String,
    ) -> Self {
        let response = persona::fallback_reply(user_name.as_deref(), prompt);
        Self {
            error_fallback: true,
            error_message: Some(error),
            ..Self::new(response, child_id, user_name)
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-01T12:00:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct Chat {
    relay: Arc<dyn Relay>,
    moderation: Moderation,
    audit: Arc<dyn Audit>,
    timeout: Duration,
}

impl Chat {
    pub fn new(relay: Arc<dyn Relay>) -> Self {
        Self {
            relay,
            moderation: Moderation::default(),
            audit: Arc::new(TracingAudit),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_moderation(mut self, moderation: Moderation) -> Self {
        self.moderation = moderation;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn Audit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn moderation(&self) -> &Moderation {
        &self.moderation
    }

    /// Only [`Error::Validation`] comes back as `Err`. Upstream trouble of any
    /// kind turns into a fallback envelope.
    pub async fn handle(&self, req: ChatRequest) -> Result<ChatResponse, Error> {
        let (prompt, child_id) = match (req.prompt.as_deref(), req.child_id.as_deref()) {
            (Some(p), Some(c)) if !p.is_empty() && !c.is_empty() => (p, c),
            _ => {
                warn!("missing prompt or childId");
                return Err(Error::Validation);
            }
        };

        let display_name = req.user_name.as_deref().unwrap_or(persona::DEFAULT_NAME);
        let history = req.conversation_history.as_deref().unwrap_or_default();

        info!(
            caller_id = child_id,
            display_name,
            history_len = history.len(),
            "chat request"
        );

        let verdict = self.moderation.evaluate(prompt);
        if verdict.flagged {
            return Ok(self.blocked(
                req.child_id.clone(),
                req.user_name.clone(),
                prompt,
                verdict.reason,
            ));
        }

        self.audit.record(Event::UpstreamCall {
            caller_id: child_id.to_string(),
            display_name: display_name.to_string(),
            prompt: prompt.to_string(),
            history_len: history.len(),
        });

        let result = tokio::time::timeout(
            self.timeout,
            self.relay.complete(prompt, display_name, history),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::Transport(format!(
                "upstream timed out after {}s",
                self.timeout.as_secs_f32()
            )))
        });

        match result {
            Ok(text) => {
                self.audit.record(Event::UpstreamSuccess {
                    caller_id: child_id.to_string(),
                    response_len: text.len(),
                });

                Ok(ChatResponse {
                    safety_checked: true,
                    openai_used: true,
                    ..ChatResponse::new(text, req.child_id.clone(), req.user_name.clone())
                })
            }
            Err(e) => {
                self.audit.record(Event::UpstreamFailure {
                    caller_id: child_id.to_string(),
                    error: e.to_string(),
                });

                Ok(ChatResponse::fallback(
                    req.child_id.clone(),
                    req.user_name.clone(),
                    Some(prompt),
                    e.to_string(),
                ))
            }
        }
    }

    /// Like [`Chat::handle`], but starts from a raw request body. A body that
    /// does not decode still goes through the gate and then gets a fallback
    /// envelope, with whatever identifiers a loose JSON read can recover.
    pub async fn handle_body(&self, body: &[u8]) -> Result<ChatResponse, Error> {
        let err = match serde_json::from_slice::<ChatRequest>(body) {
            Ok(req) => return self.handle(req).await,
            Err(e) => Error::from(e),
        };

        let loose: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let field = |key: &str| {
            loose
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let prompt = field("prompt");
        let child_id = field("childId");
        let user_name = field("userName");

        // well-formed json missing the basics is still a validation failure
        if loose.is_object() && (prompt.is_none() || child_id.is_none()) {
            warn!("missing prompt or childId");
            return Err(Error::Validation);
        }

        // a broken history or name must not let a blocked prompt through
        if let Some(p) = prompt.as_deref() {
            let verdict = self.moderation.evaluate(p);
            if verdict.flagged {
                return Ok(self.blocked(child_id, user_name, p, verdict.reason));
            }
        }

        self.audit.record(Event::Unreadable {
            caller_id: child_id.clone(),
            error: err.to_string(),
        });

        Ok(ChatResponse::fallback(
            child_id,
            user_name,
            prompt.as_deref(),
            err.to_string(),
        ))
    }

    fn blocked(
        &self,
        child_id: Option<String>,
        user_name: Option<String>,
        prompt: &str,
        reason: Option<String>,
    ) -> ChatResponse {
        let display_name = user_name.as_deref().unwrap_or(persona::DEFAULT_NAME);
        let response = persona::blocked_reply(display_name);

        self.audit.record(Event::Blocked {
            caller_id: child_id.clone().unwrap_or_default(),
            display_name: display_name.to_string(),
            prompt: prompt.to_string(),
            reason: reason.unwrap_or_default(),
        });

        ChatResponse {
            safety_flagged: true,
            ..ChatResponse::new(response, child_id, user_name)
        }
    }
}
