// shared stubs for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wally::{Audit, Chat, Error, Event, Relay, Role, Turn};

pub enum Behavior {
    Reply(String),
    Status(u16),
    Unavailable,
    Hang,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub prompt: String,
    pub display_name: String,
    pub history: Vec<Turn>,
}

pub struct StubRelay {
    behavior: Behavior,
    calls: Mutex<Vec<Call>>,
}

impl StubRelay {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Behavior::Reply(text.to_string()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Relay for StubRelay {
    async fn complete(
        &self,
        prompt: &str,
        display_name: &str,
        history: &[Turn],
    ) -> Result<String, Error> {
        self.calls.lock().unwrap().push(Call {
            prompt: prompt.to_string(),
            display_name: display_name.to_string(),
            history: history.to_vec(),
        });

        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Status(status) => Err(Error::Upstream {
                status: *status,
                body: "{\"error\":\"boom\"}".to_string(),
            }),
            Behavior::Unavailable => Err(Error::UpstreamUnavailable),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<Event>>,
}

impl RecordingAudit {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl Audit for RecordingAudit {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn chat_with(relay: Arc<StubRelay>) -> (Chat, Arc<RecordingAudit>) {
    let audit = Arc::new(RecordingAudit::default());
    let chat = Chat::new(relay).with_audit(audit.clone());
    (chat, audit)
}

/// Alternating user/assistant turns numbered from 1.
pub fn synthetic_history(n: usize) -> Vec<Turn> {
    (1..=n)
        .map(|i| Turn {
            role: if i % 2 == 1 { Role::User } else { Role::Assistant },
            content: format!("turn {i}"),
        })
        .collect()
}
