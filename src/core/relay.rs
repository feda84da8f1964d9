// completion relay - persona + recent history + prompt, sent to openai

use crate::Error;
use crate::core::persona;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MODEL: &str = "gpt-3.5-turbo";
pub const MAX_TOKENS: u32 = 300;
pub const TEMPERATURE: f32 = 0.7;
/// How many trailing history turns go upstream.
pub const HISTORY_WINDOW: usize = 6;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior message supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

// what goes over the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'static str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

// what comes back
#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
pub trait Relay: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        display_name: &str,
        history: &[Turn],
    ) -> Result<String, Error>;
}

/// System turn, the last [`HISTORY_WINDOW`] turns in order, then the prompt.
pub fn build_messages(prompt: &str, display_name: &str, history: &[Turn]) -> Vec<Message> {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(Message {
        role: "system",
        content: persona::system_prompt(display_name),
    });
    messages.extend(recent.iter().map(|turn| Message {
        role: turn.role.as_str(),
        content: turn.content.clone(),
    }));
    messages.push(Message {
        role: "user",
        content: prompt.to_string(),
    });

    messages
}

pub struct OpenAi {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAi {
    // a missing key is only an error once someone actually asks something
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Relay for OpenAi {
    async fn complete(
        &self,
        prompt: &str,
        display_name: &str,
        history: &[Turn],
    ) -> Result<String, Error> {
        let api_key = self.api_key.as_deref().ok_or(Error::UpstreamUnavailable)?;

        let messages = build_messages(prompt, display_name, history);
        let request = Request {
            model: MODEL,
            messages: &messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "upstream responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let response: Response = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Transport("upstream response had no completion text".into()))
    }
}
