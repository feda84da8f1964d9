// tests for the openai relay against a local stand-in server

mod common;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use common::synthetic_history;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wally::{Error, OpenAi, Relay};

struct Upstream {
    status: StatusCode,
    reply: Value,
    seen: Mutex<Vec<(Option<String>, Value)>>,
}

async fn completions(
    State(up): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    up.seen.lock().unwrap().push((auth, body));
    (up.status, Json(up.reply.clone()))
}

async fn spawn_upstream(status: StatusCode, reply: Value) -> (String, Arc<Upstream>) {
    let up = Arc::new(Upstream {
        status,
        reply,
        seen: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(up.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), up)
}

fn ok_reply(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

#[tokio::test]
async fn test_request_shape() {
    let (url, up) = spawn_upstream(StatusCode::OK, ok_reply("Great question! ...")).await;
    let relay = OpenAi::new(Some("sk-test".into()), url);

    let text = relay
        .complete("how do I build a gear train", "Ada", &[])
        .await
        .unwrap();
    assert_eq!(text, "Great question! ...");

    let seen = up.seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 300);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"].as_str().unwrap().contains("Ada"));
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "how do I build a gear train");
}

#[tokio::test]
async fn test_only_last_six_turns_are_sent() {
    let (url, up) = spawn_upstream(StatusCode::OK, ok_reply("ok")).await;
    let relay = OpenAi::new(Some("sk-test".into()), url);

    relay
        .complete("what next?", "Ada", &synthetic_history(10))
        .await
        .unwrap();

    let seen = up.seen.lock().unwrap();
    let messages = seen[0].1["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 8);

    // turns 5..=10, odd turns are the user's
    for (offset, msg) in messages[1..7].iter().enumerate() {
        let n = offset + 5;
        assert_eq!(msg["content"], format!("turn {n}"));
        let role = if n % 2 == 1 { "user" } else { "assistant" };
        assert_eq!(msg["role"], role);
    }
    assert_eq!(messages[7]["content"], "what next?");
}

#[tokio::test]
async fn test_reply_text_is_verbatim() {
    let text = "  **Gears!**\n\nLet's count teeth together.  ";
    let (url, _) = spawn_upstream(StatusCode::OK, ok_reply(text)).await;
    let relay = OpenAi::new(Some("sk-test".into()), url);

    assert_eq!(relay.complete("gears", "Ada", &[]).await.unwrap(), text);
}

#[tokio::test]
async fn test_non_success_status() {
    let body = json!({ "error": { "message": "rate limited" } });
    let (url, _) = spawn_upstream(StatusCode::TOO_MANY_REQUESTS, body).await;
    let relay = OpenAi::new(Some("sk-test".into()), url);

    match relay.complete("hi", "Ada", &[]).await {
        Err(Error::Upstream { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_choices_is_transport_error() {
    let (url, _) = spawn_upstream(StatusCode::OK, json!({ "choices": [] })).await;
    let relay = OpenAi::new(Some("sk-test".into()), url);

    let err = relay.complete("hi", "Ada", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_missing_key_never_calls_out() {
    let (url, up) = spawn_upstream(StatusCode::OK, ok_reply("ok")).await;
    let relay = OpenAi::new(None, url);

    let err = relay.complete("hi", "Ada", &[]).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable));
    assert!(up.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let relay = OpenAi::new(Some("sk-test".into()), format!("http://{addr}"));
    let err = relay.complete("hi", "Ada", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
