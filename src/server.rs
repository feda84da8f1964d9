// http server - the chat endpoint the front end talks to

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{
        HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
        },
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use crate::Error;
use crate::core::{Chat, persona, timestamp};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, x-ms-request-id";
const MAX_AGE: &str = "86400";

#[derive(Serialize)]
struct ProbeResponse {
    message: &'static str,
    timestamp: String,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct Server;

impl Server {
    /// Every response gets the CORS headers, preflight or not.
    pub fn router(chat: Arc<Chat>, allow_origin: &str) -> Result<Router, Error> {
        let origin = HeaderValue::from_str(allow_origin)
            .map_err(|e| Error::Server(format!("bad allow-origin {allow_origin:?}: {e}")))?;

        let router = Router::new()
            .route("/health", get(health))
            .route("/chat", get(probe).post(chat_handler).options(preflight))
            // path the existing web client already calls
            .route(
                "/api/chatproxy",
                get(probe).post(chat_handler).options(preflight),
            )
            .layer(TraceLayer::new_for_http())
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                origin,
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static(MAX_AGE),
            ))
            .with_state(chat);

        Ok(router)
    }

    pub async fn run(
        chat: Arc<Chat>,
        allow_origin: &str,
        host: &str,
        port: u16,
    ) -> Result<(), Error> {
        let app = Self::router(chat, allow_origin)?;

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!(%addr, version = env!("CARGO_PKG_VERSION"), "wally listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// liveness probe, touches nothing
async fn probe() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        message: persona::health_message(),
        timestamp: timestamp(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn chat_handler(State(chat): State<Arc<Chat>>, body: Bytes) -> Response {
    match chat.handle_body(&body).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
