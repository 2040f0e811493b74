//! Simulated Podargos door actuator.
//!
//! Serves `GET /get/{key}`, `GET /open/{key}` and `GET /close/{key}` the way
//! the real controller does: JSON text in a `text/plain` body, 403 for a
//! wrong key, and an `ERROR` envelope when a command makes no sense for the
//! current door position. Door travel is modelled as elapsed time since the
//! last accepted command.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::RwLock};

/// Position of the simulated door, as reported by `get`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Closed,
    Opening,
    Opened,
    Closing,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Closed => "CLOSED",
            Position::Opening => "OPENING",
            Position::Opened => "OPENED",
            Position::Closing => "CLOSING",
        }
    }
}

/// Body the device answers with.
#[derive(Clone, Debug, Serialize)]
pub struct Reply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Reply {
    fn ok() -> Self {
        Reply {
            response: "OK".to_string(),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Reply {
            response: "ERROR".to_string(),
            message: Some(message),
        }
    }

    fn state(position: Position) -> Self {
        Reply {
            response: position.as_str().to_string(),
            message: None,
        }
    }
}

#[derive(Debug)]
struct Motion {
    opening: bool,
    started: Instant,
}

#[derive(Debug)]
struct Door {
    motion: Option<Motion>,
    travel: Duration,
}

impl Door {
    fn position(&self) -> Position {
        match &self.motion {
            None => Position::Closed,
            Some(m) => {
                let done = m.started.elapsed() >= self.travel;
                match (m.opening, done) {
                    (true, false) => Position::Opening,
                    (true, true) => Position::Opened,
                    (false, false) => Position::Closing,
                    (false, true) => Position::Closed,
                }
            }
        }
    }

    fn start(&mut self, opening: bool) {
        self.motion = Some(Motion {
            opening,
            started: Instant::now(),
        });
    }
}

/// Simulator configuration and shared door state.
#[derive(Clone, Debug)]
pub struct Device {
    key: Arc<str>,
    door: Arc<RwLock<Door>>,
}

impl Device {
    /// A closed door guarded by `key`, taking `travel` to open or close.
    pub fn new(key: &str, travel: Duration) -> Self {
        Device {
            key: Arc::from(key),
            door: Arc::new(RwLock::new(Door {
                motion: None,
                travel,
            })),
        }
    }

    pub async fn position(&self) -> Position {
        self.door.read().await.position()
    }
}

pub fn app(device: Device) -> Router {
    Router::new()
        .route("/get/{key}", get(get_state))
        .route("/open/{key}", get(open_door))
        .route("/close/{key}", get(close_door))
        .with_state(device)
}

pub async fn run(listener: TcpListener, device: Device) -> Result<(), std::io::Error> {
    axum::serve(listener, app(device)).await
}

/// Serialize like the controller firmware: JSON text labelled `text/plain`.
fn reply(body: Reply) -> Response {
    match serde_json::to_string(&body) {
        Ok(text) => ([(header::CONTENT_TYPE, "text/plain")], text).into_response(),
        Err(e) => {
            tracing::error!("failed to encode reply: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn authorize(device: &Device, key: &str) -> Result<(), StatusCode> {
    if key == &*device.key {
        Ok(())
    } else {
        tracing::warn!("rejected request with wrong key");
        Err(StatusCode::FORBIDDEN)
    }
}

async fn get_state(State(device): State<Device>, Path(key): Path<String>) -> Response {
    if let Err(status) = authorize(&device, &key) {
        return status.into_response();
    }
    let position = device.position().await;
    tracing::debug!(position = position.as_str(), "state queried");
    reply(Reply::state(position))
}

async fn open_door(State(device): State<Device>, Path(key): Path<String>) -> Response {
    command(device, key, true).await
}

async fn close_door(State(device): State<Device>, Path(key): Path<String>) -> Response {
    command(device, key, false).await
}

async fn command(device: Device, key: String, opening: bool) -> Response {
    if let Err(status) = authorize(&device, &key) {
        return status.into_response();
    }

    let mut door = device.door.write().await;
    let position = door.position();
    let redundant = match position {
        Position::Opening | Position::Opened => opening,
        Position::Closing | Position::Closed => !opening,
    };
    if redundant {
        tracing::info!(position = position.as_str(), "ignoring redundant command");
        return reply(Reply::error(format!(
            "door already {}",
            position.as_str().to_lowercase()
        )));
    }

    door.start(opening);
    tracing::info!(opening, "door set in motion");
    reply(Reply::ok())
}
