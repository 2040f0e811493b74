//! Async client for the Podargos door actuator.
//!
//! # Overview
//! The device speaks plain HTTP: `GET /<command>/<key>` answered by a JSON
//! envelope such as `{"response":"OK"}`. `PodargosClient` builds those
//! requests, runs each attempt under a timeout, retries transport failures,
//! and classifies the envelope it gets back.
//!
//! # Design
//! - One `PodargosClient` owns one `Transport` handle for its lifetime.
//! - Transport failures and timeouts are retried without backoff. A non-200
//!   status is not retried and surfaces as `Ok(None)`.
//! - Application errors inside a 200 envelope are logged through `tracing`
//!   and returned as data.
//! - `DoorState` is offered to callers; the client never produces it.

pub mod client;
pub mod command;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod state;

pub use client::PodargosClient;
pub use command::Command;
pub use config::ClientConfig;
pub use envelope::{Envelope, ResponseStatus};
pub use error::{BoxError, ConfigError, Error};
pub use http::{HttpRequest, HttpResponse, HttpTransport, Transport};
pub use state::DoorState;
