//! Request executor for the Podargos device.
//!
//! # Design
//! `PodargosClient` holds its configuration and a single `Transport`. Every
//! public operation funnels into `execute_with_retries`, which makes up to
//! `retries + 1` sequential attempts. Each attempt gets the full configured
//! timeout; there is no deadline across attempts and no delay between them.
//!
//! Outcomes are split three ways:
//! - transport failure or timeout: retried, raised once the budget is spent;
//! - non-200 status: logged, returned as `Ok(None)`, never retried;
//! - 200: decoded as a JSON object whatever the content type, classified by
//!   its `response` field, and returned as-is.

use tokio::time::timeout;
use tracing::{debug, error, trace};

use crate::command::Command;
use crate::config::ClientConfig;
use crate::envelope::{Envelope, ResponseStatus, NOT_AVAILABLE};
use crate::error::Error;
use crate::http::{HttpRequest, HttpTransport, Transport};

/// Client for one Podargos device.
#[derive(Debug)]
pub struct PodargosClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl PodargosClient<HttpTransport> {
    /// Build a client with its own pooled HTTP connection handle.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new().map_err(|e| Error::Client(Box::new(e)))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> PodargosClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_request(&self, command: Command) -> HttpRequest {
        HttpRequest {
            url: format!(
                "http://{}:{}/{}/{}",
                self.config.host, self.config.port, command, self.config.key
            ),
        }
    }

    /// Query the door. The envelope is returned untouched; interpreting its
    /// `response` field is left to the caller.
    pub async fn state(&self) -> Result<Option<Envelope>, Error> {
        self.execute(Command::Get).await
    }

    /// Ask the door to open. `true` only when the device answered `OK`.
    pub async fn open(&self) -> Result<bool, Error> {
        let envelope = self.execute(Command::Open).await?;
        Ok(envelope.is_some_and(|e| e.is_ok()))
    }

    /// Ask the door to close. `true` only when the device answered `OK`.
    pub async fn close(&self) -> Result<bool, Error> {
        let envelope = self.execute(Command::Close).await?;
        Ok(envelope.is_some_and(|e| e.is_ok()))
    }

    /// Run `command` with the configured retry budget.
    pub async fn execute(&self, command: Command) -> Result<Option<Envelope>, Error> {
        self.execute_with_retries(command, self.config.retries).await
    }

    pub async fn execute_with_retries(
        &self,
        command: Command,
        retries: u32,
    ) -> Result<Option<Envelope>, Error> {
        let request = self.build_request(command);
        let budget = self.config.timeout();
        let mut retries_left = retries;
        let mut attempt: u32 = 1;

        let response = loop {
            debug!(%command, attempt, retries_left, "sending podargos request");

            let failure = match timeout(budget, self.transport.get(&request)).await {
                Ok(Ok(response)) => break response,
                Ok(Err(err)) => Error::Transport(err),
                Err(_) => Error::Timeout(budget),
            };

            if retries_left == 0 {
                match &failure {
                    Error::Transport(err) => {
                        let detail = error_chain(err.as_ref());
                        error!(%command, attempt, "error connecting to podargos: {detail}")
                    }
                    _ => error!(%command, attempt, "timed out when connecting to podargos"),
                }
                return Err(failure);
            }

            debug!(%command, attempt, error = %failure, "podargos attempt failed, retrying");
            retries_left -= 1;
            attempt += 1;
        };

        if response.status != 200 {
            let status = response.status;
            error!(%command, status, "error {status} connecting to podargos");
            return Ok(None);
        }

        trace!(
            %command,
            content_type = response.content_type().unwrap_or(NOT_AVAILABLE),
            bytes = response.body.len(),
            "decoding podargos response"
        );
        let envelope = Envelope::from_slice(&response.body).inspect_err(|err| {
            error!(%command, "invalid JSON from podargos: {err}");
        })?;

        match envelope.status() {
            ResponseStatus::Ok => {}
            ResponseStatus::Error => {
                let message = envelope.message().unwrap_or(NOT_AVAILABLE);
                error!(%command, "error in response from podargos: {message}");
            }
            ResponseStatus::Other(state) => {
                error!(%command, "invalid response from podargos: {state}");
            }
        }

        Ok(Some(envelope))
    }
}

/// Render an error and every `source()` below it, joined with `: `.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::error::BoxError;
    use crate::http::HttpResponse;

    /// What the scripted transport does on one attempt.
    enum Reply {
        Respond {
            status: u16,
            content_type: Option<&'static str>,
            body: &'static str,
        },
        Fail,
        Hang,
    }

    fn json(body: &'static str) -> Reply {
        Reply::Respond {
            status: 200,
            content_type: Some("application/json"),
            body,
        }
    }

    /// Mirrors how HTTP clients wrap the socket error behind a generic one.
    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct SendError(#[source] io::Error);

    /// Replays `replies` in order, then keeps failing.
    struct Scripted {
        replies: Mutex<VecDeque<Reply>>,
        attempts: Arc<AtomicUsize>,
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            let transport = Scripted {
                replies: Mutex::new(replies.into()),
                attempts: attempts.clone(),
                urls: Arc::new(Mutex::new(Vec::new())),
            };
            (transport, attempts)
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(request.url.clone());
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Fail);
            match reply {
                Reply::Respond {
                    status,
                    content_type,
                    body,
                } => Ok(HttpResponse {
                    status,
                    headers: content_type
                        .map(|ct| vec![("content-type".to_string(), ct.to_string())])
                        .unwrap_or_default(),
                    body: body.as_bytes().to_vec(),
                }),
                Reply::Fail => Err(Box::new(SendError(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn client(replies: Vec<Reply>) -> (PodargosClient<Scripted>, Arc<AtomicUsize>) {
        let (transport, attempts) = Scripted::new(replies);
        let config = ClientConfig::new("10.0.0.7", 8080, "s3cret");
        (PodargosClient::with_transport(config, transport), attempts)
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Route `tracing` output on this thread into a buffer.
    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::ERROR)
            .with_writer(move || writer.clone())
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    #[test]
    fn build_request_embeds_command_and_key() {
        let (client, _) = client(Vec::new());
        assert_eq!(
            client.build_request(Command::Get).url,
            "http://10.0.0.7:8080/get/s3cret"
        );
        assert_eq!(
            client.build_request(Command::Open).url,
            "http://10.0.0.7:8080/open/s3cret"
        );
        assert_eq!(
            client.build_request(Command::Close).url,
            "http://10.0.0.7:8080/close/s3cret"
        );
    }

    #[tokio::test]
    async fn open_and_close_return_true_on_ok() {
        let ok = || json(r#"{"response":"OK"}"#);
        let (client, attempts) = client(vec![ok(), ok()]);
        assert!(client.open().await.unwrap());
        assert!(client.close().await.unwrap());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn open_returns_false_and_logs_message_on_error_envelope() {
        let (logs, _guard) = capture_logs();
        let (client, _) = client(vec![json(r#"{"response":"ERROR","message":"door jammed"}"#)]);

        assert!(!client.open().await.unwrap());
        assert!(logs.contents().contains("door jammed"));
    }

    #[tokio::test]
    async fn close_returns_false_on_error_envelope() {
        let (client, _) = client(vec![json(r#"{"response":"ERROR","message":"x"}"#)]);
        assert!(!client.close().await.unwrap());
    }

    #[tokio::test]
    async fn error_envelope_without_message_logs_placeholder() {
        let (logs, _guard) = capture_logs();
        let (client, _) = client(vec![json(r#"{"response":"ERROR"}"#)]);

        let envelope = client.execute(Command::Open).await.unwrap().unwrap();
        assert_eq!(envelope.response(), Some("ERROR"));
        assert!(logs.contents().contains("error in response from podargos: N/A"));
    }

    #[tokio::test]
    async fn unexpected_response_is_logged_and_returned() {
        let (logs, _guard) = capture_logs();
        let (client, _) = client(vec![json(r#"{"response":"MAYBE"}"#)]);

        let envelope = client.execute(Command::Open).await.unwrap().unwrap();
        assert_eq!(envelope.response(), Some("MAYBE"));
        assert!(logs.contents().contains("invalid response from podargos: MAYBE"));
    }

    #[tokio::test]
    async fn ok_response_logs_nothing() {
        let (logs, _guard) = capture_logs();
        let (client, _) = client(vec![json(r#"{"response":"OK"}"#)]);

        client.execute(Command::Close).await.unwrap();
        assert!(logs.contents().is_empty());
    }

    #[tokio::test]
    async fn non_200_returns_none_without_retry() {
        let (logs, _guard) = capture_logs();
        let (client, attempts) = client(vec![Reply::Respond {
            status: 503,
            content_type: None,
            body: "",
        }]);

        assert!(client.execute(Command::Get).await.unwrap().is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(logs.contents().contains("error 503 connecting to podargos"));
    }

    #[tokio::test]
    async fn open_and_close_return_false_on_non_200() {
        let forbidden = || Reply::Respond {
            status: 403,
            content_type: None,
            body: "",
        };
        let (client, attempts) = client(vec![forbidden(), forbidden()]);

        assert!(!client.open().await.unwrap());
        assert!(!client.close().await.unwrap());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_exhausts_retries_then_raises() {
        let (logs, _guard) = capture_logs();
        let (client, attempts) = client(Vec::new());

        let err = client.execute_with_retries(Command::Open, 2).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(logs
            .contents()
            .contains("error connecting to podargos: error sending request: connection refused"));
    }

    #[test]
    fn error_chain_walks_every_source() {
        let err = SendError(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(error_chain(&err), "error sending request: refused");

        let plain = io::Error::other("reset");
        assert_eq!(error_chain(&plain), "reset");
    }

    #[tokio::test]
    async fn open_propagates_exhausted_transport_failure() {
        let (client, attempts) = client(Vec::new());
        assert!(matches!(client.open().await, Err(Error::Transport(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let (client, attempts) = client(Vec::new());
        assert!(client.execute_with_retries(Command::Get, 0).await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_one_transport_failure() {
        let (client, attempts) = client(vec![Reply::Fail, json(r#"{"response":"OK"}"#)]);

        let envelope = client
            .execute_with_retries(Command::Open, 2)
            .await
            .unwrap()
            .unwrap();
        assert!(envelope.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_retried_then_raised() {
        let (logs, _guard) = capture_logs();
        let (client, attempts) = client(vec![Reply::Hang, Reply::Hang, Reply::Hang]);

        let err = client.execute(Command::Get).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(10)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(logs.contents().contains("timed out when connecting to podargos"));
    }

    #[tokio::test(start_paused = true)]
    async fn each_attempt_gets_a_fresh_timeout() {
        let (client, _) = client(vec![Reply::Hang, Reply::Hang, json(r#"{"response":"OK"}"#)]);
        let started = tokio::time::Instant::now();

        assert!(client.open().await.unwrap());
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn decodes_body_without_content_type() {
        let (client, _) = client(vec![Reply::Respond {
            status: 200,
            content_type: None,
            body: r#"{"response":"OK"}"#,
        }]);
        assert!(client.open().await.unwrap());
    }

    #[tokio::test]
    async fn decodes_body_with_wrong_content_type() {
        let (client, _) = client(vec![Reply::Respond {
            status: 200,
            content_type: Some("text/html"),
            body: r#"{"response":"OK"}"#,
        }]);
        assert!(client.close().await.unwrap());
    }

    #[tokio::test]
    async fn state_returns_envelope_unchanged() {
        let (client, _) = client(vec![json(r#"{"response":"OPENING","position":40}"#)]);

        let envelope = client.state().await.unwrap().unwrap();
        assert_eq!(envelope.response(), Some("OPENING"));
        assert_eq!(envelope.get("position"), Some(&Value::from(40)));
        assert_eq!(envelope.as_map().len(), 2);
    }

    #[tokio::test]
    async fn invalid_json_raises_without_retry() {
        let (client, attempts) = client(vec![Reply::Respond {
            status: 200,
            content_type: None,
            body: "<html>oops</html>",
        }]);

        assert!(matches!(client.state().await, Err(Error::Decode(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_attempt_targets_the_same_url() {
        let (transport, _) = Scripted::new(vec![Reply::Fail, json(r#"{"response":"OK"}"#)]);
        let urls = transport.urls.clone();
        let config = ClientConfig::new("podargos", 80, "k");
        let client = PodargosClient::with_transport(config, transport);

        client.close().await.unwrap();
        assert_eq!(
            *urls.lock().unwrap(),
            vec!["http://podargos:80/close/k".to_string(); 2]
        );
    }
}
