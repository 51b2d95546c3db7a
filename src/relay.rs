use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Bounded wait for the webhook to answer.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Reply rendered when the webhook cannot be reached at all.
pub const FALLBACK_REPLY: &str = "Sorry, the connection to the automation \
backend failed. Check that the workflow is published and ACTIVE (production \
URL).";

#[derive(Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
}

/// Terminal state of one relayed message. Every variant yields exactly one
/// assistant turn for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// 2xx with a string `response` field, returned verbatim.
    Replied(String),
    /// 2xx but the body was degraded; carries the diagnostic text.
    RepliedWithWarning(String),
    /// Network error, timeout, or non-2xx status. `detail` is the raw error
    /// for the operator notification.
    Failed { detail: String },
}

impl RelayOutcome {
    /// Text to append to the transcript for this outcome.
    pub fn reply_text(&self) -> &str {
        match self {
            RelayOutcome::Replied(text) | RelayOutcome::RepliedWithWarning(text) => text,
            RelayOutcome::Failed { .. } => FALLBACK_REPLY,
        }
    }

    /// Raw error detail, present on failures only.
    pub fn failure_detail(&self) -> Option<&str> {
        match self {
            RelayOutcome::Failed { detail } => Some(detail),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// Sends one POST to the webhook and folds every failure into an
    /// outcome. The caller guarantees `message` is non-empty; no retries,
    /// every call is exactly one request.
    pub async fn relay(&self, message: &str) -> RelayOutcome {
        match self.send(message).await {
            Ok(outcome) => outcome,
            Err(err) => RelayOutcome::Failed {
                detail: format!("{err:#}"),
            },
        }
    }

    async fn send(&self, message: &str) -> Result<RelayOutcome> {
        let response = self
            .client
            .post(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .json(&RelayRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("webhook request failed with status {status}"));
        }

        let body = response.text().await?;
        Ok(translate_body(status.as_u16(), &body))
    }
}

/// Maps a 2xx webhook body onto a terminal state.
fn translate_body(status: u16, body: &str) -> RelayOutcome {
    let Ok(data) = serde_json::from_str::<Value>(body) else {
        return RelayOutcome::RepliedWithWarning(format!(
            "Error: the webhook returned a non-JSON body (status {status}). \
             Configure its 'Respond to Webhook' node to return JSON."
        ));
    };

    match data.get("response").and_then(Value::as_str) {
        Some(reply) => RelayOutcome::Replied(reply.to_string()),
        None => RelayOutcome::RepliedWithWarning(format!(
            "Warning: the webhook answered with status {status} but the JSON \
             is missing the 'response' field. Payload: {data}"
        )),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server answering every request with one canned response,
    /// so relay paths can be driven without a live webhook.
    pub(crate) struct TestServer {
        addr: SocketAddr,
        hits: Arc<AtomicUsize>,
        shutdown: tokio::sync::oneshot::Sender<()>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl TestServer {
        pub(crate) async fn start(
            status_line: &'static str,
            body: &'static str,
        ) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let hit_counter = hits.clone();
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

            let handle = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => break,
                        accept = listener.accept() => {
                            if let Ok((mut socket, _)) = accept {
                                hit_counter.fetch_add(1, Ordering::SeqCst);
                                tokio::spawn(async move {
                                    let mut buf = [0u8; 4096];
                                    let _ = socket.read(&mut buf).await;

                                    let response = format!(
                                        "HTTP/1.1 {}\r\n\
                                         Content-Type: application/json\r\n\
                                         Content-Length: {}\r\n\
                                         Connection: close\r\n\
                                         \r\n\
                                         {}",
                                        status_line,
                                        body.len(),
                                        body
                                    );
                                    let _ = socket.write_all(response.as_bytes()).await;
                                });
                            }
                        }
                    }
                }
            });

            Self {
                addr,
                hits,
                shutdown: shutdown_tx,
                handle,
            }
        }

        pub(crate) fn url(&self) -> String {
            format!("http://{}", self.addr)
        }

        /// Number of requests the server has accepted.
        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        pub(crate) async fn shutdown(self) {
            let _ = self.shutdown.send(());
            let _ = self.handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestServer;
    use super::*;

    #[tokio::test]
    async fn success_returns_response_field_verbatim() {
        let server = TestServer::start("200 OK", r#"{"response": "Hello back"}"#).await;
        let client = WebhookClient::new(&server.url());

        let outcome = client.relay("Hi").await;

        assert_eq!(outcome, RelayOutcome::Replied("Hello back".to_string()));
        assert_eq!(outcome.reply_text(), "Hello back");
        assert_eq!(server.hits(), 1);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn missing_response_field_embeds_the_raw_payload() {
        let server = TestServer::start("200 OK", r#"{"other": 1}"#).await;
        let client = WebhookClient::new(&server.url());

        let outcome = client.relay("Hi").await;

        let RelayOutcome::RepliedWithWarning(text) = &outcome else {
            panic!("expected a warning, got {outcome:?}");
        };
        assert!(text.contains("response"));
        assert!(text.contains(r#"{"other":1}"#));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn non_string_response_field_is_degraded() {
        let server = TestServer::start("200 OK", r#"{"response": 42}"#).await;
        let client = WebhookClient::new(&server.url());

        let outcome = client.relay("Hi").await;

        assert!(matches!(outcome, RelayOutcome::RepliedWithWarning(_)));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn non_json_body_names_the_status() {
        let server = TestServer::start("200 OK", "not-json").await;
        let client = WebhookClient::new(&server.url());

        let outcome = client.relay("Hi").await;

        let RelayOutcome::RepliedWithWarning(text) = &outcome else {
            panic!("expected a warning, got {outcome:?}");
        };
        assert!(text.contains("200"));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn server_error_takes_the_failure_path() {
        let server = TestServer::start("500 Internal Server Error", "boom").await;
        let client = WebhookClient::new(&server.url());

        let outcome = client.relay("Hi").await;

        assert_eq!(outcome.reply_text(), FALLBACK_REPLY);
        assert!(outcome.failure_detail().unwrap().contains("500"));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn connection_refused_takes_the_failure_path() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = WebhookClient::new(&url);
        let outcome = client.relay("Hi").await;

        assert!(matches!(outcome, RelayOutcome::Failed { .. }));
        assert_eq!(outcome.reply_text(), FALLBACK_REPLY);
    }
}
