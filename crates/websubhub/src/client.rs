//! WebSub Hub HTTP client.
//!
//! Publish calls are dispatched onto the tokio runtime and never awaited by
//! the caller; their outcome is only logged. Topic management calls are
//! awaited and must be answered with `hub.mode=accepted`.

use std::future::Future;
use std::pin::Pin;

use idevent_common::{EventContext, SecurityEventTokenPayload};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::AdapterConfiguration;
use crate::constants::{
    CONTENT_TYPE_JSON, CORRELATION_ID_REQUEST_HEADER, HUB_MODE, HUB_TOPIC, HubMode,
    RESPONSE_FOR_SUCCESSFUL_OPERATION, TopicOperation,
};
use crate::error::HubError;

/// Characters left unescaped in the `hub.topic` value (RFC 3986 unreserved).
const TOPIC_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Abstract connection to a WebSub Hub.
///
/// [`HttpHubClient`] is the production implementation. Keeping the adapter
/// behind this trait lets it be tested without a hub.
pub trait HubClient: Send + Sync {
    /// Dispatches a publish call for `topic` without waiting for the hub.
    ///
    /// Only failures detected before dispatch are returned.
    fn publish(
        &self,
        base_url: &str,
        topic: &str,
        payload: &SecurityEventTokenPayload,
        context: &EventContext,
    ) -> Result<(), HubError>;

    /// Sends a topic management call and waits for the hub to accept it.
    fn manage_topic<'a>(
        &'a self,
        base_url: &'a str,
        topic: &'a str,
        operation: TopicOperation,
    ) -> Pin<Box<dyn Future<Output = Result<(), HubError>> + Send + 'a>>;

    /// Waits until every publish call dispatched so far has finished.
    fn drain(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// `reqwest`-backed hub client.
pub struct HttpHubClient {
    http: reqwest::Client,
    in_flight: TaskTracker,
}

impl HttpHubClient {
    /// Creates a client using the timeouts and pool size from `config`.
    pub fn new(config: &AdapterConfiguration) -> Result<Self, HubError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(config.max_idle_connections_per_host)
            .build()?;
        Ok(Self::with_client(http))
    }

    /// Wraps an already configured HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            in_flight: TaskTracker::new(),
        }
    }
}

impl HubClient for HttpHubClient {
    fn publish(
        &self,
        base_url: &str,
        topic: &str,
        payload: &SecurityEventTokenPayload,
        context: &EventContext,
    ) -> Result<(), HubError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| HubError::NoRuntime)?;
        let body = serde_json::to_vec(payload)?;
        let correlation_id = Uuid::new_v4().to_string();

        let request = self
            .http
            .post(hub_url(base_url, HubMode::Publish, topic))
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(CORRELATION_ID_REQUEST_HEADER, correlation_id.as_str())
            .body(body);

        let topic = topic.to_string();
        let tenant = context.tenant_domain.clone();

        self.in_flight.spawn_on(
            async move {
                match request.send().await {
                    Ok(resp) => {
                        let status = resp.status();
                        if status.is_success() {
                            debug!(%topic, %tenant, %correlation_id, "hub accepted published event");
                        } else {
                            let body = resp.text().await.unwrap_or_default();
                            error!(
                                %topic,
                                %tenant,
                                %correlation_id,
                                status = status.as_u16(),
                                body = %body,
                                "hub rejected published event"
                            );
                        }
                    }
                    Err(e) => {
                        error!(%topic, %tenant, %correlation_id, error = %e, "failed to publish event to hub");
                    }
                }
            },
            &runtime,
        );

        Ok(())
    }

    fn manage_topic<'a>(
        &'a self,
        base_url: &'a str,
        topic: &'a str,
        operation: TopicOperation,
    ) -> Pin<Box<dyn Future<Output = Result<(), HubError>> + Send + 'a>> {
        Box::pin(async move {
            let correlation_id = Uuid::new_v4().to_string();
            let resp = self
                .http
                .post(hub_url(base_url, operation.into(), topic))
                .header(CORRELATION_ID_REQUEST_HEADER, correlation_id.as_str())
                .send()
                .await?;

            let status = resp.status();
            let body = resp.text().await?;

            if status != StatusCode::OK {
                return Err(HubError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            if body.trim() != RESPONSE_FOR_SUCCESSFUL_OPERATION {
                return Err(HubError::InvalidResponse(body));
            }

            debug!(topic, %operation, %correlation_id, "hub accepted topic operation");
            Ok(())
        })
    }

    fn drain(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.in_flight.close();
            self.in_flight.wait().await;
            self.in_flight.reopen();
        })
    }
}

/// Builds `{base_url}?hub.mode={mode}&hub.topic={topic}`.
///
/// Appends with `&` when the base URL already has a query string, and with
/// nothing when it already ends in `?` or `&`.
pub fn hub_url(base_url: &str, mode: HubMode, topic: &str) -> String {
    let separator = if base_url.ends_with('?') || base_url.ends_with('&') {
        ""
    } else if base_url.contains('?') {
        "&"
    } else {
        "?"
    };
    let topic = utf8_percent_encode(topic, TOPIC_ENCODE_SET);
    format!("{base_url}{separator}{HUB_MODE}={mode}&{HUB_TOPIC}={topic}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    const TOPIC: &str = "carbon.super/https://schemas.identity.org/events/login";

    fn test_client() -> HttpHubClient {
        let config = AdapterConfiguration {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 5_000,
            ..Default::default()
        };
        HttpHubClient::new(&config).unwrap()
    }

    fn test_context() -> EventContext {
        EventContext::new("carbon.super", "https://schemas.identity.org/events/login")
    }

    /// Reads one HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Starts a mock hub answering one request with `status` and `body`.
    ///
    /// The raw request is sent back through the returned receiver.
    async fn mock_hub(
        status: u16,
        body: &str,
    ) -> (
        String,
        oneshot::Receiver<String>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/hub");
        let body = body.to_string();
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                let _ = tx.send(request);

                let resp = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, rx, handle)
    }

    #[test]
    fn hub_url_encodes_topic() {
        let url = hub_url("https://hub.example.com/hub", HubMode::Register, TOPIC);
        assert_eq!(
            url,
            "https://hub.example.com/hub?hub.mode=register&hub.topic=carbon.super%2Fhttps%3A%2F%2Fschemas.identity.org%2Fevents%2Flogin"
        );
    }

    #[test]
    fn hub_url_appends_to_existing_query() {
        let url = hub_url("https://hub.example.com/hub?tenant=a", HubMode::Publish, "t");
        assert_eq!(
            url,
            "https://hub.example.com/hub?tenant=a&hub.mode=publish&hub.topic=t"
        );
    }

    #[test]
    fn hub_url_reuses_trailing_separator() {
        assert_eq!(
            hub_url("https://hub/x?", HubMode::Register, "t"),
            "https://hub/x?hub.mode=register&hub.topic=t"
        );
        assert_eq!(
            hub_url("https://hub/x?tenant=a&", HubMode::Register, "t"),
            "https://hub/x?tenant=a&hub.mode=register&hub.topic=t"
        );
    }

    #[tokio::test]
    async fn register_accepted() {
        let (url, rx, handle) = mock_hub(200, "hub.mode=accepted").await;

        let client = test_client();
        client
            .manage_topic(&url, TOPIC, TopicOperation::Register)
            .await
            .unwrap();

        let request = rx.await.unwrap();
        assert!(
            request.starts_with("POST /hub?hub.mode=register&hub.topic=carbon.super%2F"),
            "unexpected request: {request}"
        );
        assert!(request.to_lowercase().contains("activityid:"));

        handle.abort();
    }

    #[tokio::test]
    async fn deregister_accepted_with_trailing_newline() {
        let (url, rx, handle) = mock_hub(200, "hub.mode=accepted\n").await;

        let client = test_client();
        client
            .manage_topic(&url, TOPIC, TopicOperation::Deregister)
            .await
            .unwrap();

        let request = rx.await.unwrap();
        assert!(request.starts_with("POST /hub?hub.mode=deregister&"));

        handle.abort();
    }

    #[tokio::test]
    async fn topic_operation_unexpected_body() {
        let (url, _rx, handle) = mock_hub(200, "hub.mode=denied").await;

        let client = test_client();
        let err = client
            .manage_topic(&url, TOPIC, TopicOperation::Register)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, HubError::InvalidResponse(body) if body == "hub.mode=denied"),
            "unexpected error: {err}"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn topic_operation_backend_error() {
        let (url, _rx, handle) = mock_hub(500, "internal failure").await;

        let client = test_client();
        let err = client
            .manage_topic(&url, TOPIC, TopicOperation::Register)
            .await
            .unwrap_err();
        match err {
            HubError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal failure");
            }
            other => panic!("expected status error, got {other}"),
        }

        handle.abort();
    }

    #[tokio::test]
    async fn topic_operation_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = test_client();
        let url = format!("http://127.0.0.1:{port}/hub");
        let err = client
            .manage_topic(&url, TOPIC, TopicOperation::Register)
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::Http(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn publish_posts_json_payload() {
        let (url, rx, handle) = mock_hub(202, "").await;

        let client = test_client();
        let payload = SecurityEventTokenPayload::new("https://idp.example.com", "jti-1", 1)
            .with_event("https://schemas.identity.org/events/login", serde_json::json!({}));
        client.publish(&url, TOPIC, &payload, &test_context()).unwrap();
        client.drain().await;

        let request = rx.await.unwrap();
        let lower = request.to_lowercase();
        assert!(
            request.starts_with("POST /hub?hub.mode=publish&hub.topic=carbon.super%2F"),
            "unexpected request: {request}"
        );
        assert!(lower.contains("content-type: application/json"));
        assert!(lower.contains("activityid:"));
        assert!(request.contains("\"jti\":\"jti-1\""));

        handle.abort();
    }

    #[tokio::test]
    async fn publish_accepts_no_content() {
        let (url, rx, handle) = mock_hub(204, "").await;

        let client = test_client();
        let payload = SecurityEventTokenPayload::new("https://idp", "jti-5", 5);
        client.publish(&url, TOPIC, &payload, &test_context()).unwrap();
        client.drain().await;

        assert!(rx.await.unwrap().contains("\"jti\":\"jti-5\""));

        handle.abort();
    }

    #[tokio::test]
    async fn publish_rejection_is_not_returned() {
        let (url, _rx, handle) = mock_hub(500, "boom").await;

        let client = test_client();
        let payload = SecurityEventTokenPayload::new("https://idp", "jti-2", 2);
        let result = client.publish(&url, TOPIC, &payload, &test_context());
        assert!(result.is_ok());
        client.drain().await;

        handle.abort();
    }

    #[tokio::test]
    async fn publish_after_drain_still_dispatches() {
        let client = test_client();
        client.drain().await;

        let (url, rx, handle) = mock_hub(200, "").await;
        let payload = SecurityEventTokenPayload::new("https://idp", "jti-3", 3);
        client.publish(&url, TOPIC, &payload, &test_context()).unwrap();
        client.drain().await;

        assert!(rx.await.unwrap().contains("\"jti\":\"jti-3\""));

        handle.abort();
    }

    #[test]
    fn publish_without_runtime_fails() {
        let client = test_client();
        let payload = SecurityEventTokenPayload::new("https://idp", "jti-4", 4);
        let err = client
            .publish("http://127.0.0.1:1/hub", TOPIC, &payload, &test_context())
            .unwrap_err();
        assert!(matches!(err, HubError::NoRuntime));
    }
}
