use crate::token::Credential;
use eventsource_stream::{Event, EventStream as Decoded, EventStreamError, Eventsource};
use futures_util::StreamExt;
use http_body_util::{BodyDataStream, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL};
use hyper::{Method, Request, StatusCode};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use thiserror::Error;

pub type HubClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("connect failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("stream read failed: {0}")]
    Read(#[from] hyper::Error),
    #[error("malformed event stream: {0}")]
    Decode(String),
    #[error("stream closed by server")]
    Closed,
}

/// Builds the client shared by every connection.
///
/// Each SSE subscription holds its connection for its whole lifetime, so the
/// pool only ever recycles connections of streams that already ended.
pub fn make_client(http2_only: bool) -> HubClient {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(5))
        .pool_timer(TokioTimer::new())
        .http2_only(http2_only)
        .build(connector)
}

/// Opens one subscription. Resolves once the hub answered with a success
/// status; events are pulled afterwards with [`EventStream::next_event`].
pub async fn subscribe(
    client: &HubClient,
    url: &str,
    credential: &Credential,
) -> Result<EventStream, StreamError> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(url)
        .header(AUTHORIZATION, credential.bearer())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .body(Empty::new())?;

    let response = client.request(request).await?;
    if !response.status().is_success() {
        return Err(StreamError::Status(response.status()));
    }
    Ok(EventStream {
        events: BodyDataStream::new(response.into_body()).eventsource(),
    })
}

pub struct EventStream {
    events: Decoded<BodyDataStream<Incoming>>,
}

impl EventStream {
    /// Waits for the next complete event.
    ///
    /// Cancel safe. A clean end of body is reported as [`StreamError::Closed`]
    /// because subscriptions never end on their own.
    pub async fn next_event(&mut self) -> Result<Event, StreamError> {
        match self.events.next().await {
            Some(Ok(event)) => Ok(event),
            Some(Err(EventStreamError::Transport(err))) => Err(StreamError::Read(err)),
            Some(Err(err)) => Err(StreamError::Decode(err.to_string())),
            None => Err(StreamError::Closed),
        }
    }
}
