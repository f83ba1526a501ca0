use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::stream::{self, StreamExt};
use sse_load_generator::client::make_client;
use sse_load_generator::counter::{ConnectionCounter, CounterPolicy};
use sse_load_generator::runner::Fanout;
use sse_load_generator::token::{self, Credential};
use sse_load_generator::worker::WorkerContext;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const SECRET: &[u8] = b"integration-secret";

/// Requests seen by the fake hub.
#[derive(Debug, Default, Clone)]
pub struct Seen {
    pub topics: Vec<String>,
    pub authorizations: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeHub {
    seen: Arc<Mutex<Seen>>,
}

impl FakeHub {
    pub fn seen(&self) -> Seen {
        self.seen.lock().expect("lock").clone()
    }

    fn record(&self, query: &HashMap<String, String>, headers: &HeaderMap) {
        let mut seen = self.seen.lock().expect("lock");
        seen.topics.push(query.get("topic").cloned().unwrap_or_default());
        seen.authorizations.push(
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        );
    }
}

/// `/hub` holds streams open after one `ping`, `/closing` ends the stream
/// after one `ping`, `/denied` answers 401.
pub async fn spawn_fake_hub() -> (SocketAddr, FakeHub) {
    let hub = FakeHub::default();
    let router = Router::new()
        .route("/hub", get(open_stream))
        .route("/closing", get(closing_stream))
        .route("/denied", get(denied))
        .with_state(hub.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (addr, hub)
}

fn ping() -> Result<Event, Infallible> {
    Ok(Event::default().data("ping"))
}

async fn open_stream(
    State(hub): State<FakeHub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    hub.record(&query, &headers);
    Sse::new(stream::once(async { ping() }).chain(stream::pending())).into_response()
}

async fn closing_stream(
    State(hub): State<FakeHub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    hub.record(&query, &headers);
    Sse::new(stream::iter(vec![ping()])).into_response()
}

async fn denied(
    State(hub): State<FakeHub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> StatusCode {
    hub.record(&query, &headers);
    StatusCode::UNAUTHORIZED
}

pub fn credential() -> Credential {
    token::issue(SECRET).expect("token")
}

pub fn fanout(
    base_url: String,
    counter: Arc<ConnectionCounter>,
    policy: CounterPolicy,
) -> Fanout {
    Fanout::new(WorkerContext {
        client: make_client(false),
        base_url,
        topic_prefix: "test-topic-".to_string(),
        credential: credential(),
        counter,
        policy,
    })
}

pub async fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}
