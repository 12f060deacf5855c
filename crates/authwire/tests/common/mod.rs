#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use authwire::{
    AuthorizationRequirement, Client, Error, EventObserver, HttpRequest, HttpResponse,
    MemoryTokenStore, Method, ResponseError, Result, Router, Token, TokenRefresher, Transport,
    TransportError,
};

pub const BASE_URL: &str = "https://api.example.com/v1";

/// A token that stays valid for an hour.
pub fn fresh_token() -> Token {
    Token::new("A1")
        .with_refresh("R1")
        .with_expiry(Utc::now() + chrono::Duration::hours(1))
}

/// One scripted transport reaction.
pub enum Step {
    Respond(HttpResponse),
    Fail(Error),
    /// Never answers within a test's lifetime.
    Hang,
}

pub fn status(code: u16) -> Step {
    Step::Respond(HttpResponse::new(code, ""))
}

pub fn json(code: u16, body: &str) -> Step {
    Step::Respond(HttpResponse::new(code, body).with_header("Content-Type", "application/json"))
}

pub fn timeout() -> Step {
    Step::Fail(TransportError::Timeout { duration_ms: 30_000 }.into())
}

/// Replays a fixed script and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .map(|r| r.authorization().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Connection {
                    message: "hung request woke up".into(),
                }
                .into())
            }
            None => Err(TransportError::Connection {
                message: "script exhausted".into(),
            }
            .into()),
        }
    }
}

/// Issues `A{n+1}`/`R{n+1}` on its n-th call.
#[derive(Default)]
pub struct CountingRefresher {
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
    gate: Option<(Notify, Notify)>,
}

impl CountingRefresher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Each refresh takes `delay` to complete.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    /// Every refresh is rejected by the server.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    /// Each refresh signals `started()` and then waits for `release()`.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some((Notify::new(), Notify::new())),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn started(&self) {
        if let Some((started, _)) = &self.gate {
            started.notified().await;
        }
    }

    pub fn release(&self) {
        if let Some((_, release)) = &self.gate {
            release.notify_one();
        }
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, current: &Token) -> Result<Token> {
        assert!(current.can_refresh());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ResponseError::new(400, Some("invalid_grant".into())).into());
        }

        Ok(Token::new(format!("A{}", n + 1))
            .with_refresh(format!("R{}", n + 1))
            .with_expiry(Utc::now() + chrono::Duration::hours(1)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Sent(Option<String>),
    Received(u16),
    Decoded(serde_json::Value),
    SessionEnded,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventObserver for RecordingObserver {
    fn on_request_sent(&self, request: &HttpRequest) {
        let auth = request.authorization().map(str::to_string);
        self.events.lock().unwrap().push(Event::Sent(auth));
    }

    fn on_response_received(&self, _request: &HttpRequest, status: u16, _body: &[u8]) {
        self.events.lock().unwrap().push(Event::Received(status));
    }

    fn on_response_decoded(&self, value: &serde_json::Value) {
        self.events.lock().unwrap().push(Event::Decoded(value.clone()));
    }

    fn on_unauthorized_session_ended(&self, _request: &HttpRequest) {
        self.events.lock().unwrap().push(Event::SessionEnded);
    }
}

/// A test endpoint under [`BASE_URL`].
pub struct Endpoint {
    pub path: &'static str,
    pub method: Method,
    pub auth: AuthorizationRequirement,
}

impl Endpoint {
    pub fn get(path: &'static str) -> Self {
        Self {
            path,
            method: Method::Get,
            auth: AuthorizationRequirement::ACCESS_TOKEN,
        }
    }

    pub fn public(path: &'static str) -> Self {
        Self {
            auth: AuthorizationRequirement::None,
            ..Self::get(path)
        }
    }

    pub fn with_refresh_token(path: &'static str) -> Self {
        Self {
            method: Method::Post,
            auth: AuthorizationRequirement::REFRESH_TOKEN,
            ..Self::get(path)
        }
    }
}

impl Router for Endpoint {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn path(&self) -> String {
        self.path.to_string()
    }

    fn method(&self) -> Method {
        self.method
    }

    fn authorization(&self) -> AuthorizationRequirement {
        self.auth
    }
}

pub struct Harness {
    pub client: Client,
    pub transport: Arc<ScriptedTransport>,
    pub refresher: Arc<CountingRefresher>,
    pub store: Arc<MemoryTokenStore>,
    pub observer: Arc<RecordingObserver>,
}

/// Build a client whose store holds `token`.
pub fn harness(
    steps: impl IntoIterator<Item = Step>,
    refresher: Arc<CountingRefresher>,
    token: Option<Token>,
) -> Harness {
    let transport = ScriptedTransport::new(steps);
    let store = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let observer = RecordingObserver::new();

    let client = Client::builder(transport.clone(), refresher.clone())
        .store(store.clone())
        .observer(observer.clone())
        .build();

    Harness {
        client,
        transport,
        refresher,
        store,
        observer,
    }
}
