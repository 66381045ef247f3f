//! In-process stub of the time capsule backend.
//!
//! [`StubBackend::spawn`] binds an axum server to `127.0.0.1:0` and serves
//! the backend's HTTP contract under `/api`:
//!
//! - `POST /capsules`, `GET /capsules/{code}`
//! - `POST /admin/login`, `GET /admin/capsules`, `DELETE /admin/capsules/{code}`
//! - `GET /about`, `GET /health`
//!
//! Capsules are kept in memory. Sealing is judged against a shared
//! [`ManualClock`], and content is left out of `GET /capsules/{code}` while
//! a capsule is sealed, as the real backend does. Tests hand the same clock
//! to the client so both sides agree on "now".
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p time-capsule-integration-tests
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use time_capsule_client::{ClientConfig, MemoryStorage};
use time_capsule_core::{CapsuleCode, Clock, ManualClock, disclosure};

/// Password the stub accepts at `POST /admin/login`.
pub const ADMIN_PASSWORD: &str = "letmein";

/// Instant the shared clock starts at.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_893_456_000, 0).unwrap_or_default()
}

#[derive(Debug, Clone)]
struct StoredCapsule {
    code: String,
    title: String,
    content: String,
    author: Option<String>,
    open_time: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl StoredCapsule {
    fn to_json(&self, include_content: bool) -> Value {
        let mut body = json!({
            "capsuleCode": self.code,
            "title": self.title,
            "creatorNickname": self.author,
            "openTime": self.open_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            "createdAt": self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        if include_content {
            body["content"] = Value::String(self.content.clone());
        }
        body
    }
}

#[derive(Debug, Clone)]
struct Fault {
    status: StatusCode,
    body: Option<Value>,
}

struct StubState {
    clock: ManualClock,
    capsules: Mutex<Vec<StoredCapsule>>,
    tokens: Mutex<HashSet<String>>,
    fault: Mutex<Option<Fault>>,
    next_code: AtomicU32,
    next_token: AtomicU32,
    capsule_fetches: AtomicUsize,
    admin_rejections: AtomicUsize,
    latency: Mutex<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running stub backend.
///
/// The server task is aborted when this is dropped.
pub struct StubBackend {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubBackend {
    /// Start a stub with its clock at [`epoch`].
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState {
            clock: ManualClock::new(epoch()),
            capsules: Mutex::new(Vec::new()),
            tokens: Mutex::new(HashSet::new()),
            fault: Mutex::new(None),
            next_code: AtomicU32::new(1),
            next_token: AtomicU32::new(1),
            capsule_fetches: AtomicUsize::new(0),
            admin_rejections: AtomicUsize::new(0),
            latency: Mutex::new(Duration::ZERO),
        });

        let api = Router::new()
            .route("/capsules", post(create_capsule))
            .route("/capsules/{code}", get(get_capsule))
            .route("/admin/login", post(login))
            .route("/admin/capsules", get(list_capsules))
            .route("/admin/capsules/{code}", axum::routing::delete(delete_capsule))
            .route("/about", get(about))
            .route("/health", get(health))
            .layer(middleware::from_fn_with_state(state.clone(), inject_fault))
            .with_state(state.clone());
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let addr = listener.local_addr().expect("Failed to read stub address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// `http://127.0.0.1:{port}/api/`.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/", self.addr)).expect("stub URL is valid")
    }

    /// Client configuration pointing at this stub with a fast countdown.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url(),
            api_timeout: Duration::from_secs(5),
            countdown_tick: Duration::from_millis(20),
            ..ClientConfig::default()
        }
    }

    /// The clock the stub judges sealing by. Share it with the client.
    #[must_use]
    pub fn clock(&self) -> ManualClock {
        self.state.clock.clone()
    }

    /// A client [`time_capsule_client::AppState`] on in-memory storage and
    /// the shared clock.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn app_state(&self) -> time_capsule_client::AppState {
        time_capsule_client::AppState::with_parts(
            self.client_config(),
            Arc::new(MemoryStorage::new()),
            Arc::new(self.clock()),
        )
        .expect("Failed to build client state")
    }

    /// Insert a capsule directly, bypassing validation. Returns its code.
    pub fn seed(&self, title: &str, content: &str, open_time: DateTime<Utc>) -> String {
        let code = format!("CAPS{:04}", self.state.next_code.fetch_add(1, Ordering::SeqCst));
        lock(&self.state.capsules).push(StoredCapsule {
            code: code.clone(),
            title: title.to_owned(),
            content: content.to_owned(),
            author: None,
            open_time,
            created_at: self.state.clock.now(),
        });
        code
    }

    /// Whether a capsule with `code` is stored.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        lock(&self.state.capsules).iter().any(|c| c.code == code)
    }

    /// Remove a capsule behind the client's back.
    pub fn delete_directly(&self, code: &str) {
        lock(&self.state.capsules).retain(|c| c.code != code);
    }

    /// Forget every issued token so the next admin request gets 401.
    pub fn revoke_tokens(&self) {
        lock(&self.state.tokens).clear();
    }

    /// Answer every request with `status` (and `body`, if any) until
    /// [`Self::clear_fault`].
    pub fn fail_with(&self, status: u16, body: Option<Value>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *lock(&self.state.fault) = Some(Fault { status, body });
    }

    pub fn clear_fault(&self) {
        *lock(&self.state.fault) = None;
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.state.latency) = latency;
    }

    /// How many times `GET /capsules/{code}` was served.
    #[must_use]
    pub fn capsule_fetches(&self) -> usize {
        self.state.capsule_fetches.load(Ordering::SeqCst)
    }

    /// How many admin requests were rejected with 401.
    #[must_use]
    pub fn admin_rejections(&self) -> usize {
        self.state.admin_rejections.load(Ordering::SeqCst)
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Envelopes
// =============================================================================

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": { "code": code, "message": message },
        })),
    )
        .into_response()
}

async fn inject_fault(State(state): State<Arc<StubState>>, request: Request, next: Next) -> Response {
    let latency = *lock(&state.latency);
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let fault = lock(&state.fault).clone();
    match fault {
        Some(Fault { status, body: Some(body) }) => (status, Json(body)).into_response(),
        Some(Fault { status, body: None }) => status.into_response(),
        None => next.run(request).await,
    }
}

// =============================================================================
// Admin token extractor
// =============================================================================

/// Extractor that requires a bearer token issued by `POST /admin/login`.
struct RequireAdminToken;

impl FromRequestParts<Arc<StubState>> for RequireAdminToken {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<StubState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match token {
            Some(token) if lock(&state.tokens).contains(token) => Ok(Self),
            _ => {
                state.admin_rejections.fetch_add(1, Ordering::SeqCst);
                Err(fail(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "admin token missing or expired",
                ))
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    title: String,
    content: String,
    open_time: String,
    #[serde(default)]
    creator_nickname: Option<String>,
}

async fn create_capsule(
    State(state): State<Arc<StubState>>,
    Json(request): Json<CreateRequest>,
) -> Response {
    let Ok(open_time) = disclosure::parse_timestamp(&request.open_time) else {
        return fail(StatusCode::BAD_REQUEST, "INVALID_TIME", "openTime is not a timestamp");
    };
    let now = state.clock.now();
    if open_time <= now {
        return fail(StatusCode::BAD_REQUEST, "INVALID_TIME", "openTime must be in the future");
    }

    let code = format!("CAPS{:04}", state.next_code.fetch_add(1, Ordering::SeqCst));
    lock(&state.capsules).push(StoredCapsule {
        code: code.clone(),
        title: request.title,
        content: request.content,
        author: request.creator_nickname,
        open_time,
        created_at: now,
    });

    ok(json!({
        "capsuleCode": code,
        "openTime": open_time.to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

async fn get_capsule(State(state): State<Arc<StubState>>, Path(code): Path<String>) -> Response {
    if CapsuleCode::parse(&code).is_err() {
        return fail(StatusCode::BAD_REQUEST, "INVALID_CODE", "capsule code is malformed");
    }
    state.capsule_fetches.fetch_add(1, Ordering::SeqCst);

    let now = state.clock.now();
    let capsules = lock(&state.capsules);
    match capsules.iter().find(|c| c.code == code) {
        Some(capsule) => ok(capsule.to_json(now >= capsule.open_time)),
        None => fail(StatusCode::NOT_FOUND, "CAPSULE_NOT_FOUND", "capsule does not exist"),
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

async fn login(State(state): State<Arc<StubState>>, Json(request): Json<LoginRequest>) -> Response {
    if request.password != ADMIN_PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "INVALID_PASSWORD", "wrong password");
    }

    let token = format!("token-{}", state.next_token.fetch_add(1, Ordering::SeqCst));
    lock(&state.tokens).insert(token.clone());
    ok(json!({ "token": token, "type": "Bearer", "expiresIn": 3600 }))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_size")]
    size: u32,
    #[serde(default)]
    sort: Option<String>,
}

const fn default_page() -> u32 {
    1
}

const fn default_size() -> u32 {
    20
}

async fn list_capsules(
    _admin: RequireAdminToken,
    State(state): State<Arc<StubState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let mut capsules = lock(&state.capsules).clone();
    match query.sort.as_deref() {
        Some("createdAt,asc") => capsules.sort_by_key(|c| c.created_at),
        Some("openTime,asc") => capsules.sort_by_key(|c| c.open_time),
        Some("openTime,desc") => capsules.sort_by_key(|c| std::cmp::Reverse(c.open_time)),
        _ => capsules.sort_by_key(|c| std::cmp::Reverse(c.created_at)),
    }

    let size = query.size.max(1);
    let total_items = capsules.len();
    let total_pages = total_items.div_ceil(size as usize);
    let items: Vec<Value> = capsules
        .iter()
        .skip((query.page.max(1) as usize - 1) * size as usize)
        .take(size as usize)
        .map(|c| c.to_json(true))
        .collect();

    ok(json!({
        "items": items,
        "pagination": {
            "currentPage": query.page.max(1),
            "pageSize": size,
            "totalItems": total_items,
            "totalPages": total_pages,
        },
    }))
}

async fn delete_capsule(
    _admin: RequireAdminToken,
    State(state): State<Arc<StubState>>,
    Path(code): Path<String>,
) -> Response {
    let mut capsules = lock(&state.capsules);
    let before = capsules.len();
    capsules.retain(|c| c.code != code);
    if capsules.len() == before {
        return fail(StatusCode::NOT_FOUND, "CAPSULE_NOT_FOUND", "capsule does not exist");
    }
    Json(json!({ "success": true, "message": "deleted" })).into_response()
}

async fn about() -> Response {
    ok(json!({
        "name": "Time Capsule",
        "version": "1.0.0",
        "description": "Seal a message until a moment in the future",
        "backend": "stub",
        "database": "memory",
        "buildTime": "2030-01-01T00:00:00Z",
    }))
}

async fn health(State(state): State<Arc<StubState>>) -> Response {
    ok(json!({
        "status": "UP",
        "timestamp": state.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "database": "UP",
        "diskSpace": "UP",
    }))
}
