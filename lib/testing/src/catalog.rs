use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::oneshot;

pub const TOKEN_PATH: &str = "/oauth2/token";
pub const CATALOG_PATH: &str = "/catalog";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug)]
struct Behaviour {
    token_status: StatusCode,
    token_delay: Option<Duration>,
    expires_in: Option<i64>,
    systems: HashMap<String, Option<String>>,
    system_status: HashMap<String, StatusCode>,
    entity_status: HashMap<String, StatusCode>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            token_status: StatusCode::OK,
            token_delay: None,
            expires_in: Some(3600),
            systems: HashMap::new(),
            system_status: HashMap::new(),
            entity_status: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    behaviour: Mutex<Behaviour>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// In-process stand-in for the catalog API and its OAuth2 token endpoint.
///
/// The server runs on its own thread and runtime so blocking HTTP clients can
/// call it from ordinary `#[test]` functions. Every request is recorded.
///
/// Routes:
/// - `POST /oauth2/token` issues `token-{n}` bearer tokens
/// - `GET /catalog/default/system/{system}` returns registered systems, 404 otherwise
/// - `PUT|DELETE /catalog/{namespace}/{kind}/{name}` accepts entity writes
pub struct MockCatalog {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockCatalog {
    pub fn start() -> Self {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock catalog listener");
        listener
            .set_nonblocking(true)
            .expect("set mock catalog listener non-blocking");
        let addr = listener
            .local_addr()
            .expect("mock catalog listener address");

        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let (shutdown, signal) = oneshot::channel::<()>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock catalog runtime");

            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("mock catalog listener");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = signal.await;
                    })
                    .await
                    .expect("mock catalog server");
            });
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown),
        }
    }

    pub fn catalog_endpoint(&self) -> String {
        format!("http://{}{}", self.addr, CATALOG_PATH)
    }

    pub fn auth_endpoint(&self) -> String {
        format!("http://{}{}", self.addr, TOKEN_PATH)
    }

    pub fn add_system(&self, name: &str, owner: &str) {
        lock(&self.state.behaviour)
            .systems
            .insert(name.to_string(), Some(owner.to_string()));
    }

    pub fn add_system_without_owner(&self, name: &str) {
        lock(&self.state.behaviour)
            .systems
            .insert(name.to_string(), None);
    }

    pub fn fail_system(&self, name: &str, code: u16) {
        lock(&self.state.behaviour)
            .system_status
            .insert(name.to_string(), status(code));
    }

    /// Answer writes and deletes of the entity named `name` with `code`.
    pub fn fail_entity(&self, name: &str, code: u16) {
        lock(&self.state.behaviour)
            .entity_status
            .insert(name.to_string(), status(code));
    }

    pub fn fail_token(&self, code: u16) {
        lock(&self.state.behaviour).token_status = status(code);
    }

    /// Hold every token response for `delay` before answering.
    pub fn delay_token(&self, delay: Duration) {
        lock(&self.state.behaviour).token_delay = Some(delay);
    }

    /// `expires_in` returned with issued tokens. `None` leaves the field out.
    pub fn set_expires_in(&self, expires_in: Option<i64>) {
        lock(&self.state.behaviour).expires_in = expires_in;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    pub fn token_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path == TOKEN_PATH)
            .count()
    }

    pub fn system_lookups(&self) -> Vec<RecordedRequest> {
        self.catalog_requests("GET")
    }

    pub fn entity_writes(&self) -> Vec<RecordedRequest> {
        self.catalog_requests("PUT")
    }

    pub fn entity_deletes(&self) -> Vec<RecordedRequest> {
        self.catalog_requests("DELETE")
    }

    fn catalog_requests(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.starts_with(CATALOG_PATH))
            .collect()
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let request = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    };
    lock(&state.requests).push(request.clone());

    if request.path == TOKEN_PATH && method == Method::POST {
        let delay = lock(&state.behaviour).token_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let issued = lock(&state.requests)
            .iter()
            .filter(|r| r.path == TOKEN_PATH)
            .count();
        return token(&lock(&state.behaviour), &request.body, issued);
    }

    let Some(rest) = request.path.strip_prefix("/catalog/") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let authorized = request
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Bearer token-"));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"name": "AuthenticationError"}})),
        )
            .into_response();
    }

    let behaviour = lock(&state.behaviour);
    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        ["default", "system", system] if method == Method::GET => {
            if let Some(code) = behaviour.system_status.get(*system) {
                return (*code, Json(json!({"error": {"name": "Error"}}))).into_response();
            }

            match behaviour.systems.get(*system) {
                Some(Some(owner)) => Json(json!({
                    "apiVersion": "backstage.io/v1alpha1",
                    "kind": "System",
                    "metadata": {"name": system},
                    "spec": {"owner": owner},
                }))
                .into_response(),
                Some(None) => Json(json!({
                    "apiVersion": "backstage.io/v1alpha1",
                    "kind": "System",
                    "metadata": {"name": system},
                    "spec": {},
                }))
                .into_response(),
                None => (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": {"name": "NotFoundError"}})),
                )
                    .into_response(),
            }
        }
        [_, _, name] if method == Method::PUT || method == Method::DELETE => {
            match behaviour.entity_status.get(*name) {
                Some(code) => (
                    *code,
                    Json(json!({"error": {"name": "Error", "message": format!("rejected {name}")}})),
                )
                    .into_response(),
                None if method == Method::PUT => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    request.body.clone(),
                )
                    .into_response(),
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn token(behaviour: &Behaviour, body: &str, issued: usize) -> Response {
    if behaviour.token_status != StatusCode::OK {
        return (
            behaviour.token_status,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }

    if !body.contains("grant_type=client_credentials") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        )
            .into_response();
    }

    let mut payload = json!({
        "access_token": format!("token-{issued}"),
        "token_type": "Bearer",
    });
    if let Some(expires_in) = behaviour.expires_in {
        payload["expires_in"] = json!(expires_in);
    }

    Json(payload).into_response()
}
