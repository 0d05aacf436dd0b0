//! ---
//! rpg_section: "04-test-harness"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "In-process fake of the remote system HTTP API."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the fake answers for one route and identifier.
#[derive(Debug, Clone)]
pub enum CannedResponse {
    /// 200 with `application/json`.
    Json(Value),
    /// 200 with an arbitrary content type.
    Binary {
        content_type: String,
        body: Bytes,
    },
    /// Empty body with the given status.
    Status(u16),
    /// Full control over status, content type and body.
    Raw {
        status: u16,
        content_type: String,
        body: Bytes,
    },
}

impl CannedResponse {
    /// 200 `application/json` whose body is not JSON.
    pub fn malformed_json() -> Self {
        CannedResponse::Raw {
            status: 200,
            content_type: "application/json".into(),
            body: Bytes::from_static(b"{not json"),
        }
    }
}

impl From<Value> for CannedResponse {
    fn from(value: Value) -> Self {
        CannedResponse::Json(value)
    }
}

impl IntoResponse for CannedResponse {
    fn into_response(self) -> Response {
        match self {
            CannedResponse::Json(value) => (StatusCode::OK, Json(value)).into_response(),
            CannedResponse::Binary { content_type, body } => {
                (StatusCode::OK, [(CONTENT_TYPE, content_type)], body).into_response()
            }
            CannedResponse::Status(code) => status_from(code).into_response(),
            CannedResponse::Raw {
                status,
                content_type,
                body,
            } => (status_from(status), [(CONTENT_TYPE, content_type)], body).into_response(),
        }
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// One PATCH received on a process route.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// `call` or `execute`.
    pub function: String,
    pub identifier: String,
    /// Decoded JSON body, `Value::Null` when the body was not JSON.
    pub body: Value,
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

#[derive(Debug, Default, Clone)]
struct Fixture {
    system: Option<CannedResponse>,
    containers: HashMap<String, CannedResponse>,
    processes: HashMap<String, CannedResponse>,
    lists: HashMap<String, CannedResponse>,
    calls: HashMap<String, CannedResponse>,
}

#[derive(Default)]
struct HarnessState {
    fixture: Mutex<Fixture>,
    calls: Mutex<Vec<RecordedCall>>,
    reads: Mutex<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct IdentifierQuery {
    identifier: Option<String>,
}

/// Builder for a fake remote system.
#[derive(Debug, Default, Clone)]
pub struct FakeServer {
    fixture: Fixture,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(mut self, response: impl Into<CannedResponse>) -> Self {
        self.fixture.system = Some(response.into());
        self
    }

    pub fn container(mut self, id: &str, response: impl Into<CannedResponse>) -> Self {
        self.fixture.containers.insert(id.to_owned(), response.into());
        self
    }

    pub fn process(mut self, id: &str, response: impl Into<CannedResponse>) -> Self {
        self.fixture.processes.insert(id.to_owned(), response.into());
        self
    }

    /// Answer for `GET /api/<class>/list`.
    pub fn list(mut self, class: &str, response: impl Into<CannedResponse>) -> Self {
        self.fixture.lists.insert(class.to_owned(), response.into());
        self
    }

    /// Answer for `PATCH /api/container_process/{call,execute}?identifier=<id>`.
    pub fn on_call(mut self, id: &str, response: impl Into<CannedResponse>) -> Self {
        self.fixture.calls.insert(id.to_owned(), response.into());
        self
    }

    /// Bind to an ephemeral local port and start serving.
    pub async fn spawn(self) -> anyhow::Result<FakeServerHandle> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        info!(address = %address, "fake system listening");

        let state = Arc::new(HarnessState {
            fixture: Mutex::new(self.fixture),
            ..HarnessState::default()
        });
        let router = Router::new()
            .route("/api/:class/:function", get(read).patch(invoke))
            .with_state(state.clone());

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        });
        let task = tokio::spawn(async move {
            if let Err(err) = server.await {
                warn!(error = %err, "fake system exited with error");
            }
        });

        Ok(FakeServerHandle {
            address,
            state,
            task,
            shutdown: shutdown_tx,
        })
    }
}

/// Running fake; inspect recorded traffic or swap fixtures through it.
pub struct FakeServerHandle {
    address: SocketAddr,
    state: Arc<HarnessState>,
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl FakeServerHandle {
    /// `http://127.0.0.1:<port>`, suitable as a client base url.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn set_system(&self, response: impl Into<CannedResponse>) {
        self.state.fixture.lock().system = Some(response.into());
    }

    pub fn set_container(&self, id: &str, response: impl Into<CannedResponse>) {
        self.state
            .fixture
            .lock()
            .containers
            .insert(id.to_owned(), response.into());
    }

    pub fn set_process(&self, id: &str, response: impl Into<CannedResponse>) {
        self.state
            .fixture
            .lock()
            .processes
            .insert(id.to_owned(), response.into());
    }

    pub fn set_call(&self, id: &str, response: impl Into<CannedResponse>) {
        self.state
            .fixture
            .lock()
            .calls
            .insert(id.to_owned(), response.into());
    }

    /// Invocations received so far, in arrival order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// GET requests received so far as `<class>/<function>[?identifier]`.
    pub fn reads(&self) -> Vec<String> {
        self.state.reads.lock().clone()
    }

    /// Number of GETs whose recorded form starts with `prefix`.
    pub fn read_count(&self, prefix: &str) -> usize {
        self.state
            .reads
            .lock()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    /// Request graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(()) => Ok(()),
            Err(join) => Err(anyhow::anyhow!(join)),
        }
    }
}

async fn read(
    State(state): State<Arc<HarnessState>>,
    Path((class, function)): Path<(String, String)>,
    Query(query): Query<IdentifierQuery>,
) -> Response {
    let record = match &query.identifier {
        Some(id) => format!("{class}/{function}?{id}"),
        None => format!("{class}/{function}"),
    };
    debug!(request = %record, "fake system read");
    state.reads.lock().push(record);

    let fixture = state.fixture.lock();
    let answer = match (function.as_str(), class.as_str()) {
        ("profile_full", "system") => fixture.system.clone(),
        ("profile_full", "container") => query
            .identifier
            .as_ref()
            .and_then(|id| fixture.containers.get(id).cloned()),
        ("profile_full", "container_process") => query
            .identifier
            .as_ref()
            .and_then(|id| fixture.processes.get(id).cloned()),
        ("list", class) => fixture.lists.get(class).cloned(),
        _ => None,
    };
    answer
        .map(IntoResponse::into_response)
        .unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
}

async fn invoke(
    State(state): State<Arc<HarnessState>>,
    Path((class, function)): Path<(String, String)>,
    Query(query): Query<IdentifierQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if class != "container_process" || !matches!(function.as_str(), "call" | "execute") {
        return StatusCode::NOT_FOUND.into_response();
    }
    let Some(identifier) = query.identifier else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let call = RecordedCall {
        function,
        identifier: identifier.clone(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        content_type: header(CONTENT_TYPE),
        accept: header(ACCEPT),
    };
    debug!(identifier = %call.identifier, function = %call.function, "fake system invocation");
    state.calls.lock().push(call);

    let answer = state.fixture.lock().calls.get(&identifier).cloned();
    answer
        .map(IntoResponse::into_response)
        .unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_profiles_and_records_calls() {
        let handle = FakeServer::new()
            .system(json!({"containers": {"c1": {}}}))
            .container("c1", json!({"type_name": "turtle", "processes": []}))
            .on_call("p1", CannedResponse::Status(503))
            .spawn()
            .await
            .unwrap();
        let client = reqwest::Client::new();
        let base = handle.base_url();

        let system: Value = client
            .get(format!("{base}/api/system/profile_full"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(system["containers"]["c1"], json!({}));

        let missing = client
            .get(format!("{base}/api/container/profile_full?identifier=zz"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let call = client
            .patch(format!("{base}/api/container_process/call?identifier=p1"))
            .json(&json!({"vx": 1}))
            .send()
            .await
            .unwrap();
        assert_eq!(call.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        let calls = handle.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body, json!({"vx": 1}));
        assert_eq!(calls[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(handle.read_count("system/"), 1);

        handle.shutdown().await.unwrap();
    }
}
