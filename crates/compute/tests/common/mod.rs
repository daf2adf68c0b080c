use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// What the fake service answers on a submission endpoint.
#[derive(Clone)]
pub enum SubmitReply {
    Accept(&'static str),
    Reject(StatusCode, Value),
    Raw(StatusCode, &'static str),
}

/// One request observed by the fake service.
#[derive(Debug, Clone)]
pub struct Observed {
    pub path: String,
    pub tunnel_header: Option<String>,
    pub body: Option<Value>,
}

/// In-process stand-in for the image-generation service.
///
/// Submissions are answered from a per-endpoint reply table; status
/// queries replay a per-task queue of JSON bodies, repeating the last entry
/// once the queue drains. Tasks given a raw body answer it verbatim with
/// 200. Unknown task ids get the service's 404 body.
#[derive(Default)]
pub struct FakeCompute {
    replies: Mutex<HashMap<&'static str, SubmitReply>>,
    statuses: Mutex<HashMap<String, VecDeque<Value>>>,
    raw_statuses: Mutex<HashMap<String, &'static str>>,
    observed: Mutex<Vec<Observed>>,
}

impl FakeCompute {
    pub fn reply(&self, endpoint: &'static str, reply: SubmitReply) {
        self.replies.lock().unwrap().insert(endpoint, reply);
    }

    pub fn statuses(&self, task_id: &str, bodies: Vec<Value>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(task_id.to_string(), bodies.into());
    }

    pub fn raw_status(&self, task_id: &str, text: &'static str) {
        self.raw_statuses
            .lock()
            .unwrap()
            .insert(task_id.to_string(), text);
    }

    pub fn observed(&self) -> Vec<Observed> {
        self.observed.lock().unwrap().clone()
    }

    fn record(&self, path: String, headers: &HeaderMap, body: Option<Value>) {
        let tunnel_header = headers
            .get("ngrok-skip-browser-warning")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.observed.lock().unwrap().push(Observed {
            path,
            tunnel_header,
            body,
        });
    }
}

async fn submit(
    endpoint: &'static str,
    fake: Arc<FakeCompute>,
    headers: HeaderMap,
    body: Value,
) -> Response {
    fake.record(format!("/{endpoint}"), &headers, Some(body));
    let reply = fake.replies.lock().unwrap().get(endpoint).cloned();
    match reply {
        Some(SubmitReply::Accept(task_id)) => (
            StatusCode::ACCEPTED,
            Json(json!({ "task_id": task_id, "message": "Task started" })),
        )
            .into_response(),
        Some(SubmitReply::Reject(status, body)) => (status, Json(body)).into_response(),
        Some(SubmitReply::Raw(status, text)) => (status, text).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn task_status(
    State(fake): State<Arc<FakeCompute>>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    fake.record(format!("/task_status/{task_id}"), &headers, None);
    if let Some(text) = fake.raw_statuses.lock().unwrap().get(&task_id).copied() {
        return (StatusCode::OK, text).into_response();
    }
    let mut statuses = fake.statuses.lock().unwrap();
    match statuses.get_mut(&task_id) {
        Some(queue) => {
            let body = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            Json(body.unwrap_or(Value::Null)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Task not found" })),
        )
            .into_response(),
    }
}

/// Start the fake on an ephemeral port and return its base URL.
pub async fn spawn(fake: Arc<FakeCompute>) -> String {
    let app = Router::new()
        .route(
            "/process_image",
            post(|State(f): State<Arc<FakeCompute>>, h: HeaderMap, Json(b): Json<Value>| {
                submit("process_image", f, h, b)
            }),
        )
        .route(
            "/generate_mask",
            post(|State(f): State<Arc<FakeCompute>>, h: HeaderMap, Json(b): Json<Value>| {
                submit("generate_mask", f, h, b)
            }),
        )
        .route(
            "/run-higan",
            post(|State(f): State<Arc<FakeCompute>>, h: HeaderMap, Json(b): Json<Value>| {
                submit("run-higan", f, h, b)
            }),
        )
        .route("/task_status/{task_id}", get(task_status))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}
