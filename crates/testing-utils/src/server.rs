//! In-process stand-in for the Dkron jobs API.
//!
//! `POST /v1/jobs` stores the posted document and echoes it back with 201,
//! `GET /v1/jobs/{name}` returns the stored document or 404, and
//! `DELETE /v1/jobs/{name}` removes it. Responses can be overridden to
//! exercise failure paths.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

/// A request as seen by the mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    jobs: Arc<Mutex<BTreeMap<String, Value>>>,
    create_override: Arc<Mutex<Option<CannedResponse>>>,
    get_override: Arc<Mutex<Option<CannedResponse>>>,
    delete_status: Arc<Mutex<Option<StatusCode>>>,
}

pub struct MockDkronServer {
    address: String,
    state: ServerState,
    handle: JoinHandle<()>,
}

impl MockDkronServer {
    pub async fn spawn() -> Self {
        let state = ServerState::default();
        let app = Router::new().fallback(handle_request).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock Dkron server");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("Failed to read local address")
        );

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock Dkron server failed");
        });

        Self {
            address,
            state,
            handle,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().unwrap().clear();
    }

    pub fn stored_job(&self, name: &str) -> Option<Value> {
        self.state.jobs.lock().unwrap().get(name).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.state.jobs.lock().unwrap().len()
    }

    /// Seed a job document as if it had been created earlier.
    pub fn insert_job(&self, job: Value) {
        let name = job["name"].as_str().unwrap_or_default().to_string();
        self.state.jobs.lock().unwrap().insert(name, job);
    }

    /// Answer every following `POST /v1/jobs` with `status` and `body`.
    pub fn respond_to_create_with(&self, status: u16, body: &str) {
        *self.state.create_override.lock().unwrap() = Some(CannedResponse {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            body: body.to_string(),
        });
    }

    /// Answer every following `GET /v1/jobs/{name}` with `status` and `body`.
    pub fn respond_to_get_with(&self, status: u16, body: &str) {
        *self.state.get_override.lock().unwrap() = Some(CannedResponse {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            body: body.to_string(),
        });
    }

    /// Answer every following `DELETE /v1/jobs/{name}` with `status`.
    pub fn respond_to_delete_with(&self, status: u16) {
        *self.state.delete_status.lock().unwrap() =
            Some(StatusCode::from_u16(status).expect("invalid status code"));
    }
}

impl Drop for MockDkronServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn handle_request(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    debug!("mock dkron received {} {}", method, path);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    let job_name = path.strip_prefix("/v1/jobs/").map(str::to_string);

    if method == Method::POST && path == "/v1/jobs" {
        if let Some(canned) = state.create_override.lock().unwrap().clone() {
            return json_response(canned.status, canned.body);
        }
        let job: Value = match serde_json::from_str(&body) {
            Ok(job) => job,
            Err(e) => {
                return json_response(StatusCode::BAD_REQUEST, format!("{{\"error\":\"{e}\"}}"))
            }
        };
        let name = job["name"].as_str().unwrap_or_default().to_string();
        state.jobs.lock().unwrap().insert(name, job.clone());
        return json_response(StatusCode::CREATED, job.to_string());
    }

    let Some(name) = job_name else {
        return json_response(StatusCode::NOT_FOUND, String::new());
    };

    if method == Method::GET {
        if let Some(canned) = state.get_override.lock().unwrap().clone() {
            return json_response(canned.status, canned.body);
        }
        let stored = state.jobs.lock().unwrap().get(&name).cloned();
        return match stored {
            Some(job) => json_response(StatusCode::OK, job.to_string()),
            None => json_response(
                StatusCode::NOT_FOUND,
                "{\"error\":\"job not found\"}".to_string(),
            ),
        };
    }

    if method == Method::DELETE {
        let removed = state.jobs.lock().unwrap().remove(&name);
        let status = state.delete_status.lock().unwrap().unwrap_or(StatusCode::OK);
        let body = removed.map(|job| job.to_string()).unwrap_or_default();
        return json_response(status, body);
    }

    json_response(StatusCode::METHOD_NOT_ALLOWED, String::new())
}
