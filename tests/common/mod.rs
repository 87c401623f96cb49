//! Scripted in-memory transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use recruit_client::bindings::Bindings;
use recruit_client::cache::{CacheConfig, QueryCache};
use recruit_client::remote::{ApiRequest, ApiResponse, Method, ResourceClient, RetryPolicy, Transport};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Serves queued responses per `(method, path)`; the last queued response
/// repeats. Unknown routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, response: ApiResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Queue a successful envelope carrying `data`
    pub fn ok(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, ApiResponse::json(200, &envelope(data)));
    }

    /// Queue an error envelope
    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) {
        self.respond(
            method,
            path,
            ApiResponse::json(status, &json!({"success": false, "error": message})),
        );
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<ApiRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> recruit_client::Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| {
            ApiResponse::json(
                404,
                &json!({"success": false, "error": format!("no route for {}", request.path)}),
            )
        }))
    }
}

pub fn envelope(data: Value) -> Value {
    json!({"success": true, "message": "OK", "data": data})
}

pub fn application(id: &str, job_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "jobId": job_id,
        "applicantId": "U1",
        "status": status,
        "createdAt": "2026-03-01T09:00:00Z",
        "reviewedAt": if status == "pending" { Value::Null } else { json!("2026-03-02T09:00:00Z") },
        "isWithdrawn": status == "withdrawn"
    })
}

pub fn job(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "schoolId": "S1",
        "title": "Chemistry teacher",
        "status": status,
        "createdAt": "2026-02-01T00:00:00Z"
    })
}

pub fn saved_job(id: &str, job_id: &str) -> Value {
    json!({
        "id": id,
        "jobId": job_id,
        "applicantId": "U1",
        "priority": "high",
        "createdAt": "2026-03-05T12:00:00Z"
    })
}

pub fn page(items: Vec<Value>) -> Value {
    Value::Array(items)
}

/// Bindings over a fresh cache and the mock, without read retries
pub fn bindings(transport: &Arc<MockTransport>) -> Bindings {
    let client = ResourceClient::new(transport.clone()).with_retry(RetryPolicy::none());
    Bindings::new(client, QueryCache::new(CacheConfig::default()))
}
