//! In-memory [`Transport`] for tests.

use crate::{FetchError, Method, RequestBuilder, Response, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Response(Response),
    Error(FetchError),
}

/// Canned responses keyed by method and path, with a log of every request.
///
/// Queued replies are served first-in first-out; the last one for a route
/// keeps being served once the queue is down to it. Unknown routes get a
/// 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<RequestBuilder>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn respond(&self, method: Method, path: &str, response: Response) -> &Self {
        self.push(method, path, Reply::Response(response))
    }

    /// Queue a success envelope around `result`.
    pub fn ok(&self, method: Method, path: &str, result: Value) -> &Self {
        self.respond(
            method,
            path,
            Response::json_body(200, &json!({"code": 1000, "result": result})),
        )
    }

    /// Queue a backend error envelope.
    pub fn api_error(&self, method: Method, path: &str, status: u16, code: i32, message: &str) -> &Self {
        self.respond(
            method,
            path,
            Response::json_body(status, &json!({"code": code, "message": message})),
        )
    }

    /// Queue a bare status with an empty body.
    pub fn status(&self, method: Method, path: &str, status: u16) -> &Self {
        self.respond(method, path, Response::new(status, HashMap::new(), Vec::new()))
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: Method, path: &str, error: FetchError) -> &Self {
        self.push(method, path, Reply::Error(error))
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes
                .entry((method, path.to_string()))
                .or_default()
                .push_back(reply);
        }
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<RequestBuilder> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests sent to one route.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RequestBuilder> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path() == path)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        let key = (request.method, request.path().to_string());
        if let Ok(mut log) = self.requests.lock() {
            log.push(request);
        }

        let reply = match self.routes.lock() {
            Ok(mut routes) => match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            },
            Err(_) => None,
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(error)) => Err(error),
            None => Ok(Response::json_body(
                404,
                &json!({"message": format!("no mock for {} {}", key.0, key.1)}),
            )),
        }
    }
}
