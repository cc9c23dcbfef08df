//! Scripted in-memory transport for client tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{HttpResponse, HttpTransport};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub at: tokio::time::Instant,
}

/// Replays queued responses in order and records every request.
///
/// A queued `None` simulates a connection failure.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Option<HttpResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Some(HttpResponse::new(status, body)));
        self
    }

    pub fn push_connection_error(&self) -> &Self {
        self.responses.lock().unwrap().push_back(None);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(
        &self,
        method: &'static str,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
            at: tokio::time::Instant::now(),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(anyhow!("connection refused")),
            None => Err(anyhow!("no scripted response left for {} {}", method, url)),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        self.next("POST", url, Some(body.clone()))
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.next("GET", url, None)
    }
}

/// Catalog page body holding rows with consecutive identifiers from `first`.
pub fn catalog_page(first: u64, count: usize) -> String {
    let rows: Vec<serde_json::Value> = (0..count as u64)
        .map(|i| {
            let id = first + i;
            serde_json::json!({
                "id_minorplanet": id,
                "minorplanet": {
                    "ast_number": id,
                    "designation": { "str_designame": format!("A{}", id) }
                },
                "ra": 1.0,
                "ra_rate": 0.0,
                "dec": 0.25,
                "dec_rate": 0.0,
                "v_mag": 15.0
            })
        })
        .collect();
    serde_json::json!({ "data": { "ephemeris": rows } }).to_string()
}
