#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ions_core::api::{ApiError, ApiRequest, ApiResponse, Transport};
use ions_core::Session;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Transport that records every request and replays queued responses.
#[derive(Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, ApiError>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: StatusCode, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse::new(
            status,
            HeaderMap::new(),
            body.as_bytes().to_vec(),
        )));
        self
    }

    pub fn fail(&self, err: ApiError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no response queued")
    }
}

pub const LOGIN_OK: &str = r#"{"access_token": "tok", "expires_in": 3600}"#;

/// Session logged in through a mock with token `tok`.
pub async fn logged_in_session() -> (Session<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    transport.respond(StatusCode::OK, LOGIN_OK);
    let session = Session::builder(Default::default())
        .transport(transport.clone())
        .login("user", "secret")
        .await
        .expect("login should succeed");
    (session, transport)
}
