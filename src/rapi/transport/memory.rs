//! In-memory transport for tests. No network, no persistence.
//!
//! Responses are queued in FIFO order and every executed request is
//! recorded, so tests can assert on exactly which requests were issued
//! and in what order.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{RapiError, Result};
use crate::transport::{ApiRequest, RawResponse, Transport};

#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<Result<RawResponse>>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response with the given status and body.
    pub fn push_response(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(RawResponse {
            status,
            body: body.to_string(),
        }));
    }

    /// Queue a transport-level failure (connection refused, timeout, ...).
    pub fn push_failure(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(RapiError::Connection(message.to_string())));
    }

    /// All requests executed so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RapiError::Connection(
                    "mock transport: no response queued".to_string(),
                ))
            })
    }
}
