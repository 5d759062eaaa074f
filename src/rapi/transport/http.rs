//! Production transport backed by a blocking `ureq` agent.
//!
//! Status-code-as-error is disabled on the agent so 4xx/5xx responses come
//! back as data; the client layer decides what a non-2xx status means.

use std::time::Duration;

use crate::error::{RapiError, Result};
use crate::transport::{ApiRequest, Method, RawResponse, Transport};

pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build()
            .new_agent();
        Self { agent }
    }
}

/// Apply query parameters and headers to a request builder of either kind.
fn with_params<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &ApiRequest,
) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (key, value) in &request.headers {
        builder = builder.header(key, value);
    }
    builder
}

impl Transport for HttpTransport {
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let result = match (request.method, &request.body) {
            (Method::Get, _) => with_params(self.agent.get(&request.url), request).call(),
            (Method::Delete, _) => with_params(self.agent.delete(&request.url), request).call(),
            (Method::Post, Some(body)) => {
                with_params(self.agent.post(&request.url), request).send_json(body)
            }
            (Method::Post, None) => with_params(self.agent.post(&request.url), request).send_empty(),
            (Method::Put, Some(body)) => {
                with_params(self.agent.put(&request.url), request).send_json(body)
            }
            (Method::Put, None) => with_params(self.agent.put(&request.url), request).send_empty(),
            (Method::Patch, Some(body)) => {
                with_params(self.agent.patch(&request.url), request).send_json(body)
            }
            (Method::Patch, None) => {
                with_params(self.agent.patch(&request.url), request).send_empty()
            }
        };

        let mut response = result.map_err(|e| RapiError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RapiError::Connection(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}
