//! # Transport Layer
//!
//! This module defines the HTTP transport abstraction for rapi. The
//! [`Transport`] trait allows the client to work with different backends.
//!
//! ## Design Rationale
//!
//! The transport is abstracted behind a trait to:
//! - Enable **testing** with `MockTransport` (no network needed)
//! - Keep the client and entity layers **decoupled** from the HTTP crate
//!
//! ## Implementations
//!
//! - [`http::HttpTransport`]: Production transport backed by a blocking
//!   `ureq` agent with a global timeout
//! - [`memory::MockTransport`]: Canned responses for tests, recording every
//!   request it executes
//!
//! ## Failure Contract
//!
//! `execute` returns `Err` only for transport-level failures (DNS, refused
//! connection, timeout, truncated body). Any HTTP status, 2xx or not, is an
//! `Ok(RawResponse)` — interpreting status codes is the client's job.

use crate::error::{RapiError, Result};
use std::fmt;
use std::str::FromStr;

pub mod http;
pub mod memory;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RapiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(RapiError::Validation(format!(
                "Unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by the client layer; the transport is responsible for executing it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// The raw result of one HTTP round-trip, before envelope normalization.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Abstract interface for executing HTTP requests.
pub trait Transport {
    /// Execute one blocking HTTP round-trip.
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse>;
}
