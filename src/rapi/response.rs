//! The uniform response envelope returned by every client call.
//!
//! `success == false` implies `error` is set and `data` must not be treated
//! as payload. The client layer never returns `Err` for an ordinary non-2xx
//! response; it encodes the failure here. Layers that must hand back a bare
//! value rather than an envelope (pagination, custom-action call sites)
//! convert a failed envelope into an error via [`Response::into_result`].

use serde_json::Value;

use crate::error::{RapiError, Result};

#[derive(Debug, Clone)]
pub struct Response {
    pub success: bool,
    pub status_code: u16,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl Response {
    pub fn ok(status_code: u16, data: Value) -> Self {
        Self {
            success: true,
            status_code,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Convert the envelope into a plain result, raising on failure.
    ///
    /// Status 0 means the request never completed (transport failure),
    /// 404 maps to `NotFound`, anything else to `Api`.
    pub fn into_result(self) -> Result<Option<Value>> {
        if self.success {
            return Ok(self.data);
        }
        let message = self.error.unwrap_or_else(|| "unknown error".to_string());
        match self.status_code {
            0 => Err(RapiError::Connection(message)),
            404 => Err(RapiError::NotFound(message)),
            status => Err(RapiError::Api { status, message }),
        }
    }
}
