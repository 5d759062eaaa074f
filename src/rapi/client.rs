//! # API Client Facade
//!
//! `ApiClient` issues HTTP requests against a base URL and normalizes every
//! outcome — transport failure, non-2xx status, undecodable body — into a
//! [`Response`] envelope. It never panics and never returns `Err` for an
//! ordinary failed request; callers branch on `Response::success` (or use
//! `Response::into_result` when they need a raised error).
//!
//! ## Generic Over Transport
//!
//! `ApiClient<T: Transport>` is generic over the transport backend:
//! - Production: `ApiClient<HttpTransport>` (blocking ureq agent)
//! - Testing: `ApiClient<MockTransport>`
//!
//! This mirrors the storage seam pattern: every client and entity test runs
//! without touching the network.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::entity::{Entity, EntityConfig};
use crate::error::Result;
use crate::profile::{config_dir, Profile, ProfileStore};
use crate::response::Response;
use crate::transport::http::HttpTransport;
use crate::transport::{ApiRequest, Method, RawResponse, Transport};

pub struct ApiClient<T: Transport> {
    transport: T,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl ApiClient<HttpTransport> {
    /// Build a client from explicit settings.
    pub fn from_settings(profile: &Profile) -> Result<Self> {
        profile.validate()?;
        let transport = HttpTransport::new(profile.timeout_secs);
        let mut client = ApiClient::new(transport, &profile.url);
        if let Some(username) = &profile.username {
            let password = profile.password.as_deref().unwrap_or("");
            client = client.with_basic_auth(username, password);
        }
        Ok(client)
    }

    /// Build a client from a named profile (environment overlaid).
    pub fn from_profile(name: Option<&str>) -> Result<Self> {
        let store = ProfileStore::load(config_dir()?)?;
        let profile = store.resolve(name)?;
        Self::from_settings(&profile)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", username, password));
        self.headers
            .push(("authorization".to_string(), format!("Basic {}", credentials)));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying transport. Mainly useful with `MockTransport`, which
    /// records every request it executed.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bind entity metadata to this client.
    pub fn entity(&self, config: EntityConfig) -> Entity<'_, T> {
        Entity::new(self, config)
    }

    pub fn get(&self, endpoint: &str, params: &[(String, String)]) -> Response {
        self.request(Method::Get, endpoint, params, None)
    }

    pub fn post(&self, endpoint: &str, body: Value) -> Response {
        self.request(Method::Post, endpoint, &[], Some(body))
    }

    pub fn put(&self, endpoint: &str, body: Value) -> Response {
        self.request(Method::Put, endpoint, &[], Some(body))
    }

    pub fn patch(&self, endpoint: &str, body: Value) -> Response {
        self.request(Method::Patch, endpoint, &[], Some(body))
    }

    pub fn delete(&self, endpoint: &str) -> Response {
        self.request(Method::Delete, endpoint, &[], None)
    }

    /// Issue one request and normalize the outcome into an envelope.
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Response {
        let request = ApiRequest {
            method,
            url: self.url_for(endpoint),
            query: params.to_vec(),
            headers: self.headers.clone(),
            body,
        };

        let raw = match self.transport.execute(&request) {
            Ok(raw) => raw,
            // Status 0 marks "the request never completed".
            Err(e) => return Response::failure(0, e.to_string()),
        };

        normalize(raw)
    }

    fn url_for(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_matches('/');
        if endpoint.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

/// Turn a raw transport response into an envelope.
fn normalize(raw: RawResponse) -> Response {
    let ok = (200..300).contains(&raw.status);

    let parsed: Option<Value> = if raw.body.trim().is_empty() {
        None
    } else {
        match serde_json::from_str(&raw.body) {
            Ok(value) => Some(value),
            Err(e) if ok => {
                return Response::failure(
                    raw.status,
                    format!("Failed to decode response body: {}", e),
                );
            }
            Err(_) => None,
        }
    };

    if ok {
        return Response::ok(raw.status, parsed.unwrap_or(Value::Null));
    }

    Response::failure(raw.status, error_message(raw.status, parsed, &raw.body))
}

/// Pull a human-readable message out of an error body. APIs disagree on the
/// field name, so try the common ones before falling back to the raw body.
fn error_message(status: u16, parsed: Option<Value>, raw_body: &str) -> String {
    if let Some(Value::Object(map)) = parsed {
        for key in ["error", "detail", "message"] {
            match map.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
        return Value::Object(map).to_string();
    }
    if raw_body.trim().is_empty() {
        return format!("HTTP {}", status);
    }
    raw_body.to_string()
}
